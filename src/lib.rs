// Library exports for pivot-detector
pub mod analysis;
pub mod capture;
pub mod config;
pub mod flow;
pub mod report;
pub mod utils;

pub use analysis::{PivotPipeline, WindowScheduler, WindowSummary};
pub use capture::{PacketInfo, PcapEngine};
pub use config::settings;
pub use flow::{Flow, FlowTable};
pub use report::Reporter;
pub use utils::formatting;

// Error types
pub use anyhow::{Error, Result};
