pub mod alternation;
pub mod coherence;
pub mod duration;
pub mod merge;
pub mod pair;
pub mod pipeline;
pub mod scheduler;

pub use alternation::{alternation_filter, longest_run};
pub use coherence::{coherence_filter, present_in_every_quarter};
pub use duration::{candidate_pairs, eliminate_ephemeral};
pub use merge::merge_labels;
pub use pair::FlowPair;
pub use pipeline::{PivotPipeline, WindowVerdict};
pub use scheduler::{WindowScheduler, WindowSummary};
