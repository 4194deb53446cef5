pub mod key;
pub mod record;
pub mod table;

pub use key::{Flow, FlowKey, Protocol};
pub use record::{FlowId, FlowIdGenerator, FlowRecord};
pub use table::FlowTable;
