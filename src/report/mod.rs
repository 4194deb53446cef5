pub mod reporter;

pub use reporter::{pivot_line, Reporter};
