pub mod highlight;

pub use highlight::{Highlight, HighlightId};
