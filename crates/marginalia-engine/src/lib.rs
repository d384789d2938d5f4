pub mod anchoring;
pub mod doctree;
pub mod io;
pub mod markup;
pub mod models;
pub mod selection;
pub mod service;
pub mod store;

// Re-export key types for easier usage
pub use anchoring::{search::*, stale::*, validate::*};
pub use models::highlight::*;
pub use selection::SelectionContext;
pub use service::{CreateHighlight, HighlightError, HighlightService, RenderedDocument};
pub use store::{HighlightStore, JsonFileStore, MemoryStore, StoreError};
