//! Built-in comparators and the state shared across one comparison.

pub mod context;
pub mod encoded;
pub mod placeholder;
pub mod tre;

pub use context::{DiffContext, DiffOptions};
pub use encoded::EncodedDataDiff;
pub use placeholder::PlaceholderDiff;
pub use tre::TreDiff;
