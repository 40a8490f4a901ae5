//! Priority-ordered dispatch over payload codecs and comparators.

pub(crate) mod diff_handle_set;
pub(crate) mod priority_handle_set;
pub(crate) mod segment_data_handle_set;

pub use diff_handle_set::*;
pub use priority_handle_set::*;
pub use segment_data_handle_set::*;
