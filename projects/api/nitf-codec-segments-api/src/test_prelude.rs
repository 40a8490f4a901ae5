//! Common test imports and utilities for segment codec tests
//!
//! This module provides a common set of imports that are frequently used
//! across test modules in this crate, reducing code duplication.

// External crates commonly used in tests
pub use rstest::rstest;

// Core std types
pub use core::any::Any;
pub use std::rc::Rc;
pub use std::sync::Arc;

// Record engine types
pub use nitf_codec_schema::{
    ConsistencyError, DecodedRecord, FieldDescriptor, LoopDescriptor, RecordError, RecordSchema,
    TagRegistry, Tre, TreRecord, UnknownTre, Value,
};

// Crate types
pub use crate::data::*;
pub use crate::diff::*;
pub use crate::error::{SegmentError, SegmentResult};
pub use crate::handlers::*;
pub use crate::segment::{
    des_subheader, image_subheader, Segment, SegmentInfo, SegmentKind, SharedHeader, Subheader,
};
pub use crate::traits::*;
