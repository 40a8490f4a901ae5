//! Common test imports and utilities for RSM TRE tests
//!
//! This module provides a common prelude for test modules to avoid
//! duplicate imports across the codebase.
#![allow(unused_imports)]

// External crates commonly used in tests
pub use rstest::rstest;

// Schema engine types used by the TRE tests
pub use nitf_codec_schema::{
    ConsistencyError, DecodedRecord, FieldDescriptor, LoopDescriptor, RecordError, RecordSchema,
    TagRegistry, Value,
};

// Core functionality from this crate
pub use crate::{register_rsm_tres, rsmecb, rsmgga, ScaledCoordinate};

// Standard library imports commonly used in tests
pub use std::sync::Arc;

// Re-export super for convenience in test modules
pub use super::*;
