//! Common test imports and utilities for schema engine tests
//!
//! This module provides a common prelude for test modules to avoid
//! duplicate imports across the codebase.
#![allow(unused_imports)]

// External crates commonly used in tests
pub use rstest::rstest;

// Core functionality from this crate
pub use crate::{
    ConsistencyError, DecodedRecord, FieldDescriptor, LoopDescriptor, RecordError, RecordResult,
    RecordSchema, Scope, Slot, TagRegistry, Tre, TreRecord, UnknownTre, Value, ValueKind,
    ValueTransform,
};
pub use crate::tre::{read_tre, read_tre_list, write_tre, write_tre_list};

// Standard library imports commonly used in tests
pub use std::sync::Arc;

// Re-export super for convenience in test modules
pub use super::*;
