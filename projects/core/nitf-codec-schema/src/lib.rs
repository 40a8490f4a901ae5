#![doc = include_str!(concat!("../", core::env!("CARGO_PKG_README")))]

pub mod codec;
pub mod descriptor;
pub mod error;
pub mod expr;
pub mod format;
pub mod record;
pub mod schema;
pub mod transform;
pub mod tre;
pub mod value;

#[cfg(test)]
pub mod test_prelude;

pub use codec::RecordCodec;
pub use descriptor::{Descriptor, FieldDescriptor, LoopDescriptor, ValueKind, Width};
pub use error::{ConsistencyError, RecordError, RecordResult};
pub use expr::{Environment, ExprValue, Expression, ExpressionError};
pub use format::NumericFormat;
pub use record::{DecodedRecord, Slot};
pub use schema::{RecordSchema, RecordSchemaBuilder};
pub use transform::{Scope, ValueTransform};
pub use tre::{read_tre, read_tre_list, write_tre, write_tre_list, TagRegistry, Tre, TreRecord, UnknownTre};
pub use value::Value;
