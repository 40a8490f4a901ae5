#![doc = include_str!(concat!("../", core::env!("CARGO_PKG_README")))]

pub mod coordinate;
pub mod rsmecb;
pub mod rsmgga;

#[cfg(test)]
pub mod test_prelude;

pub use coordinate::ScaledCoordinate;

use log::debug;
use nitf_codec_schema::{RecordResult, TagRegistry};

/// Registers every Replacement Sensor Model TRE schema provided by this crate.
///
/// # Parameters
///
/// - `registry`: Registry to add the `RSMGGA` and `RSMECB` schemas to
///
/// # Returns
///
/// An error if a schema fails to build. Tags already present are replaced.
pub fn register_rsm_tres(registry: &mut TagRegistry) -> RecordResult<()> {
    for schema in [rsmgga::schema()?, rsmecb::schema()?] {
        let schema = registry.register(schema)?;
        debug!("Registered {} ({} fields)", schema.tag(), schema.fields().count());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_prelude::*;

    #[rstest]
    #[case(rsmgga::TAG)]
    #[case(rsmecb::TAG)]
    fn registers_tag(#[case] tag: &str) {
        let mut registry = TagRegistry::new();
        register_rsm_tres(&mut registry).unwrap();
        assert_eq!(registry.get(tag).map(|schema| schema.tag()), Some(tag));
        assert_eq!(registry.len(), 2);
    }
}
