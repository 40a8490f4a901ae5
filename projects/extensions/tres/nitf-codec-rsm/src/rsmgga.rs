//! `RSMGGA`: Replacement Sensor Model ground-to-image grid.
//!
//! The grid is made of `npln` planes, each holding `nxpts * nypts` image
//! points. Every point's row and column are [`ScaledCoordinate`]s whose widths
//! and fractional digit counts are declared at the top of the record.

use crate::coordinate::ScaledCoordinate;
use nitf_codec_schema::{FieldDescriptor, LoopDescriptor, RecordResult, RecordSchema};
use std::sync::Arc;

pub const TAG: &str = "RSMGGA";

const FITTING_ERROR_FORMAT: &str = "%+21.14E";

fn fitting_float(name: &str, description: &str) -> FieldDescriptor {
    FieldDescriptor::float(name, 21)
        .description(description)
        .format(FITTING_ERROR_FORMAT)
}

pub fn schema() -> RecordResult<RecordSchema> {
    RecordSchema::builder(TAG)
        .field(
            FieldDescriptor::string("iid", 80)
                .description("Image Identifier")
                .optional(),
        )
        .field(FieldDescriptor::string("edition", 40).description("RSM Image Support Data Edition"))
        .field(FieldDescriptor::integer("ggrsn", 3).description("Ground-to-image Grid Row Section Number"))
        .field(FieldDescriptor::integer("ggcsn", 3).description("Ground-to-image Grid Column Section Number"))
        .field(fitting_float("ggrfep", "Ground-to-image Grid Row Fitting Error").optional())
        .field(fitting_float("ggcfep", "Ground-to-image Grid Column Fitting Error").optional())
        .field(
            FieldDescriptor::integer("intord", 1)
                .description("Ground-to-image Grid Interpolation")
                .optional(),
        )
        .field(FieldDescriptor::integer("npln", 3).description("Number of Grid Planes"))
        .field(fitting_float("deltaz", "Delta Z between Grid Planes"))
        .field(fitting_float("deltax", "Delta X between Grid Planes"))
        .field(fitting_float("deltay", "Delta Y between Grid Planes"))
        .field(fitting_float("zpln1", "Z Value of Plane 1"))
        .field(fitting_float("xipln1", "X Value of Initial Point in Plane 1"))
        .field(fitting_float("yipln1", "Y Value of Initial Point in Plane 1"))
        .field(FieldDescriptor::integer("refrow", 9).description("Reference Image Row Coordinate Value"))
        .field(FieldDescriptor::integer("refcol", 9).description("Reference Image Column Coordinate Value"))
        .field(FieldDescriptor::integer("tnumrd", 2).description("Total Number of Image Row Coordinate Digits"))
        .field(FieldDescriptor::integer("tnumcd", 2).description("Total Number of Image Column Coordinate Digits"))
        .field(FieldDescriptor::integer("fnumrd", 1).description("Number of Image Row Coordinate Fractional Digits"))
        .field(FieldDescriptor::integer("fnumcd", 1).description("Number of Image Column Coordinate Fractional Digits"))
        // Planes after the first are offset from plane 1.
        .repeat(
            LoopDescriptor::new("f.npln - 1")
                .field(FieldDescriptor::integer("ixo", 4).description("Initial Grid Points X Offset"))
                .field(FieldDescriptor::integer("iyo", 4).description("Initial Grid Points Y Offset")),
        )
        .repeat(
            LoopDescriptor::new("f.npln")
                .field(FieldDescriptor::integer("nxpts", 3).description("Number of Grid Points in the X Direction"))
                .field(FieldDescriptor::integer("nypts", 3).description("Number of Grid Points in the Y Direction"))
                .repeat(
                    LoopDescriptor::new("f.nxpts[i1] * f.nypts[i1]")
                        .field(
                            FieldDescriptor::custom("rcoord", "f.tnumrd", Arc::new(ScaledCoordinate::row()))
                                .description("Grid Point's Row Coordinate"),
                        )
                        .field(
                            FieldDescriptor::custom("ccoord", "f.tnumcd", Arc::new(ScaledCoordinate::column()))
                                .description("Grid Point's Column Coordinate"),
                        ),
                ),
        )
        .build()
}
