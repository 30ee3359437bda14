//! `stocktally-uom` — units of measure and the conversion graph.
//!
//! Pure domain logic only: master-data shaped unit records, the two-stage
//! equivalence (alias) rule, and a directed weighted graph that normalizes
//! quantities between units. No IO, no storage.

pub mod graph;
pub mod unit;

pub use graph::{ConversionEdge, ConversionError, UnitConversionGraph};
pub use stocktally_core::UnitId;
pub use unit::{units_equivalent, UnitOfMeasure};
