//! `stocktally-core` — engine foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! typed identifiers, the domain error model, and the reporting window.

pub mod error;
pub mod id;
pub mod window;

pub use error::{DomainError, DomainResult};
pub use id::{BinId, ItemId, MovementId, TenantId, UnitId, WarehouseId};
pub use window::ReportWindow;
