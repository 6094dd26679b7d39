//! Sector Benchmarking
//!
//! Aggregates peer health scores per sector and measures one company
//! against its sector. Aggregates are cached by sector name with a TTL.

pub mod aggregate;
pub mod cache;

pub use aggregate::{compare, DimensionDelta, SectorAggregate, SectorComparison};
pub use cache::{sector_key, SectorCache, DEFAULT_TTL_SECS};
