//! Farm data access
//!
//! Record types, the `FarmStore` persistence boundary and the gateways the
//! specialist flows read through.

mod gateway;
mod store;
mod types;

pub use gateway::{guarded, Gateways};
pub use store::{FarmData, FarmStore, MemoryStore};
pub use types::{
    AdvisoryLogEntry, CommunityPost, CostBreakdown, CostRecord, FarmerHistory, MarketQuote,
    MarketRecord, MatchKind, NutrientLevel, PricePoint, SatelliteSummary, ScanResult, SoilReport,
};
