// ============================================================================
// Read Side - Projections & Queries
// ============================================================================

pub mod balance;
pub mod currency;

pub use balance::{BalanceProjection, Query};
