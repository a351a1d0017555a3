// ============================================================================
// Settlement Module - TickClear Settlement Core
// ============================================================================
//
// Proceeds computation and redemption for finalized markets:
//   - fees: creator-fee and reporting-fee fractions of a gross value
//   - proceeds: share balance x payout weight, and the three-way split
//   - claim: one holder's redemption across every outcome of a market
//
// Exact-sum invariant: for any gross value v,
//   shareholder(v) + creator_fee(v) + reporting_fee(v) == v
// Both fees floor independently off the same gross value and the shareholder
// takes the remainder, so truncation always rounds against the fee takers.
//
// ============================================================================

use serde::Serialize;

pub mod claim;
pub mod fees;
pub mod proceeds;

pub use claim::{claim_proceeds, ClaimResult, Payment, PaymentKind};
pub use fees::{market_creator_fee, reporting_fee};
pub use proceeds::{calculate_proceeds, divide_up_winnings, WinningsSplit};

/// Account credited with the reporting fee when a market has no
/// attributable designated reporter
pub const REPORTING_FEE_POOL: &str = "reporting-fee-pool";

// ============================================================================
// ERRORS
// ============================================================================

/// Settlement errors
#[derive(Debug, Clone, Serialize)]
pub enum SettlementError {
    /// Market parameters rejected at construction
    InvalidMarket(String),
    /// Market id not known to this node
    MarketNotFound(String),
    /// Report submitted before market end, twice, or missing
    ReportNotAllowed(String),
    /// Finalization attempted while the dispute window is open
    DisputeWindowOpen(String),
    /// Finalization attempted twice
    AlreadyFinalized(String),
    /// Proceeds or fees queried before the payout distribution exists
    NotFinalized(String),
    /// Claim attempted before the post-finalization wait elapsed
    NotRedeemable(String),
    /// Payout weights with the wrong length or sum
    InvalidPayoutDistribution(String),
    /// Outcome index out of range
    InvalidOutcome(String),
    /// u128 arithmetic overflow on a value computation
    ValueOverflow(String),
    /// The value-transfer sink rejected a payout; the claim was rolled back
    TransferFailure(String),
}

impl std::fmt::Display for SettlementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettlementError::InvalidMarket(msg) => write!(f, "Invalid market: {}", msg),
            SettlementError::MarketNotFound(msg) => write!(f, "Market not found: {}", msg),
            SettlementError::ReportNotAllowed(msg) => write!(f, "Report not allowed: {}", msg),
            SettlementError::DisputeWindowOpen(msg) => write!(f, "Dispute window open: {}", msg),
            SettlementError::AlreadyFinalized(msg) => write!(f, "Already finalized: {}", msg),
            SettlementError::NotFinalized(msg) => write!(f, "Not finalized: {}", msg),
            SettlementError::NotRedeemable(msg) => write!(f, "Not redeemable: {}", msg),
            SettlementError::InvalidPayoutDistribution(msg) => {
                write!(f, "Invalid payout distribution: {}", msg)
            }
            SettlementError::InvalidOutcome(msg) => write!(f, "Invalid outcome: {}", msg),
            SettlementError::ValueOverflow(msg) => write!(f, "Value overflow: {}", msg),
            SettlementError::TransferFailure(msg) => write!(f, "Transfer failure: {}", msg),
        }
    }
}

impl std::error::Error for SettlementError {}
