// API request/response types for the TickClear settlement service

use serde::{Deserialize, Serialize};

use crate::settlement::ClaimResult;

/// POST /claim request body
#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub market_id: String,
    pub holder: String,
}

/// POST /claim response
#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub success: bool,
    pub claim_id: Option<String>,
    pub market_id: String,
    pub holder: String,
    /// True if any outcome balance was consumed
    pub paid: bool,
    #[serde(with = "crate::units::string")]
    pub gross: u128,
    /// Net value credited to the holder
    #[serde(with = "crate::units::string")]
    pub shareholder_paid: u128,
    #[serde(with = "crate::units::string")]
    pub creator_fee: u128,
    #[serde(with = "crate::units::string")]
    pub reporting_fee: u128,
    pub outcomes_redeemed: usize,
    pub error: Option<String>,
}

impl ClaimResponse {
    pub fn success(result: ClaimResult) -> Self {
        Self {
            success: true,
            claim_id: Some(result.claim_id),
            market_id: result.market_id,
            holder: result.holder,
            paid: result.paid,
            gross: result.gross,
            shareholder_paid: result.shareholder_amount,
            creator_fee: result.creator_fee,
            reporting_fee: result.reporting_fee,
            outcomes_redeemed: result.outcomes_redeemed,
            error: None,
        }
    }

    pub fn error(market_id: String, holder: String, msg: String) -> Self {
        Self {
            success: false,
            claim_id: None,
            market_id,
            holder,
            paid: false,
            gross: 0,
            shareholder_paid: 0,
            creator_fee: 0,
            reporting_fee: 0,
            outcomes_redeemed: 0,
            error: Some(msg),
        }
    }
}

/// POST /markets/:id/report request body
#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    /// Payout weights, one per outcome, summing to num_ticks
    #[serde(with = "crate::units::vec")]
    pub payout: Vec<u128>,
}

/// POST /positions/credit request body
#[derive(Debug, Deserialize)]
pub struct CreditSharesRequest {
    pub market_id: String,
    pub outcome: usize,
    pub holder: String,
    #[serde(with = "crate::units::string")]
    pub amount: u128,
}

/// Query string for GET /markets/:id/proceeds and /markets/:id/winnings
#[derive(Debug, Deserialize)]
pub struct ProceedsQuery {
    pub outcome: usize,
    /// Share amount as a decimal string
    pub amount: String,
}

/// Query string for GET /markets/:id/fees
#[derive(Debug, Deserialize)]
pub struct FeesQuery {
    /// Gross value as a decimal string
    pub value: String,
}
