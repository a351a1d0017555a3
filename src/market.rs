// ============================================================================
// Market & Finalization Lifecycle - TickClear Settlement Core
// ============================================================================
//
// A market is the unit of settlement: immutable trading parameters fixed at
// creation plus finalization state written exactly once by the reporting
// flow.
//
// Lifecycle:
//   Trading -> Reporting -> DisputeWindow -> AwaitingFinalization
//           -> WaitingPeriod -> Redeemable
//
// The payout distribution is the only channel through which outcome truth
// enters the settlement core: one non-negative integer weight per outcome,
// summing to num_ticks. A winning binary outcome carries the full num_ticks;
// a scalar report carries proportional weights for the short and long sides.
//
// The core never reads a clock. Every time-gated operation takes `now` as an
// argument, so finalization timing is driven entirely by the caller.
//
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::settlement::SettlementError;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Dispute window opened by a designated report (3 days)
pub const DISPUTE_WINDOW_SECS: u64 = 3 * 24 * 60 * 60;

/// Waiting period between finalization and redemption (3 days)
pub const REDEMPTION_WAIT_SECS: u64 = 3 * 24 * 60 * 60;

/// Default market creator fee divisor (value / 100 = 1%)
pub const DEFAULT_CREATOR_FEE_DIVISOR: u128 = 100;

/// Default reporting fee divisor (value / 10_000 = 0.01%)
pub const DEFAULT_REPORTING_FEE_DIVISOR: u128 = 10_000;

// ============================================================================
// LIFECYCLE PHASE
// ============================================================================

/// Observable lifecycle phase of a market at a given time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketPhase {
    /// Before end_time, shares trade and no report is accepted
    Trading,
    /// Past end_time, waiting for the designated report
    Reporting,
    /// Report submitted, dispute window still open
    DisputeWindow,
    /// Dispute window closed, finalization not yet called
    AwaitingFinalization,
    /// Finalized, redemption wait not yet elapsed
    WaitingPeriod,
    /// Finalized and claimable; terminal, holds indefinitely
    Redeemable,
}

impl MarketPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketPhase::Trading => "trading",
            MarketPhase::Reporting => "reporting",
            MarketPhase::DisputeWindow => "dispute_window",
            MarketPhase::AwaitingFinalization => "awaiting_finalization",
            MarketPhase::WaitingPeriod => "waiting_period",
            MarketPhase::Redeemable => "redeemable",
        }
    }
}

// ============================================================================
// MARKET
// ============================================================================

/// A settlement market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    /// Unique market identifier
    pub id: String,

    /// Market question
    pub question: String,

    /// Number of outcomes (at least 2)
    pub num_outcomes: usize,

    /// Value units one complete share set represents; also the gross value
    /// of one share redeemed at full winning weight
    #[serde(with = "crate::units::string")]
    pub num_ticks: u128,

    /// Trading cutoff (unix seconds)
    pub end_time: u64,

    /// Account that created the market, receives the creator fee
    pub creator: String,

    /// Account credited with the reporting fee; the reporting fee pool is
    /// used when unset
    pub designated_reporter: Option<String>,

    /// Creator fee = value / creator_fee_divisor
    #[serde(with = "crate::units::string")]
    pub creator_fee_divisor: u128,

    /// Reporting fee = value / reporting_fee_divisor
    #[serde(with = "crate::units::string")]
    pub reporting_fee_divisor: u128,

    /// Set when the designated report lands; finalization is blocked until
    /// this timestamp passes
    pub dispute_due_timestamp: Option<u64>,

    /// Reported weights awaiting finalization
    #[serde(with = "crate::units::opt_vec", default)]
    pub tentative_payout: Option<Vec<u128>>,

    /// Final payout weights; written exactly once, immutable afterwards.
    /// Set if and only if finalization_timestamp is set.
    #[serde(with = "crate::units::opt_vec", default)]
    pub payout_distribution: Option<Vec<u128>>,

    /// Set exactly once when finalized
    pub finalization_timestamp: Option<u64>,
}

impl Market {
    /// Create a market with the default fee schedule
    pub fn new(
        id: String,
        question: String,
        num_outcomes: usize,
        num_ticks: u128,
        end_time: u64,
        creator: String,
    ) -> Result<Self, SettlementError> {
        if num_outcomes < 2 {
            return Err(SettlementError::InvalidMarket(
                "market must have at least 2 outcomes".to_string(),
            ));
        }
        if num_ticks == 0 {
            return Err(SettlementError::InvalidMarket(
                "num_ticks must be positive".to_string(),
            ));
        }

        Ok(Self {
            id,
            question,
            num_outcomes,
            num_ticks,
            end_time,
            creator,
            designated_reporter: None,
            creator_fee_divisor: DEFAULT_CREATOR_FEE_DIVISOR,
            reporting_fee_divisor: DEFAULT_REPORTING_FEE_DIVISOR,
            dispute_due_timestamp: None,
            tentative_payout: None,
            payout_distribution: None,
            finalization_timestamp: None,
        })
    }

    /// Override the fee schedule. Divisors below 2 would let the combined
    /// fees exceed the gross value, so they are rejected.
    pub fn with_fee_divisors(
        mut self,
        creator_fee_divisor: u128,
        reporting_fee_divisor: u128,
    ) -> Result<Self, SettlementError> {
        if creator_fee_divisor < 2 || reporting_fee_divisor < 2 {
            return Err(SettlementError::InvalidMarket(
                "fee divisors must be at least 2".to_string(),
            ));
        }
        self.creator_fee_divisor = creator_fee_divisor;
        self.reporting_fee_divisor = reporting_fee_divisor;
        Ok(self)
    }

    /// Validate a payout distribution against this market's shape:
    /// one weight per outcome, weights summing exactly to num_ticks.
    pub fn validate_payout(&self, payout: &[u128]) -> Result<(), SettlementError> {
        if payout.len() != self.num_outcomes {
            return Err(SettlementError::InvalidPayoutDistribution(format!(
                "expected {} weights, got {}",
                self.num_outcomes,
                payout.len()
            )));
        }

        let mut sum: u128 = 0;
        for weight in payout {
            sum = sum.checked_add(*weight).ok_or_else(|| {
                SettlementError::InvalidPayoutDistribution(
                    "payout weights overflow".to_string(),
                )
            })?;
        }

        if sum != self.num_ticks {
            return Err(SettlementError::InvalidPayoutDistribution(format!(
                "weights sum to {}, expected num_ticks {}",
                sum, self.num_ticks
            )));
        }

        Ok(())
    }

    /// Record the designated report. Only valid strictly after end_time and
    /// only once; opens the dispute window.
    pub fn designated_report(
        &mut self,
        now: u64,
        payout: Vec<u128>,
    ) -> Result<(), SettlementError> {
        if self.finalization_timestamp.is_some() {
            return Err(SettlementError::AlreadyFinalized(self.id.clone()));
        }
        if now <= self.end_time {
            return Err(SettlementError::ReportNotAllowed(format!(
                "market {} has not ended (end_time {})",
                self.id, self.end_time
            )));
        }
        if self.dispute_due_timestamp.is_some() {
            return Err(SettlementError::ReportNotAllowed(format!(
                "market {} already has a designated report",
                self.id
            )));
        }

        self.validate_payout(&payout)?;

        self.tentative_payout = Some(payout);
        self.dispute_due_timestamp = Some(now + DISPUTE_WINDOW_SECS);
        Ok(())
    }

    /// Promote the reported payout to the final distribution. Fails while
    /// the dispute window is open and cannot run twice; the distribution
    /// and finalization timestamp are written together.
    pub fn try_finalize(&mut self, now: u64) -> Result<(), SettlementError> {
        if self.finalization_timestamp.is_some() {
            return Err(SettlementError::AlreadyFinalized(self.id.clone()));
        }

        let dispute_due = self.dispute_due_timestamp.ok_or_else(|| {
            SettlementError::ReportNotAllowed(format!(
                "market {} has no designated report",
                self.id
            ))
        })?;

        if now <= dispute_due {
            return Err(SettlementError::DisputeWindowOpen(format!(
                "dispute window for market {} open until {}",
                self.id, dispute_due
            )));
        }

        let payout = self.tentative_payout.clone().ok_or_else(|| {
            SettlementError::ReportNotAllowed(format!(
                "market {} has no reported payout",
                self.id
            ))
        })?;

        // Upstream already validated; reject again rather than mis-split
        self.validate_payout(&payout)?;

        self.payout_distribution = Some(payout);
        self.finalization_timestamp = Some(now);
        Ok(())
    }

    pub fn is_finalized(&self) -> bool {
        self.finalization_timestamp.is_some()
    }

    /// True once finalized and the redemption wait has elapsed. The boundary
    /// instant itself is redeemable. Pure predicate, no side effects.
    pub fn is_redeemable(&self, now: u64) -> bool {
        match self.finalization_timestamp {
            Some(finalized_at) => now >= finalized_at.saturating_add(REDEMPTION_WAIT_SECS),
            None => false,
        }
    }

    /// Earliest timestamp at which claims are accepted
    pub fn redeemable_at(&self) -> Option<u64> {
        self.finalization_timestamp
            .map(|t| t.saturating_add(REDEMPTION_WAIT_SECS))
    }

    /// Final payout weights, or NotFinalized before they exist
    pub fn final_payout(&self) -> Result<&[u128], SettlementError> {
        self.payout_distribution
            .as_deref()
            .ok_or_else(|| SettlementError::NotFinalized(self.id.clone()))
    }

    pub fn phase(&self, now: u64) -> MarketPhase {
        if let Some(finalized_at) = self.finalization_timestamp {
            if now >= finalized_at.saturating_add(REDEMPTION_WAIT_SECS) {
                MarketPhase::Redeemable
            } else {
                MarketPhase::WaitingPeriod
            }
        } else if let Some(dispute_due) = self.dispute_due_timestamp {
            if now <= dispute_due {
                MarketPhase::DisputeWindow
            } else {
                MarketPhase::AwaitingFinalization
            }
        } else if now <= self.end_time {
            MarketPhase::Trading
        } else {
            MarketPhase::Reporting
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TICKS: u128 = 1_000_000_000_000_000_000;
    const END: u64 = 1_000_000;

    fn binary_market() -> Market {
        Market::new(
            "m1".to_string(),
            "Does it rain tomorrow?".to_string(),
            2,
            TICKS,
            END,
            "alice".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_market_validation() {
        assert!(Market::new("m".into(), "q".into(), 1, TICKS, END, "a".into()).is_err());
        assert!(Market::new("m".into(), "q".into(), 2, 0, END, "a".into()).is_err());
        assert!(binary_market().with_fee_divisors(1, 100).is_err());
    }

    #[test]
    fn test_phase_progression() {
        let mut market = binary_market();

        assert_eq!(market.phase(END), MarketPhase::Trading);
        assert_eq!(market.phase(END + 1), MarketPhase::Reporting);

        market.designated_report(END + 1, vec![0, TICKS]).unwrap();
        let dispute_due = market.dispute_due_timestamp.unwrap();
        assert_eq!(dispute_due, END + 1 + DISPUTE_WINDOW_SECS);
        assert_eq!(market.phase(dispute_due), MarketPhase::DisputeWindow);
        assert_eq!(market.phase(dispute_due + 1), MarketPhase::AwaitingFinalization);

        market.try_finalize(dispute_due + 1).unwrap();
        let finalized_at = market.finalization_timestamp.unwrap();
        assert_eq!(market.phase(finalized_at), MarketPhase::WaitingPeriod);
        assert_eq!(
            market.phase(finalized_at + REDEMPTION_WAIT_SECS),
            MarketPhase::Redeemable
        );
    }

    #[test]
    fn test_report_requires_market_end() {
        let mut market = binary_market();
        let result = market.designated_report(END, vec![0, TICKS]);
        assert!(matches!(result, Err(SettlementError::ReportNotAllowed(_))));
        assert!(market.designated_report(END + 1, vec![0, TICKS]).is_ok());
    }

    #[test]
    fn test_report_only_once() {
        let mut market = binary_market();
        market.designated_report(END + 1, vec![0, TICKS]).unwrap();
        let result = market.designated_report(END + 2, vec![TICKS, 0]);
        assert!(matches!(result, Err(SettlementError::ReportNotAllowed(_))));
    }

    #[test]
    fn test_finalize_blocked_by_dispute_window() {
        let mut market = binary_market();
        market.designated_report(END + 1, vec![0, TICKS]).unwrap();
        let dispute_due = market.dispute_due_timestamp.unwrap();

        assert!(matches!(
            market.try_finalize(dispute_due),
            Err(SettlementError::DisputeWindowOpen(_))
        ));
        assert!(market.try_finalize(dispute_due + 1).is_ok());
        assert!(market.payout_distribution.is_some());
        assert!(market.finalization_timestamp.is_some());
    }

    #[test]
    fn test_finalize_only_once() {
        let mut market = binary_market();
        market.designated_report(END + 1, vec![0, TICKS]).unwrap();
        let dispute_due = market.dispute_due_timestamp.unwrap();
        market.try_finalize(dispute_due + 1).unwrap();

        assert!(matches!(
            market.try_finalize(dispute_due + 2),
            Err(SettlementError::AlreadyFinalized(_))
        ));
    }

    #[test]
    fn test_invalid_distribution_rejected() {
        let mut market = binary_market();

        // wrong length
        let result = market.designated_report(END + 1, vec![TICKS]);
        assert!(matches!(
            result,
            Err(SettlementError::InvalidPayoutDistribution(_))
        ));

        // wrong sum
        let result = market.designated_report(END + 1, vec![1, TICKS]);
        assert!(matches!(
            result,
            Err(SettlementError::InvalidPayoutDistribution(_))
        ));

        assert!(market.dispute_due_timestamp.is_none());
    }

    #[test]
    fn test_redeemable_boundary() {
        let mut market = binary_market();
        market.designated_report(END + 1, vec![0, TICKS]).unwrap();
        let dispute_due = market.dispute_due_timestamp.unwrap();
        market.try_finalize(dispute_due + 1).unwrap();

        let redeemable_at = market.redeemable_at().unwrap();
        assert!(!market.is_redeemable(redeemable_at - 1));
        assert!(market.is_redeemable(redeemable_at));
        assert!(market.is_redeemable(redeemable_at + 10_000_000));
    }

    #[test]
    fn test_scalar_split_accepted() {
        let mut market = Market::new(
            "scalar".to_string(),
            "Closing price in range".to_string(),
            2,
            40_000_000_000_000_000_000,
            END,
            "alice".to_string(),
        )
        .unwrap();

        market
            .designated_report(
                END + 1,
                vec![10_000_000_000_000_000_000, 30_000_000_000_000_000_000],
            )
            .unwrap();
        let dispute_due = market.dispute_due_timestamp.unwrap();
        market.try_finalize(dispute_due + 1).unwrap();

        assert_eq!(
            market.final_payout().unwrap(),
            &[10_000_000_000_000_000_000, 30_000_000_000_000_000_000]
        );
    }
}
