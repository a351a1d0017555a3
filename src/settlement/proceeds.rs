// ============================================================================
// Proceeds Calculation - TickClear Settlement Core
// ============================================================================
//
// Gross redeemable value for a share position in a finalized market, and the
// three-way split of that value between shareholder, market creator, and
// reporter.
//
// gross = share_amount * payout_distribution[outcome]
//
// Pure multiplication, no division, so the result is exact for every market
// shape. A fully winning binary outcome carries weight num_ticks; a losing
// outcome carries 0; a scalar market carries the proportional weights the
// reporting flow computed from where the result fell in the market's range.
//
// ============================================================================

use serde::Serialize;

use crate::market::Market;
use crate::settlement::fees::{market_creator_fee, reporting_fee};
use crate::settlement::SettlementError;

/// Three-way split of a gross redemption value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WinningsSplit {
    /// Remainder after both fees, paid to the shareholder
    #[serde(with = "crate::units::string")]
    pub shareholder: u128,
    /// Market creator fee
    #[serde(with = "crate::units::string")]
    pub creator: u128,
    /// Reporting fee
    #[serde(with = "crate::units::string")]
    pub reporter: u128,
}

impl WinningsSplit {
    /// Gross value the split was computed from
    pub fn total(&self) -> u128 {
        self.shareholder + self.creator + self.reporter
    }
}

/// Gross value owed for `amount` shares of `outcome`. Requires a finalized
/// market; the payout weight is the only outcome-dependent input.
pub fn calculate_proceeds(
    market: &Market,
    outcome: usize,
    amount: u128,
) -> Result<u128, SettlementError> {
    let payout = market.final_payout()?;

    if outcome >= market.num_outcomes {
        return Err(SettlementError::InvalidOutcome(format!(
            "outcome {} out of range for market {} with {} outcomes",
            outcome, market.id, market.num_outcomes
        )));
    }

    amount.checked_mul(payout[outcome]).ok_or_else(|| {
        SettlementError::ValueOverflow(format!(
            "proceeds overflow for {} shares of outcome {} in market {}",
            amount, outcome, market.id
        ))
    })
}

/// Split the gross proceeds for a position into shareholder, creator, and
/// reporter shares. Both fees floor off the same gross value and the
/// shareholder keeps the remainder, so the parts always sum to the gross.
pub fn divide_up_winnings(
    market: &Market,
    outcome: usize,
    amount: u128,
) -> Result<WinningsSplit, SettlementError> {
    let gross = calculate_proceeds(market, outcome, amount)?;

    let creator = market_creator_fee(market, gross);
    let reporter = reporting_fee(market, gross);

    Ok(WinningsSplit {
        shareholder: gross - creator - reporter,
        creator,
        reporter,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TICKS: u128 = 1_000_000_000_000_000_000;
    const END: u64 = 1_000_000;

    fn finalized_binary(winning: usize) -> Market {
        let mut market = Market::new(
            "m1".to_string(),
            "q".to_string(),
            2,
            TICKS,
            END,
            "alice".to_string(),
        )
        .unwrap();

        let mut payout = vec![0, 0];
        payout[winning] = TICKS;
        market.designated_report(END + 1, payout).unwrap();
        let dispute_due = market.dispute_due_timestamp.unwrap();
        market.try_finalize(dispute_due + 1).unwrap();
        market
    }

    #[test]
    fn test_proceeds_requires_finalization() {
        let market = Market::new(
            "m1".to_string(),
            "q".to_string(),
            2,
            TICKS,
            END,
            "alice".to_string(),
        )
        .unwrap();

        let result = calculate_proceeds(&market, 1, 1);
        assert!(matches!(result, Err(SettlementError::NotFinalized(_))));
    }

    #[test]
    fn test_winning_and_losing_proceeds() {
        let market = finalized_binary(1);

        assert_eq!(calculate_proceeds(&market, 1, 7).unwrap(), 7 * TICKS);
        assert_eq!(calculate_proceeds(&market, 0, 11 * TICKS).unwrap(), 0);
    }

    #[test]
    fn test_outcome_out_of_range() {
        let market = finalized_binary(1);
        let result = calculate_proceeds(&market, 2, 1);
        assert!(matches!(result, Err(SettlementError::InvalidOutcome(_))));
    }

    #[test]
    fn test_proceeds_overflow() {
        let market = finalized_binary(1);
        let result = calculate_proceeds(&market, 1, u128::MAX / 2);
        assert!(matches!(result, Err(SettlementError::ValueOverflow(_))));
    }

    #[test]
    fn test_split_matches_observed_rates() {
        let market = finalized_binary(1);
        let split = divide_up_winnings(&market, 1, 13).unwrap();
        let gross = 13 * TICKS;

        assert_eq!(split.creator, gross / 100);
        assert_eq!(split.reporter, gross / 10_000);
        assert_eq!(split.shareholder, gross - gross / 100 - gross / 10_000);
        assert_eq!(split.total(), gross);
    }

    #[test]
    fn test_split_sum_invariant_with_remainders() {
        // divisors that do not divide the gross evenly
        let mut market = Market::new(
            "m1".to_string(),
            "q".to_string(),
            2,
            999_983,
            END,
            "alice".to_string(),
        )
        .unwrap()
        .with_fee_divisors(7, 13)
        .unwrap();

        market.designated_report(END + 1, vec![0, 999_983]).unwrap();
        let dispute_due = market.dispute_due_timestamp.unwrap();
        market.try_finalize(dispute_due + 1).unwrap();

        for amount in [1u128, 2, 3, 17, 101] {
            let split = divide_up_winnings(&market, 1, amount).unwrap();
            assert_eq!(split.total(), amount * 999_983);
        }
    }

    #[test]
    fn test_losing_split_is_zero() {
        let market = finalized_binary(1);
        let split = divide_up_winnings(&market, 0, 1_000).unwrap();

        assert_eq!(split.shareholder, 0);
        assert_eq!(split.creator, 0);
        assert_eq!(split.reporter, 0);
    }
}
