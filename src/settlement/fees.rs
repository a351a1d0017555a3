// ============================================================================
// Settlement Fees - TickClear Settlement Core
// ============================================================================
//
// Two fees come out of every gross redemption value: the market creator fee
// (1% by default) and the reporting fee (0.01% by default). Rates are
// expressed as divisors on the market, so both computations are a single
// floor division and stay exact in integer arithmetic.
//
// Both fees are taken from the same gross value, never compounded. The
// shareholder receives the remainder, which keeps
//   shareholder + creator_fee + reporting_fee == gross
// exact for every input.
//
// ============================================================================

use crate::market::Market;

/// Market creator's cut of a gross redemption value, floored
pub fn market_creator_fee(market: &Market, value: u128) -> u128 {
    value / market.creator_fee_divisor
}

/// Reporting fee on a gross redemption value, floored
pub fn reporting_fee(market: &Market, value: u128) -> u128 {
    value / market.reporting_fee_divisor
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TICKS: u128 = 1_000_000_000_000_000_000;

    fn market() -> Market {
        Market::new(
            "m1".to_string(),
            "q".to_string(),
            2,
            TICKS,
            1_000_000,
            "alice".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_observed_rates() {
        let market = market();

        // 1% of 3 full units
        assert_eq!(market_creator_fee(&market, 3 * TICKS), 3 * TICKS / 100);
        // 0.01% of 5 full units
        assert_eq!(reporting_fee(&market, 5 * TICKS), 5 * TICKS / 10_000);
    }

    #[test]
    fn test_small_values_floor_to_zero() {
        let market = market();

        assert_eq!(market_creator_fee(&market, 99), 0);
        assert_eq!(market_creator_fee(&market, 100), 1);
        assert_eq!(reporting_fee(&market, 9_999), 0);
        assert_eq!(reporting_fee(&market, 10_000), 1);
    }

    #[test]
    fn test_fee_sum_never_exceeds_gross() {
        let market = market();

        for value in [0u128, 1, 7, 99, 100, 101, 10_001, TICKS, 13 * TICKS + 7] {
            let fees = market_creator_fee(&market, value) + reporting_fee(&market, value);
            assert!(fees <= value, "fees {} exceed gross {}", fees, value);
        }
    }

    #[test]
    fn test_custom_divisors() {
        let market = market().with_fee_divisors(50, 2_000).unwrap();

        assert_eq!(market_creator_fee(&market, 1_000), 20);
        assert_eq!(reporting_fee(&market, 1_000), 0);
        assert_eq!(reporting_fee(&market, 2_000), 1);
    }
}
