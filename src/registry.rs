// ============================================================================
// Share Registry - TickClear Settlement Core
// ============================================================================
//
// Per-(market, outcome, holder) share balances. Shares enter through
// credit_shares, the boundary where complete-set purchases and order fills
// land; both live outside this crate. The settlement core itself only ever
// reads balances and zeroes them, never negative-adjusts.
//
// ============================================================================

use std::collections::HashMap;

use crate::settlement::SettlementError;

/// (market_id, outcome, holder)
pub type PositionKey = (String, usize, String);

/// Share balances for all markets and holders
#[derive(Debug, Default)]
pub struct ShareRegistry {
    /// Balances keyed by (market_id, outcome, holder)
    pub balances: HashMap<PositionKey, u128>,

    /// Outstanding shares per (market_id, outcome)
    pub total_supply: HashMap<(String, usize), u128>,
}

impl ShareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance for one holder in one market outcome
    pub fn get_shares(&self, market_id: &str, outcome: usize, holder: &str) -> u128 {
        self.balances
            .get(&(market_id.to_string(), outcome, holder.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Outstanding shares for a market outcome
    pub fn outcome_supply(&self, market_id: &str, outcome: usize) -> u128 {
        self.total_supply
            .get(&(market_id.to_string(), outcome))
            .copied()
            .unwrap_or(0)
    }

    /// Add shares to a holder. External acquisition boundary.
    pub fn credit_shares(
        &mut self,
        market_id: &str,
        outcome: usize,
        holder: &str,
        amount: u128,
    ) -> Result<u128, SettlementError> {
        let key = (market_id.to_string(), outcome, holder.to_string());
        let balance = self.balances.entry(key).or_insert(0);
        let updated = balance.checked_add(amount).ok_or_else(|| {
            SettlementError::ValueOverflow(format!(
                "share balance overflow for {} in market {}",
                holder, market_id
            ))
        })?;
        *balance = updated;

        let supply = self
            .total_supply
            .entry((market_id.to_string(), outcome))
            .or_insert(0);
        *supply = supply.saturating_add(amount);

        Ok(updated)
    }

    /// Overwrite a holder's balance, keeping the supply figure in step.
    /// The claim engine uses this to zero positions and to restore them
    /// when a payout is aborted.
    pub fn set_shares(&mut self, market_id: &str, outcome: usize, holder: &str, value: u128) {
        let key = (market_id.to_string(), outcome, holder.to_string());
        let previous = self.balances.get(&key).copied().unwrap_or(0);

        if value == 0 {
            self.balances.remove(&key);
        } else {
            self.balances.insert(key, value);
        }

        let supply = self
            .total_supply
            .entry((market_id.to_string(), outcome))
            .or_insert(0);
        if value >= previous {
            *supply = supply.saturating_add(value - previous);
        } else {
            *supply = supply.saturating_sub(previous - value);
        }
    }

    /// All non-zero positions for a holder, ordered for stable output
    pub fn holder_positions(&self, holder: &str) -> Vec<(String, usize, u128)> {
        let mut positions: Vec<(String, usize, u128)> = self
            .balances
            .iter()
            .filter(|((_, _, h), shares)| h == holder && **shares > 0)
            .map(|((market_id, outcome, _), shares)| (market_id.clone(), *outcome, *shares))
            .collect();
        positions.sort();
        positions
    }

    /// Every non-zero position in the registry, for snapshots
    pub fn all_positions(&self) -> Vec<(String, usize, String, u128)> {
        let mut entries: Vec<(String, usize, String, u128)> = self
            .balances
            .iter()
            .filter(|(_, shares)| **shares > 0)
            .map(|((market_id, outcome, holder), shares)| {
                (market_id.clone(), *outcome, holder.clone(), *shares)
            })
            .collect();
        entries.sort();
        entries
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_and_get() {
        let mut registry = ShareRegistry::new();

        registry.credit_shares("m1", 0, "alice", 50).unwrap();
        registry.credit_shares("m1", 0, "alice", 25).unwrap();
        registry.credit_shares("m1", 1, "bob", 10).unwrap();

        assert_eq!(registry.get_shares("m1", 0, "alice"), 75);
        assert_eq!(registry.get_shares("m1", 1, "bob"), 10);
        assert_eq!(registry.get_shares("m1", 1, "alice"), 0);
        assert_eq!(registry.outcome_supply("m1", 0), 75);
    }

    #[test]
    fn test_set_shares_adjusts_supply() {
        let mut registry = ShareRegistry::new();
        registry.credit_shares("m1", 0, "alice", 60).unwrap();
        registry.credit_shares("m1", 0, "bob", 40).unwrap();

        registry.set_shares("m1", 0, "alice", 0);
        assert_eq!(registry.get_shares("m1", 0, "alice"), 0);
        assert_eq!(registry.outcome_supply("m1", 0), 40);

        registry.set_shares("m1", 0, "alice", 60);
        assert_eq!(registry.outcome_supply("m1", 0), 100);
    }

    #[test]
    fn test_credit_overflow() {
        let mut registry = ShareRegistry::new();
        registry.credit_shares("m1", 0, "alice", u128::MAX).unwrap();
        let result = registry.credit_shares("m1", 0, "alice", 1);
        assert!(matches!(result, Err(SettlementError::ValueOverflow(_))));
    }

    #[test]
    fn test_holder_positions_sorted() {
        let mut registry = ShareRegistry::new();
        registry.credit_shares("m2", 1, "alice", 5).unwrap();
        registry.credit_shares("m1", 1, "alice", 3).unwrap();
        registry.credit_shares("m1", 0, "alice", 2).unwrap();
        registry.credit_shares("m1", 0, "bob", 9).unwrap();

        let positions = registry.holder_positions("alice");
        assert_eq!(
            positions,
            vec![
                ("m1".to_string(), 0, 2),
                ("m1".to_string(), 1, 3),
                ("m2".to_string(), 1, 5),
            ]
        );
    }
}
