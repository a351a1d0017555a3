// ============================================================================
// Claim Engine - TickClear Settlement Core
// ============================================================================
//
// One holder's redemption across every outcome of a finalized market:
//
//   1. refuse unless the market is redeemable at `now`
//   2. read each outcome balance, accumulate the three-way split
//   3. zero every touched balance, winning and losing alike
//   4. hand the payout legs to the value-transfer sink in one batch
//
// Zeroing is unconditional once an outcome is processed: losing shares are
// burned in the same pass, which is what makes redemption exactly-once per
// holder per market. If the sink rejects the batch, every zeroed balance is
// restored before the error surfaces; there is no state in which shares were
// burned but value unpaid.
//
// The engine holds no state of its own. Callers that share a registry and
// sink across threads serialize claims through their own lock.
//
// ============================================================================

use uuid::Uuid;

use crate::market::Market;
use crate::registry::ShareRegistry;
use crate::settlement::proceeds::divide_up_winnings;
use crate::settlement::{SettlementError, REPORTING_FEE_POOL};

/// What a payout leg is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentKind {
    Proceeds,
    CreatorFee,
    ReportingFee,
}

/// One leg of a claim payout
#[derive(Debug, Clone)]
pub struct Payment {
    pub recipient: String,
    pub amount: u128,
    pub kind: PaymentKind,
}

/// Outcome of a processed claim
#[derive(Debug, Clone)]
pub struct ClaimResult {
    pub claim_id: String,
    pub market_id: String,
    pub holder: String,
    /// True if any outcome balance was non-zero; a losing position still
    /// counts because its shares were consumed
    pub paid: bool,
    /// Gross value across all outcomes before fees
    pub gross: u128,
    /// Net value credited to the holder
    pub shareholder_amount: u128,
    pub creator_fee: u128,
    pub reporting_fee: u128,
    /// Number of outcomes that carried a balance
    pub outcomes_redeemed: usize,
    pub timestamp: u64,
}

/// Redeem every outcome position one holder has in a market.
///
/// `pay` is the value-transfer sink: it receives all payout legs in a single
/// call and must apply them all or reject them all. A rejection rolls back
/// the balance zeroing and surfaces as TransferFailure.
///
/// A holder with no balances succeeds with `paid == false`, which is what
/// makes a duplicate claim a harmless no-op rather than an error.
pub fn claim_proceeds<F>(
    market: &Market,
    registry: &mut ShareRegistry,
    holder: &str,
    now: u64,
    pay: F,
) -> Result<ClaimResult, SettlementError>
where
    F: FnOnce(&[Payment]) -> Result<(), String>,
{
    if !market.is_finalized() {
        return Err(SettlementError::NotFinalized(market.id.clone()));
    }
    if !market.is_redeemable(now) {
        return Err(SettlementError::NotRedeemable(format!(
            "market {} redeemable at {}, now {}",
            market.id,
            market.redeemable_at().unwrap_or(0),
            now
        )));
    }

    let mut gross: u128 = 0;
    let mut shareholder_amount: u128 = 0;
    let mut creator_fee: u128 = 0;
    let mut reporting_fee: u128 = 0;
    let mut zeroed: Vec<(usize, u128)> = Vec::new();

    for outcome in 0..market.num_outcomes {
        let balance = registry.get_shares(&market.id, outcome, holder);
        if balance == 0 {
            continue;
        }

        let split = match divide_up_winnings(market, outcome, balance) {
            Ok(split) => split,
            Err(e) => {
                restore(registry, &market.id, holder, &zeroed);
                return Err(e);
            }
        };

        gross = match gross.checked_add(split.total()) {
            Some(total) => total,
            None => {
                restore(registry, &market.id, holder, &zeroed);
                return Err(SettlementError::ValueOverflow(format!(
                    "claim total overflow for {} in market {}",
                    holder, market.id
                )));
            }
        };
        shareholder_amount += split.shareholder;
        creator_fee += split.creator;
        reporting_fee += split.reporter;

        registry.set_shares(&market.id, outcome, holder, 0);
        zeroed.push((outcome, balance));
    }

    let mut payments = Vec::with_capacity(3);
    if shareholder_amount > 0 {
        payments.push(Payment {
            recipient: holder.to_string(),
            amount: shareholder_amount,
            kind: PaymentKind::Proceeds,
        });
    }
    if creator_fee > 0 {
        payments.push(Payment {
            recipient: market.creator.clone(),
            amount: creator_fee,
            kind: PaymentKind::CreatorFee,
        });
    }
    if reporting_fee > 0 {
        payments.push(Payment {
            recipient: market
                .designated_reporter
                .clone()
                .unwrap_or_else(|| REPORTING_FEE_POOL.to_string()),
            amount: reporting_fee,
            kind: PaymentKind::ReportingFee,
        });
    }

    if !payments.is_empty() {
        if let Err(e) = pay(&payments) {
            restore(registry, &market.id, holder, &zeroed);
            return Err(SettlementError::TransferFailure(e));
        }
    }

    Ok(ClaimResult {
        claim_id: format!("claim_{}", &Uuid::new_v4().simple().to_string()[..12]),
        market_id: market.id.clone(),
        holder: holder.to_string(),
        paid: !zeroed.is_empty(),
        gross,
        shareholder_amount,
        creator_fee,
        reporting_fee,
        outcomes_redeemed: zeroed.len(),
        timestamp: now,
    })
}

fn restore(registry: &mut ShareRegistry, market_id: &str, holder: &str, zeroed: &[(usize, u128)]) {
    for (outcome, balance) in zeroed {
        registry.set_shares(market_id, *outcome, holder, *balance);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::REDEMPTION_WAIT_SECS;

    const TICKS: u128 = 1_000_000_000_000_000_000;
    const END: u64 = 1_000_000;

    fn finalized_market() -> (Market, u64) {
        let mut market = Market::new(
            "m1".to_string(),
            "q".to_string(),
            2,
            TICKS,
            END,
            "creator".to_string(),
        )
        .unwrap();
        market.designated_reporter = Some("reporter".to_string());

        market.designated_report(END + 1, vec![0, TICKS]).unwrap();
        let dispute_due = market.dispute_due_timestamp.unwrap();
        market.try_finalize(dispute_due + 1).unwrap();

        let claim_time = market.finalization_timestamp.unwrap() + REDEMPTION_WAIT_SECS;
        (market, claim_time)
    }

    #[test]
    fn test_zero_position_claim_is_noop() {
        let (market, claim_time) = finalized_market();
        let mut registry = ShareRegistry::new();

        let result =
            claim_proceeds(&market, &mut registry, "alice", claim_time, |_| Ok(())).unwrap();

        assert!(!result.paid);
        assert_eq!(result.gross, 0);
        assert_eq!(result.outcomes_redeemed, 0);
    }

    #[test]
    fn test_losing_position_consumed_without_payment() {
        let (market, claim_time) = finalized_market();
        let mut registry = ShareRegistry::new();
        registry.credit_shares("m1", 0, "bob", 5).unwrap();

        let mut sink_calls = 0;
        let result = claim_proceeds(&market, &mut registry, "bob", claim_time, |_| {
            sink_calls += 1;
            Ok(())
        })
        .unwrap();

        assert!(result.paid);
        assert_eq!(result.gross, 0);
        assert_eq!(result.shareholder_amount, 0);
        assert_eq!(sink_calls, 0);
        assert_eq!(registry.get_shares("m1", 0, "bob"), 0);
    }

    #[test]
    fn test_not_redeemable_before_wait() {
        let (market, claim_time) = finalized_market();
        let mut registry = ShareRegistry::new();
        registry.credit_shares("m1", 1, "alice", 1).unwrap();

        let result = claim_proceeds(&market, &mut registry, "alice", claim_time - 1, |_| Ok(()));
        assert!(matches!(result, Err(SettlementError::NotRedeemable(_))));
        assert_eq!(registry.get_shares("m1", 1, "alice"), 1);
    }

    #[test]
    fn test_sink_failure_restores_balances() {
        let (market, claim_time) = finalized_market();
        let mut registry = ShareRegistry::new();
        registry.credit_shares("m1", 0, "alice", 3).unwrap();
        registry.credit_shares("m1", 1, "alice", 2).unwrap();

        let result = claim_proceeds(&market, &mut registry, "alice", claim_time, |_| {
            Err("sink offline".to_string())
        });

        assert!(matches!(result, Err(SettlementError::TransferFailure(_))));
        assert_eq!(registry.get_shares("m1", 0, "alice"), 3);
        assert_eq!(registry.get_shares("m1", 1, "alice"), 2);
    }

    #[test]
    fn test_reporting_fee_falls_back_to_pool() {
        let (mut market, claim_time) = finalized_market();
        market.designated_reporter = None;
        let mut registry = ShareRegistry::new();
        registry.credit_shares("m1", 1, "alice", 1).unwrap();

        let mut recipients = Vec::new();
        claim_proceeds(&market, &mut registry, "alice", claim_time, |payments| {
            recipients = payments.iter().map(|p| p.recipient.clone()).collect();
            Ok(())
        })
        .unwrap();

        assert!(recipients.contains(&REPORTING_FEE_POOL.to_string()));
    }
}
