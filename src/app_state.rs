// Application state management

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ledger::{CashLedger, Transaction};
use crate::market::Market;
use crate::registry::ShareRegistry;

pub type SharedState = Arc<Mutex<AppState>>;

/// Unix seconds from the system clock. Only the service shell reads the
/// clock; the settlement core takes `now` as an argument.
pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

pub struct AppState {
    pub markets: HashMap<String, Market>,
    pub registry: ShareRegistry,
    pub ledger: CashLedger,
    /// Recent settlement activity, newest last, capped
    pub activity: Vec<String>,
    /// Snapshot path, from STATE_FILE
    pub state_file: String,
}

#[derive(Serialize, Deserialize)]
struct PositionSnapshot {
    market_id: String,
    outcome: usize,
    holder: String,
    #[serde(with = "crate::units::string")]
    shares: u128,
}

#[derive(Serialize, Deserialize)]
struct AccountSnapshot {
    account: String,
    #[serde(with = "crate::units::string")]
    balance: u128,
}

#[derive(Serialize, Deserialize)]
struct PersistedState {
    markets: HashMap<String, Market>,
    positions: Vec<PositionSnapshot>,
    accounts: Vec<AccountSnapshot>,
    transactions: Vec<Transaction>,
}

impl AppState {
    /// Bare state with no disk or environment access; tests start here
    pub fn empty() -> Self {
        Self {
            markets: HashMap::new(),
            registry: ShareRegistry::new(),
            ledger: CashLedger::new(),
            activity: Vec::new(),
            state_file: "data/state.json".to_string(),
        }
    }

    /// Production construction: environment config, persisted snapshot if
    /// one exists, demo markets otherwise
    pub fn new() -> Self {
        let mut state = Self::empty();
        state.state_file =
            std::env::var("STATE_FILE").unwrap_or_else(|_| "data/state.json".to_string());

        if state.load_from_disk().is_ok() {
            tracing::info!(
                markets = state.markets.len(),
                "loaded persisted settlement state"
            );
        } else {
            tracing::info!("no persisted state found, starting fresh");
            let seed = std::env::var("SEED_DEMO_MARKETS")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true);
            if seed {
                state.seed_demo_markets();
            }
        }

        state
    }

    fn seed_demo_markets(&mut self) {
        let created = now();

        let mut btc = Market::new(
            "btc-100k-2026".to_string(),
            "Will BTC close above $100k on 2026-12-31?".to_string(),
            2,
            1_000_000_000_000_000_000,
            created + 30 * 24 * 60 * 60,
            "market-desk".to_string(),
        )
        .expect("demo market parameters are valid");
        btc.designated_reporter = Some("oracle-desk".to_string());

        let mut gas = Market::new(
            "eth-gas-q4".to_string(),
            "Average ETH gas price in Q4, 0-40 gwei range".to_string(),
            2,
            40_000_000_000_000_000_000,
            created + 60 * 24 * 60 * 60,
            "market-desk".to_string(),
        )
        .expect("demo market parameters are valid");
        gas.designated_reporter = Some("oracle-desk".to_string());

        for market in [btc, gas] {
            self.log_activity("MARKET_SEEDED", &format!("{} | {}", market.id, market.question));
            self.markets.insert(market.id.clone(), market);
        }
    }

    pub fn save_to_disk(&self) -> Result<(), String> {
        let snapshot = PersistedState {
            markets: self.markets.clone(),
            positions: self
                .registry
                .all_positions()
                .into_iter()
                .map(|(market_id, outcome, holder, shares)| PositionSnapshot {
                    market_id,
                    outcome,
                    holder,
                    shares,
                })
                .collect(),
            accounts: self
                .ledger
                .accounts
                .iter()
                .map(|(account, balance)| AccountSnapshot {
                    account: account.clone(),
                    balance: *balance,
                })
                .collect(),
            transactions: self.ledger.transactions.clone(),
        };

        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| format!("Failed to serialize state: {}", e))?;

        if let Some(parent) = std::path::Path::new(&self.state_file).parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create state directory: {}", e))?;
        }
        std::fs::write(&self.state_file, json)
            .map_err(|e| format!("Failed to write state file: {}", e))?;

        Ok(())
    }

    fn load_from_disk(&mut self) -> Result<(), String> {
        let json = std::fs::read_to_string(&self.state_file).map_err(|_| "No state file found")?;

        let snapshot: PersistedState = serde_json::from_str(&json)
            .map_err(|e| format!("Failed to deserialize state: {}", e))?;

        self.markets = snapshot.markets;

        self.registry = ShareRegistry::new();
        for p in snapshot.positions {
            self.registry
                .credit_shares(&p.market_id, p.outcome, &p.holder, p.shares)
                .map_err(|e| format!("Corrupt position snapshot: {}", e))?;
        }

        self.ledger = CashLedger::new();
        for a in snapshot.accounts {
            self.ledger.accounts.insert(a.account, a.balance);
        }
        self.ledger.transactions = snapshot.transactions;

        Ok(())
    }

    pub fn log_activity(&mut self, action: &str, details: &str) {
        let timestamp = chrono::Local::now().format("%H:%M:%S");
        let entry = format!("[{}] {} | {}", timestamp, action, details);
        tracing::info!("{} | {}", action, details);
        self.activity.push(entry);
        if self.activity.len() > 1000 {
            self.activity.remove(0);
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_round_trip() {
        let dir = std::env::temp_dir().join("tickclear-state-test");
        let path = dir.join("state.json");
        let _ = std::fs::remove_file(&path);

        let mut state = AppState::empty();
        state.state_file = path.to_string_lossy().to_string();

        let market = Market::new(
            "m1".to_string(),
            "q".to_string(),
            2,
            40_000_000_000_000_000_000,
            1_000_000,
            "creator".to_string(),
        )
        .unwrap();
        state.markets.insert(market.id.clone(), market);
        state
            .registry
            .credit_shares("m1", 1, "alice", 30_000_000_000_000_000_000)
            .unwrap();
        state
            .ledger
            .accounts
            .insert("alice".to_string(), 25_000_000_000_000_000_000);

        state.save_to_disk().unwrap();

        let mut restored = AppState::empty();
        restored.state_file = state.state_file.clone();
        restored.load_from_disk().unwrap();

        assert_eq!(restored.markets.len(), 1);
        assert_eq!(
            restored.registry.get_shares("m1", 1, "alice"),
            30_000_000_000_000_000_000
        );
        assert_eq!(restored.ledger.balance("alice"), 25_000_000_000_000_000_000);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_activity_log_capped() {
        let mut state = AppState::empty();
        for i in 0..1100 {
            state.log_activity("TEST", &format!("entry {}", i));
        }
        assert_eq!(state.activity.len(), 1000);
        assert!(state.activity.last().unwrap().contains("entry 1099"));
    }
}
