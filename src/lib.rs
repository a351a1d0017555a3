/// TickClear Settlement Core
/// Exports all modules for use as a library crate

pub mod app_state;
pub mod handlers;
pub mod ledger;
pub mod market;
pub mod models;
pub mod registry;
pub mod settlement;
pub mod units;

// Re-export from market (finalization lifecycle)
pub use market::{
    Market, MarketPhase, DEFAULT_CREATOR_FEE_DIVISOR, DEFAULT_REPORTING_FEE_DIVISOR,
    DISPUTE_WINDOW_SECS, REDEMPTION_WAIT_SECS,
};

// Re-export from settlement (proceeds, fees, claims)
pub use settlement::{
    calculate_proceeds, claim_proceeds, divide_up_winnings, market_creator_fee, reporting_fee,
    ClaimResult, Payment, PaymentKind, SettlementError, WinningsSplit, REPORTING_FEE_POOL,
};

pub use app_state::{now, AppState, SharedState};
pub use handlers::build_router;
pub use ledger::{CashLedger, Transaction, TxType};
pub use models::{ClaimRequest, ClaimResponse, CreditSharesRequest, ReportRequest};
pub use registry::ShareRegistry;
