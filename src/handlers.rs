// HTTP request handlers for the TickClear settlement API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

use crate::app_state::{now, AppState, SharedState};
use crate::models::*;
use crate::settlement::{
    self, calculate_proceeds, divide_up_winnings, market_creator_fee, reporting_fee,
    SettlementError,
};

/// Build the service router; the endpoint tests reuse this
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        // ===== MARKET & LIFECYCLE ENDPOINTS =====
        .route("/markets", get(get_markets))
        .route("/markets/:id", get(get_market))
        .route("/markets/:id/report", post(submit_report))
        .route("/markets/:id/finalize", post(finalize_market))
        .route("/markets/:id/redeemable", get(get_redeemable))
        // ===== SETTLEMENT QUERIES =====
        .route("/markets/:id/proceeds", get(get_proceeds))
        .route("/markets/:id/winnings", get(get_winnings))
        .route("/markets/:id/fees", get(get_fees))
        // ===== REDEMPTION =====
        .route("/claim", post(claim))
        // ===== POSITIONS & BALANCES =====
        .route("/positions/credit", post(credit_shares))
        .route("/positions/:holder", get(get_positions))
        .route("/balance/:account", get(get_balance))
        // ===== ACTIVITY & HEALTH =====
        .route("/activity", get(get_activity))
        .route("/health", get(health_check))
        .route("/", get(health_check))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn health_check() -> &'static str {
    "TickClear Settlement Core - Online"
}

fn error_status(error: &SettlementError) -> StatusCode {
    match error {
        SettlementError::MarketNotFound(_) => StatusCode::NOT_FOUND,
        SettlementError::TransferFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn error_body(error: &SettlementError) -> Json<Value> {
    Json(json!({ "success": false, "error": error.to_string() }))
}

fn market_not_found(id: &str) -> (StatusCode, Json<Value>) {
    let error = SettlementError::MarketNotFound(id.to_string());
    (error_status(&error), error_body(&error))
}

fn parse_amount(raw: &str) -> Result<u128, (StatusCode, Json<Value>)> {
    raw.parse().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": format!("Invalid amount: {}", raw) })),
        )
    })
}

// ===== MARKET & LIFECYCLE ENDPOINTS =====

pub async fn get_markets(State(state): State<SharedState>) -> Json<Value> {
    let app_state = state.lock().unwrap();
    let at = now();

    let mut markets: Vec<Value> = app_state
        .markets
        .values()
        .map(|m| {
            json!({
                "id": m.id,
                "question": m.question,
                "num_outcomes": m.num_outcomes,
                "num_ticks": m.num_ticks.to_string(),
                "end_time": m.end_time,
                "phase": m.phase(at).as_str(),
                "finalized": m.is_finalized(),
            })
        })
        .collect();
    markets.sort_by_key(|m| m["id"].as_str().unwrap_or_default().to_string());

    Json(json!({ "markets": markets }))
}

pub async fn get_market(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let app_state = state.lock().unwrap();
    let market = app_state.markets.get(&id).ok_or_else(|| market_not_found(&id))?;
    let at = now();

    Ok(Json(json!({
        "id": market.id,
        "question": market.question,
        "num_outcomes": market.num_outcomes,
        "num_ticks": market.num_ticks.to_string(),
        "end_time": market.end_time,
        "creator": market.creator,
        "designated_reporter": market.designated_reporter,
        "creator_fee_divisor": market.creator_fee_divisor.to_string(),
        "reporting_fee_divisor": market.reporting_fee_divisor.to_string(),
        "phase": market.phase(at).as_str(),
        "dispute_due_timestamp": market.dispute_due_timestamp,
        "finalization_timestamp": market.finalization_timestamp,
        "redeemable_at": market.redeemable_at(),
        "payout_distribution": market.payout_distribution.as_ref()
            .map(|p| p.iter().map(|w| w.to_string()).collect::<Vec<_>>()),
    })))
}

pub async fn submit_report(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(request): Json<ReportRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let at = now();
    let mut app_state = state.lock().unwrap();

    let market = app_state.markets.get_mut(&id).ok_or_else(|| market_not_found(&id))?;
    market
        .designated_report(at, request.payout)
        .map_err(|e| (error_status(&e), error_body(&e)))?;
    let dispute_due = market.dispute_due_timestamp;

    app_state.log_activity("DESIGNATED_REPORT", &format!("market {}", id));

    Ok(Json(json!({
        "success": true,
        "market_id": id,
        "dispute_due_timestamp": dispute_due,
    })))
}

pub async fn finalize_market(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let at = now();
    let mut app_state = state.lock().unwrap();

    let market = app_state.markets.get_mut(&id).ok_or_else(|| market_not_found(&id))?;
    market
        .try_finalize(at)
        .map_err(|e| (error_status(&e), error_body(&e)))?;
    let finalized_at = market.finalization_timestamp;
    let redeemable_at = market.redeemable_at();

    app_state.log_activity("MARKET_FINALIZED", &format!("market {}", id));

    Ok(Json(json!({
        "success": true,
        "market_id": id,
        "finalization_timestamp": finalized_at,
        "redeemable_at": redeemable_at,
    })))
}

pub async fn get_redeemable(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let app_state = state.lock().unwrap();
    let market = app_state.markets.get(&id).ok_or_else(|| market_not_found(&id))?;
    let at = now();

    Ok(Json(json!({
        "market_id": id,
        "redeemable": market.is_redeemable(at),
        "phase": market.phase(at).as_str(),
        "redeemable_at": market.redeemable_at(),
    })))
}

// ===== SETTLEMENT QUERIES =====

pub async fn get_proceeds(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<ProceedsQuery>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let amount = parse_amount(&query.amount)?;
    let app_state = state.lock().unwrap();
    let market = app_state.markets.get(&id).ok_or_else(|| market_not_found(&id))?;

    let gross = calculate_proceeds(market, query.outcome, amount)
        .map_err(|e| (error_status(&e), error_body(&e)))?;

    Ok(Json(json!({
        "market_id": id,
        "outcome": query.outcome,
        "amount": amount.to_string(),
        "gross": gross.to_string(),
    })))
}

pub async fn get_winnings(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<ProceedsQuery>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let amount = parse_amount(&query.amount)?;
    let app_state = state.lock().unwrap();
    let market = app_state.markets.get(&id).ok_or_else(|| market_not_found(&id))?;

    let split = divide_up_winnings(market, query.outcome, amount)
        .map_err(|e| (error_status(&e), error_body(&e)))?;

    Ok(Json(json!({
        "market_id": id,
        "outcome": query.outcome,
        "amount": amount.to_string(),
        "shareholder": split.shareholder.to_string(),
        "creator_fee": split.creator.to_string(),
        "reporting_fee": split.reporter.to_string(),
    })))
}

pub async fn get_fees(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<FeesQuery>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let value = parse_amount(&query.value)?;
    let app_state = state.lock().unwrap();
    let market = app_state.markets.get(&id).ok_or_else(|| market_not_found(&id))?;

    if !market.is_finalized() {
        let error = SettlementError::NotFinalized(id.clone());
        return Err((error_status(&error), error_body(&error)));
    }

    Ok(Json(json!({
        "market_id": id,
        "value": value.to_string(),
        "creator_fee": market_creator_fee(market, value).to_string(),
        "reporting_fee": reporting_fee(market, value).to_string(),
    })))
}

// ===== REDEMPTION =====

pub async fn claim(
    State(state): State<SharedState>,
    Json(request): Json<ClaimRequest>,
) -> Result<Json<ClaimResponse>, (StatusCode, Json<ClaimResponse>)> {
    let at = now();
    let mut guard = state.lock().unwrap();
    let app_state = &mut *guard;

    let market = match app_state.markets.get(&request.market_id) {
        Some(market) => market.clone(),
        None => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ClaimResponse::error(
                    request.market_id.clone(),
                    request.holder,
                    format!("Market not found: {}", request.market_id),
                )),
            ));
        }
    };

    let AppState { registry, ledger, .. } = app_state;
    let result = settlement::claim_proceeds(&market, registry, &request.holder, at, |payments| {
        ledger.credit_batch(payments, &market.id, at)
    });

    match result {
        Ok(result) => {
            app_state.log_activity(
                "CLAIM",
                &format!(
                    "{} redeemed market {} | gross {} | net {}",
                    result.holder, result.market_id, result.gross, result.shareholder_amount
                ),
            );
            Ok(Json(ClaimResponse::success(result)))
        }
        Err(e) => Err((
            error_status(&e),
            Json(ClaimResponse::error(
                request.market_id,
                request.holder,
                e.to_string(),
            )),
        )),
    }
}

// ===== POSITIONS & BALANCES =====

pub async fn credit_shares(
    State(state): State<SharedState>,
    Json(request): Json<CreditSharesRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut app_state = state.lock().unwrap();

    let num_outcomes = app_state
        .markets
        .get(&request.market_id)
        .ok_or_else(|| market_not_found(&request.market_id))?
        .num_outcomes;

    if request.outcome >= num_outcomes {
        let error = SettlementError::InvalidOutcome(format!(
            "outcome {} out of range for market {}",
            request.outcome, request.market_id
        ));
        return Err((error_status(&error), error_body(&error)));
    }

    let balance = app_state
        .registry
        .credit_shares(
            &request.market_id,
            request.outcome,
            &request.holder,
            request.amount,
        )
        .map_err(|e| (error_status(&e), error_body(&e)))?;

    Ok(Json(json!({
        "success": true,
        "market_id": request.market_id,
        "outcome": request.outcome,
        "holder": request.holder,
        "balance": balance.to_string(),
    })))
}

pub async fn get_positions(
    State(state): State<SharedState>,
    Path(holder): Path<String>,
) -> Json<Value> {
    let app_state = state.lock().unwrap();

    let positions: Vec<Value> = app_state
        .registry
        .holder_positions(&holder)
        .into_iter()
        .map(|(market_id, outcome, shares)| {
            json!({
                "market_id": market_id,
                "outcome": outcome,
                "shares": shares.to_string(),
            })
        })
        .collect();

    Json(json!({ "holder": holder, "positions": positions }))
}

pub async fn get_balance(
    State(state): State<SharedState>,
    Path(account): Path<String>,
) -> Json<Value> {
    let app_state = state.lock().unwrap();

    let transactions: Vec<Value> = app_state
        .ledger
        .transactions_for(&account, 20)
        .into_iter()
        .map(|tx| {
            json!({
                "id": tx.id,
                "tx_type": tx.tx_type,
                "amount": tx.amount.to_string(),
                "market_id": tx.market_id,
                "timestamp": tx.timestamp,
            })
        })
        .collect();

    Json(json!({
        "account": account,
        "balance": app_state.ledger.balance(&account).to_string(),
        "transactions": transactions,
    }))
}

// ===== ACTIVITY =====

pub async fn get_activity(State(state): State<SharedState>) -> Json<Value> {
    let app_state = state.lock().unwrap();
    Json(json!({ "activity": app_state.activity }))
}
