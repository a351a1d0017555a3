// TickClear Settlement Core - Main Entry Point
// Redemption and proceeds service for finalized outcome markets

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tickclear_settlement::app_state::{AppState, SharedState};
use tickclear_settlement::handlers::build_router;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt().with_target(false).init();

    println!("\n═══════════════════════════════════════════════");
    println!("     TickClear Settlement Core");
    println!("═══════════════════════════════════════════════\n");

    let state: SharedState = Arc::new(Mutex::new(AppState::new()));

    // Clone state for the shutdown handler before moving into the router
    let shutdown_state = state.clone();

    let app = build_router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(4321);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!("listening on http://{}", addr);
    tracing::info!("POST /claim                      - redeem a holder's winning shares");
    tracing::info!("GET  /markets                    - list settlement markets");
    tracing::info!("GET  /markets/:id/redeemable     - redemption gate status");
    tracing::info!("GET  /markets/:id/proceeds       - gross proceeds for a position");
    tracing::info!("GET  /markets/:id/winnings       - net three-way split for a position");
    tracing::info!("POST /markets/:id/report         - designated report (reporting subsystem)");
    tracing::info!("POST /markets/:id/finalize       - finalize after the dispute window");

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();

    // Persist settlement state on CTRL+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C handler");

        tracing::info!("shutdown signal received, saving state");
        if let Ok(app_state) = shutdown_state.lock() {
            if let Err(e) = app_state.save_to_disk() {
                tracing::error!("failed to save state: {}", e);
            }
        }
        std::process::exit(0);
    });

    axum::serve(listener, app).await.unwrap();
}
