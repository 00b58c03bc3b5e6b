pub mod calc;
pub mod convert;
pub mod payment;
pub mod portfolio;
pub mod setup;
pub mod ticker;
pub mod ui;

use tracing::warn;

/// Resolves once Ctrl-C is pressed. Create it once per loop and poll it by
/// reference so a signal that lands mid-fetch is not lost.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Unable to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
