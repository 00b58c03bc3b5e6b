use super::ui;
use crate::core::payment::{AddressProvider, PaymentStatus, check_payment};
use crate::core::PriceFeed;
use anyhow::{Result, bail};
use tracing::error;

pub fn describe(status: &PaymentStatus) -> String {
    match status {
        PaymentStatus::Confirmed { received_usd, .. } => format!(
            "{}\n{}",
            ui::style_text("✅ Payment Confirmed!", ui::StyleType::Positive),
            ui::style_text(
                &format!("{received_usd:.2} USD received. Account activated!"),
                ui::StyleType::Subtle
            )
        ),
        PaymentStatus::Insufficient {
            received_usd,
            min_usd,
            ..
        } => format!(
            "{}\n{}",
            ui::style_text("❌ Insufficient Payment", ui::StyleType::Error),
            ui::style_text(
                &format!(
                    "Only {received_usd:.2} USD received. Please send at least {min_usd} USD worth of BTC."
                ),
                ui::StyleType::Subtle
            )
        ),
    }
}

pub async fn run(
    address: &str,
    min_usd: f64,
    addresses: &dyn AddressProvider,
    feed: &dyn PriceFeed,
) -> Result<()> {
    let pb = ui::new_spinner("Checking payment status...");
    let result = check_payment(address, min_usd, addresses, feed).await;
    pb.finish_and_clear();

    match result {
        Ok(status) => println!("{}", describe(&status)),
        Err(e) => {
            error!(error = %e, "Payment check failed");
            println!(
                "{}\n{}",
                ui::style_text("Connection Error", ui::StyleType::Error),
                ui::style_text(
                    "Unable to check payment status. Please try again later.",
                    ui::StyleType::Subtle
                )
            );
        }
    }
    Ok(())
}

/// Prints the deposit address from the config.
pub fn run_address(address: Option<&str>) -> Result<()> {
    let Some(address) = address else {
        bail!("No payment address configured");
    };
    println!("{}", ui::style_text(address, ui::StyleType::Value));
    Ok(())
}
