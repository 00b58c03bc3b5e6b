//! Interactive calculator: reads edits from stdin while the scheduler keeps
//! the rates fresh in the background.

use super::ui;
use crate::core::convert::parse_quantity;
use crate::core::converter::ERROR_DISPLAY;
use crate::core::currency;
use crate::core::scheduler::RefreshScheduler;
use crate::core::ticker::label_for;
use crate::core::{Converter, ConverterEvent, PriceFeed};
use anyhow::{Context, Result, bail};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A parsed line of user input.
#[derive(Debug)]
pub enum CalcInput {
    Event(ConverterEvent),
    Refresh,
    SetBase(f64),
    Help,
    Quit,
}

/// Parses one input line. Unknown commands yield `None`.
pub fn parse_input(line: &str) -> Option<CalcInput> {
    let line = line.trim();
    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };

    let input = match command.to_lowercase().as_str() {
        "q" | "qty" => CalcInput::Event(ConverterEvent::QuantityChanged(arg.to_string())),
        "v" | "value" => CalcInput::Event(ConverterEvent::ValueChanged(arg.to_string())),
        "c" | "currency" if !arg.is_empty() => {
            CalcInput::Event(ConverterEvent::CurrencyChanged(arg.to_string()))
        }
        "s" | "set" => CalcInput::SetBase(parse_quantity(arg)),
        "r" | "refresh" => CalcInput::Refresh,
        "h" | "help" | "?" => CalcInput::Help,
        "quit" | "exit" => CalcInput::Quit,
        _ if !line.is_empty() && line.starts_with(|c: char| c.is_ascii_digit() || c == '.') => {
            CalcInput::Event(ConverterEvent::QuantityChanged(line.to_string()))
        }
        _ => return None,
    };
    Some(input)
}

fn print_help() {
    println!(
        "{}",
        ui::style_text(
            "q <amount>  set quantity | v <value>  set value | c <code>  currency | \
             s <amount>  base quantity | r  refresh | quit",
            ui::StyleType::Subtle
        )
    );
}

fn render(converter: &Converter, period: Duration) {
    let now = Instant::now();
    let quantity = if converter.quantity_field().is_empty() {
        "0"
    } else {
        converter.quantity_field()
    };
    let value = converter.displayed_value(now);
    let value = if value.is_empty() { "-" } else { value };

    println!(
        "{} {} = {} {}",
        quantity,
        ui::style_text(&label_for(converter.asset()), ui::StyleType::Label),
        ui::style_field(value, converter.value_style(now)),
        ui::style_text(converter.currency(), ui::StyleType::Subtle),
    );
    if let Some(updated) = converter.last_updated_label() {
        println!(
            "{}",
            ui::style_text(
                &format!(
                    "* Data updated every {} | Last updated: {updated}",
                    describe_period(period)
                ),
                ui::StyleType::Subtle
            )
        );
    }
}

fn describe_period(period: Duration) -> String {
    let secs = period.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{} minutes", secs / 60)
    } else {
        format!("{secs} seconds")
    }
}

/// Reads stdin lines on a plain thread. A blocked read there does not hold
/// up runtime shutdown; the thread ends with the process.
fn spawn_line_reader() -> Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::Builder::new()
        .name("calc-input".to_string())
        .spawn(move || {
            for line in std::io::stdin().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!(error = %e, "Failed to read input");
                        break;
                    }
                };
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        })
        .context("Failed to start input reader")?;
    Ok(rx)
}

pub async fn run(
    feed: Arc<dyn PriceFeed>,
    asset: &str,
    currency_code: &str,
    period: Duration,
) -> Result<()> {
    if currency::lookup(currency_code).is_none() {
        bail!("Unsupported currency: {}", currency_code);
    }

    let converter = Converter::new(asset, currency_code);
    let input = spawn_line_reader()?;
    print_help();
    session(converter, feed, period, input, super::ctrl_c()).await;
    Ok(())
}

/// Drives the converter from input lines and scheduler results until input
/// closes, the user quits or `shutdown` resolves.
async fn session(
    mut converter: Converter,
    feed: Arc<dyn PriceFeed>,
    period: Duration,
    mut input: mpsc::Receiver<String>,
    shutdown: impl Future<Output = ()>,
) -> Converter {
    tokio::pin!(shutdown);
    let (tx, mut rx) = mpsc::channel(8);
    let mut scheduler = RefreshScheduler::start(feed, converter.feed_query(), period, tx);
    let mut alert_until: Option<tokio::time::Instant> = None;

    loop {
        tokio::select! {
            line = input.recv() => {
                let Some(line) = line else {
                    debug!("Input closed");
                    break;
                };
                match parse_input(&line) {
                    Some(CalcInput::Event(ConverterEvent::CurrencyChanged(code)))
                        if currency::lookup(&code).is_none() =>
                    {
                        println!(
                            "{}",
                            ui::style_text(
                                &format!("Unsupported currency: {}", code.trim().to_uppercase()),
                                ui::StyleType::Error
                            )
                        );
                    }
                    Some(CalcInput::Event(event)) => {
                        converter.handle(event, Instant::now());
                        render(&converter, period);
                    }
                    Some(CalcInput::SetBase(amount)) => {
                        converter.set_base_quantity(amount);
                        render(&converter, period);
                    }
                    Some(CalcInput::Refresh) => scheduler.refresh_now(),
                    Some(CalcInput::Help) => print_help(),
                    Some(CalcInput::Quit) => break,
                    None => {
                        println!("{}", ui::style_text("Unknown command", ui::StyleType::Error));
                        print_help();
                    }
                }
            }
            Some(result) = rx.recv() => {
                if converter.on_refresh_tick(result, Instant::now()) {
                    alert_until = None;
                } else {
                    alert_until = Some(tokio::time::Instant::now() + ERROR_DISPLAY);
                }
                render(&converter, period);
            }
            _ = tokio::time::sleep_until(alert_until.unwrap_or_else(tokio::time::Instant::now)),
                if alert_until.is_some() => {
                alert_until = None;
                render(&converter, period);
            }
            _ = &mut shutdown => break,
        }
    }

    scheduler.stop();
    converter
}
