//! Terminal rendering: quote tables, the portfolio view, and the
//! per-symbol detail card.
//!
//! All prices are rounded to two decimals here and nowhere else; the
//! model keeps full precision.

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use owo_colors::OwoColorize;
use rust_decimal::Decimal;

use crate::market::Quote;
use crate::portfolio::ValuationReport;

/// Two-decimal money formatting, applied only at presentation time.
pub fn money(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

fn signed_pct(value: Decimal) -> String {
    let value = value.round_dp(2);
    if value.is_sign_negative() {
        format!("{:.2}%", value).bright_red().to_string()
    } else {
        format!("+{:.2}%", value).bright_green().to_string()
    }
}

fn short_name(name: &str) -> String {
    if name.chars().count() > 24 {
        let truncated: String = name.chars().take(24).collect();
        format!("{truncated}...")
    } else {
        name.to_string()
    }
}

/// The market snapshot table.
pub fn market_table(quotes: &[Quote]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Symbol", "Name", "Price", "Open", "Close", "Change %"]);

    for quote in quotes {
        table.add_row(vec![
            quote.symbol.clone(),
            short_name(&quote.name),
            format!("${}", money(quote.price)),
            format!("${}", money(quote.open)),
            format!("${}", money(quote.close)),
            signed_pct(quote.change_pct),
        ]);
    }
    table
}

/// The favorites table.
pub fn watchlist_table(quotes: &[Quote]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Symbol", "Name", "Price", "Change %"]);

    for quote in quotes {
        table.add_row(vec![
            quote.symbol.clone(),
            short_name(&quote.name),
            format!("${}", money(quote.price)),
            signed_pct(quote.change_pct),
        ]);
    }
    table
}

/// Print the full portfolio view: positions, totals, and cash.
pub fn print_portfolio(report: &ValuationReport) {
    if report.lines.is_empty() {
        println!("{}", "No open positions".bright_black().italic());
    } else {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                "Symbol",
                "Qty",
                "Price",
                "Cost Basis",
                "Value",
                "Gain/Loss",
                "Gain/Loss %",
            ]);

        for line in &report.lines {
            let gain = if line.gain_loss.is_sign_negative() {
                format!("${}", money(line.gain_loss)).bright_red().to_string()
            } else {
                format!("${}", money(line.gain_loss))
                    .bright_green()
                    .to_string()
            };
            let gain_pct = match line.gain_loss_pct {
                Some(pct) => signed_pct(pct),
                None => "-".to_string(),
            };
            table.add_row(vec![
                line.symbol.clone(),
                line.quantity.to_string(),
                format!("${}", money(line.market_price)),
                format!("${}", money(line.total_cost)),
                format!("${}", money(line.current_value)),
                gain,
                gain_pct,
            ]);
        }
        println!("{table}");

        println!(
            "Invested: {}   Value: {}   Gain/Loss: {}",
            format!("${}", money(report.total_invested)).bright_cyan(),
            format!("${}", money(report.total_value)).bright_cyan(),
            if report.total_gain_loss.is_sign_negative() {
                format!("${}", money(report.total_gain_loss))
                    .bright_red()
                    .to_string()
            } else {
                format!("${}", money(report.total_gain_loss))
                    .bright_green()
                    .to_string()
            },
        );
    }
    println!(
        "Cash balance: {}",
        format!("${}", money(report.cash)).bright_green()
    );
}

/// Per-symbol detail card.
pub fn print_quote_details(quote: &Quote) {
    println!(
        "{} {}",
        quote.symbol.bright_white().bold(),
        format!("({})", quote.exchange).bright_black()
    );
    println!("{}", quote.name);
    println!("{}", "─".repeat(40).bright_black());
    println!(
        "Price:      ${}  {}",
        money(quote.price),
        signed_pct(quote.change_pct)
    );
    println!("Change:     ${}", money(quote.change));
    println!("Open:       ${}", money(quote.open));
    println!("Prev close: ${}", money(quote.close));
    println!(
        "Day range:  ${} - ${}",
        money(quote.day_low),
        money(quote.day_high)
    );
    println!(
        "Year range: ${} - ${}",
        money(quote.year_low),
        money(quote.year_high)
    );
    println!("Volume:     {}", quote.volume);
}
