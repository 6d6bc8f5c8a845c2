use anyhow::Result;
use comfy_table::{Cell, CellAlignment};

use crate::cli::ui;
use crate::conversion::{CurrencyConverter, RefreshOutcome};
use crate::core::currency::{BASE_CURRENCY, Currency};
use crate::session::Session;

pub fn display_as_table(converter: &CurrencyConverter) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Per 1 {}", BASE_CURRENCY.code())),
    ]);

    for (code, rate) in converter.table().rates() {
        let label = match code.parse::<Currency>() {
            Ok(c) => format!("{} {code}", c.symbol()),
            Err(_) => code.clone(),
        };
        let label = if code == converter.display_currency() {
            ui::style_text(&label, ui::StyleType::TotalLabel)
        } else {
            label
        };
        table.add_row(vec![
            Cell::new(label),
            Cell::new(rate.normalize()).set_alignment(CellAlignment::Right),
        ]);
    }

    let updated = converter
        .table()
        .last_updated()
        .map_or("never (built-in rates)".to_string(), |t| {
            t.format("%Y-%m-%d %H:%M UTC").to_string()
        });
    format!(
        "{table}\n{}",
        ui::style_text(&format!("Last updated: {updated}"), ui::StyleType::Subtle)
    )
}

pub async fn run(session: &mut Session, refresh: bool) -> Result<()> {
    if refresh {
        let pb = ui::new_spinner("Refreshing exchange rates...");
        let outcome = session.refresh_rates().await;
        pb.finish_and_clear();

        match outcome {
            RefreshOutcome::Primary => println!("Rates refreshed"),
            RefreshOutcome::Fallback => println!("Rates refreshed from the fallback feed"),
            RefreshOutcome::Failed => {}
        }
    }

    println!("{}", display_as_table(session.converter()));
    if let Some(error) = session.converter().last_error() {
        println!("{}", ui::style_text(error, ui::StyleType::Error));
    }
    Ok(())
}
