use anyhow::Result;
use comfy_table::Cell;
use rust_decimal::Decimal;

use crate::cli::ui;
use crate::core::expense::Category;
use crate::core::month::YearMonth;
use crate::records::RecordStore;
use crate::service;
use crate::session::Session;
use crate::settings::SettingsStore;
use crate::summary::MonthlySummary;

pub fn display_as_table(summary: &MonthlySummary) -> String {
    let currency = summary.currency.as_str();

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Category"),
        ui::header_cell(&format!("Spent ({currency})")),
        ui::header_cell("Share (%)"),
    ]);

    for category in Category::ALL {
        let Some(amount) = summary.by_category.get(&category) else {
            continue;
        };
        let (name, emoji) = category.display_info();
        let share = (!summary.total.is_zero())
            .then(|| *amount / summary.total * Decimal::ONE_HUNDRED);
        table.add_row(vec![
            Cell::new(format!("{emoji} {name}")),
            ui::money_cell(*amount, currency),
            ui::format_optional_cell(share, |s| format!("{s:.1}%")),
        ]);
    }

    let mut totals = ui::new_styled_table();
    totals.set_header(vec![
        ui::header_cell("Total"),
        ui::header_cell("Previous month"),
        ui::header_cell("Change"),
        ui::header_cell("Budget left"),
    ]);
    totals.add_row(vec![
        ui::money_cell(summary.total, currency),
        ui::money_cell(summary.previous_month_total, currency),
        ui::change_cell(summary.change),
        ui::remaining_cell(summary.budget_remaining, currency),
    ]);

    let mut output = format!(
        "Spending for {}\n\n",
        ui::style_text(&summary.month.to_string(), ui::StyleType::Title)
    );
    if summary.expense_count == 0 {
        output.push_str(&ui::style_text("No expenses this month\n", ui::StyleType::Subtle));
    } else {
        output.push_str(&format!(
            "{} expenses\n{table}\n",
            summary.expense_count
        ));
    }
    output.push_str(&format!("{totals}\n"));
    if !summary.has_budget {
        output.push_str(&ui::style_text(
            "The current budget starts after this month\n",
            ui::StyleType::Subtle,
        ));
    }
    output
}

/// Summary in the display currency, from the session mirror.
pub fn run(session: &Session, month: YearMonth) -> Result<()> {
    let summary = session.monthly_summary(month);
    println!("{}", display_as_table(&summary));
    if let Some(error) = session.converter().last_error() {
        println!("{}", ui::style_text(error, ui::StyleType::Error));
    }
    Ok(())
}

/// Summary in the base currency, straight from the stores.
pub async fn run_base(
    owner: &str,
    month: YearMonth,
    records: &dyn RecordStore,
    settings: &dyn SettingsStore,
) -> Result<()> {
    let summary = service::monthly_summary(owner, month, records, settings).await?;
    println!("{}", display_as_table(&summary));
    Ok(())
}
