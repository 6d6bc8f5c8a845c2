use anyhow::Result;
use comfy_table::Cell;
use rust_decimal::Decimal;

use crate::budget::{BudgetPolicy, PolicyUpdate};
use crate::cli::ui;
use crate::conversion::CurrencyConverter;
use crate::core::currency::{BASE_CURRENCY, Currency};
use crate::core::month::YearMonth;
use crate::session::Session;

/// Budget table for `month`, which is usually the current one.
pub fn display_as_table(
    budget: &BudgetPolicy,
    converter: &CurrencyConverter,
    month: YearMonth,
) -> String {
    let policy = budget.policy();

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Monthly budget"),
        ui::header_cell(&format!("{month} ({})", converter.display_currency())),
        ui::header_cell("Effective from"),
    ]);
    table.add_row(vec![
        ui::money_cell(policy.monthly_budget, BASE_CURRENCY.code()),
        ui::format_optional_cell(budget.budget_for_month(month, converter), |b| {
            ui::format_money(b, converter.display_currency())
        }),
        Cell::new(policy.budget_effective_from),
    ]);
    table.to_string()
}

/// Shows the policy, or updates it when an amount or currency is given.
/// A missing field keeps its current value.
pub async fn run(
    session: &mut Session,
    amount: Option<Decimal>,
    currency: Option<Currency>,
) -> Result<()> {
    if amount.is_some() || currency.is_some() {
        let current = session.policy();
        let update = PolicyUpdate::new(
            amount.unwrap_or(current.monthly_budget),
            currency.unwrap_or(current.currency),
        )?;
        session.update_settings(update).await?;
        println!("{}", ui::style_text("Budget updated", ui::StyleType::TotalValue));
    }

    println!(
        "{}",
        display_as_table(session.budget(), session.converter(), YearMonth::current())
    );
    Ok(())
}
