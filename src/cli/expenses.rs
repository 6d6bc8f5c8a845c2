use anyhow::Result;
use comfy_table::Cell;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::cli::ui;
use crate::conversion::CurrencyConverter;
use crate::core::currency::BASE_CURRENCY;
use crate::core::expense::{Category, ExpenseChanges, ExpenseRecord, NewExpense};
use crate::core::money::add_to_total;
use crate::core::month::YearMonth;
use crate::mirror::{self, TopCategory};
use crate::session::Session;
use crate::summary::AmountView;

/// Renders records with amounts in the converter's display currency.
pub fn display_as_table(records: &[&ExpenseRecord], converter: &CurrencyConverter) -> String {
    let currency = converter.display_currency();

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Name"),
        ui::header_cell("Category"),
        ui::header_cell(&format!("Amount ({currency})")),
        ui::header_cell("Note"),
        ui::header_cell("Id"),
    ]);

    for record in records {
        let (category, emoji) = record.category.display_info();
        table.add_row(vec![
            Cell::new(record.date),
            Cell::new(&record.name),
            Cell::new(format!("{emoji} {category}")),
            ui::money_cell(converter.convert_from_base(record.amount), currency),
            Cell::new(record.note.as_deref().unwrap_or("")),
            Cell::new(ui::style_text(&record.id, ui::StyleType::Subtle)),
        ]);
    }

    table.to_string()
}

/// Total and top category of exactly `records`. Each record is presented
/// in `view` before summing, like the monthly summary does.
fn listed_totals(
    records: &[&ExpenseRecord],
    view: &dyn AmountView,
) -> (Decimal, Option<TopCategory>) {
    let mut total = Decimal::ZERO;
    let mut by_category = BTreeMap::new();
    for record in records {
        let amount = view.present(record.amount);
        total = add_to_total(total, amount);
        let category_total = by_category.entry(record.category).or_insert(Decimal::ZERO);
        *category_total = add_to_total(*category_total, amount);
    }
    (total, mirror::top_category(&by_category, total))
}

fn display_totals(records: &[&ExpenseRecord], converter: &CurrencyConverter) -> String {
    let currency = converter.display_currency();
    let (total, top) = listed_totals(records, converter);

    let mut output = format!(
        "{} {}",
        ui::style_text("Total spent:", ui::StyleType::TotalLabel),
        ui::style_text(&ui::format_money(total, currency), ui::StyleType::TotalValue)
    );
    if let Some(top) = top {
        let (name, emoji) = top.category.display_info();
        output.push_str(&format!(
            "\n{} {emoji} {name} ({}, {}%)",
            ui::style_text("Top category:", ui::StyleType::TotalLabel),
            ui::format_money(top.amount, currency),
            top.percentage
        ));
    }
    output
}

/// Lists one month and/or category, or the most recent expenses when
/// neither is given. Totals cover the listed expenses only, the all time
/// line is in the base currency.
pub fn list(
    session: &Session,
    month: Option<YearMonth>,
    category: Option<Category>,
) -> Result<()> {
    let mirror = session.mirror();
    let mut records = match (month, category) {
        (Some(month), _) => mirror.expenses_in_month(month),
        (None, Some(category)) => mirror.expenses_in_category(category),
        (None, None) => mirror.recent_expenses(),
    };
    if let (Some(_), Some(category)) = (month, category) {
        records.retain(|r| r.category == category);
    }

    if records.is_empty() {
        println!("{}", ui::style_text("No expenses found", ui::StyleType::Subtle));
        return Ok(());
    }
    println!("{}", display_as_table(&records, session.converter()));
    println!("{}", display_totals(&records, session.converter()));

    let mut all_time = format!(
        "{} {}",
        ui::style_text("All time:", ui::StyleType::Subtle),
        ui::format_money(mirror.total_expenses(), BASE_CURRENCY.code())
    );
    if let Some(top) = mirror.top_category() {
        let (name, emoji) = top.category.display_info();
        all_time.push_str(&format!(", mostly {emoji} {name} ({}%)", top.percentage));
    }
    println!("{all_time}");
    Ok(())
}

pub async fn add(session: &mut Session, expense: NewExpense) -> Result<()> {
    let record = session.mirror_mut().add(expense).await?.clone();
    println!("Added expense {}", ui::style_text(&record.id, ui::StyleType::Subtle));
    println!("{}", display_as_table(&[&record], session.converter()));
    Ok(())
}

pub async fn edit(session: &mut Session, id: &str, changes: ExpenseChanges) -> Result<()> {
    if changes.is_empty() {
        anyhow::bail!("Nothing to change, pass at least one field to update");
    }
    let record = session.mirror_mut().update(id, changes).await?.clone();
    println!("Updated expense {}", ui::style_text(&record.id, ui::StyleType::Subtle));
    println!("{}", display_as_table(&[&record], session.converter()));
    Ok(())
}

pub async fn delete(session: &mut Session, id: &str) -> Result<()> {
    session.mirror_mut().delete(id).await?;
    println!("Deleted expense {}", ui::style_text(id, ui::StyleType::Subtle));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::tests::MockFeed;
    use chrono::Utc;
    use std::sync::Arc;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn record(id: &str, amount: &str, category: Category, date: &str) -> ExpenseRecord {
        let now = Utc::now();
        ExpenseRecord {
            id: id.to_string(),
            owner: "alice".to_string(),
            name: id.to_string(),
            amount: d(amount),
            category,
            date: date.parse().unwrap(),
            note: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_totals_cover_listed_records_only() {
        console::set_colors_enabled(false);
        let mut converter =
            CurrencyConverter::new(Arc::new(MockFeed::failing()), Arc::new(MockFeed::failing()));
        converter.set_display_currency("USD");

        let all = [
            record("a", "0.05", Category::Dining, "2026-01-02"),
            record("b", "0.05", Category::Dining, "2026-01-03"),
            record("c", "0.10", Category::Transport, "2026-01-04"),
            record("d", "900", Category::Bills, "2025-12-01"),
        ];
        let january: Vec<&ExpenseRecord> = all[..3].iter().collect();

        // Per record: 0.054 -> 0.05 twice, 0.108 -> 0.11. Converting the
        // 0.20 sum would give 0.22 instead.
        let (total, top) = listed_totals(&january, &converter);
        assert_eq!(total, d("0.21"));
        let top = top.unwrap();
        assert_eq!(top.category, Category::Transport);
        assert_eq!(top.amount, d("0.11"));
        assert_eq!(top.percentage, d("52"));

        let output = display_totals(&january, &converter);
        assert!(output.contains("$0.21"));
        assert!(output.contains("Transport"));
        assert!(!output.contains("Bills"));
    }
}
