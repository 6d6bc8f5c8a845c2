//! Monthly aggregation.
//!
//! A summary is recomputed in full from the raw records and a policy
//! snapshot on every call. The currency space it reports in is chosen by the
//! caller through an [`AmountView`]: [`BaseAmounts`] for storage-side
//! recomputation, or a [`CurrencyConverter`] for display.
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::budget::Policy;
use crate::conversion::CurrencyConverter;
use crate::core::currency::BASE_CURRENCY;
use crate::core::expense::{Category, ExpenseRecord};
use crate::core::money::{add_to_total, round_cents, round_percent};
use crate::core::month::YearMonth;

/// Currency space a summary is computed in.
pub trait AmountView {
    fn currency_code(&self) -> &str;

    /// Presents a base currency amount in this space, rounded to cents.
    fn present(&self, base_amount: Decimal) -> Decimal;
}

/// Amounts as stored, no conversion.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseAmounts;

impl AmountView for BaseAmounts {
    fn currency_code(&self) -> &str {
        BASE_CURRENCY.code()
    }

    fn present(&self, base_amount: Decimal) -> Decimal {
        round_cents(base_amount)
    }
}

impl AmountView for CurrencyConverter {
    fn currency_code(&self) -> &str {
        self.display_currency()
    }

    fn present(&self, base_amount: Decimal) -> Decimal {
        self.convert_from_base(base_amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub month: YearMonth,
    pub total: Decimal,
    pub previous_month_total: Decimal,
    /// Month over month change in percent, one decimal.
    pub change: Decimal,
    pub expense_count: usize,
    /// Only categories with at least one record this month.
    pub by_category: BTreeMap<Category, Decimal>,
    pub has_budget: bool,
    pub budget_remaining: Option<Decimal>,
    pub currency: String,
}

/// Percent change from `previous` to `current`.
///
/// Spending where there was none before counts as a 100% increase; two
/// empty months are no change. An increase too large to represent is
/// reported as [`Decimal::MAX`].
pub fn percent_change(current: Decimal, previous: Decimal) -> Decimal {
    if previous > Decimal::ZERO {
        current
            .checked_sub(previous)
            .and_then(|delta| delta.checked_div(previous))
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map(round_percent)
            .unwrap_or(Decimal::MAX)
    } else if current > Decimal::ZERO {
        Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    }
}

/// Summarizes `month` from `records`, which may span any range of dates.
pub fn summarize(
    records: &[ExpenseRecord],
    month: YearMonth,
    policy: &Policy,
    view: &dyn AmountView,
) -> MonthlySummary {
    let previous = month.previous();

    let mut total = Decimal::ZERO;
    let mut previous_total = Decimal::ZERO;
    let mut expense_count = 0;
    let mut by_category = BTreeMap::new();

    for record in records {
        let record_month = record.month();
        if record_month == month {
            let amount = view.present(record.amount);
            total = add_to_total(total, amount);
            expense_count += 1;
            let category_total = by_category.entry(record.category).or_insert(Decimal::ZERO);
            *category_total = add_to_total(*category_total, amount);
        } else if record_month == previous {
            previous_total = add_to_total(previous_total, view.present(record.amount));
        }
    }

    let total = round_cents(total);
    let previous_month_total = round_cents(previous_total);
    let budget = policy.budget_for_month(month, view);

    MonthlySummary {
        month,
        total,
        previous_month_total,
        change: percent_change(total, previous_month_total),
        expense_count,
        by_category,
        has_budget: budget.is_some(),
        budget_remaining: budget.map(|b| round_cents(b - total)),
        currency: view.currency_code().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::tests::MockFeed;
    use crate::core::currency::Currency;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::sync::Arc;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    fn record(id: &str, date: &str, amount: &str, category: Category) -> ExpenseRecord {
        let created = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        ExpenseRecord {
            id: id.to_string(),
            owner: "alice".to_string(),
            name: id.to_string(),
            amount: d(amount),
            category,
            date: date.parse::<NaiveDate>().unwrap(),
            note: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn policy(budget: &str, from: &str) -> Policy {
        Policy {
            currency: Currency::Eur,
            monthly_budget: d(budget),
            budget_effective_from: ym(from),
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn test_january_with_empty_december() {
        let records = vec![
            record("a", "2026-01-24", "8.75", Category::Dining),
            record("b", "2026-01-21", "86.30", Category::Groceries),
        ];
        let summary = summarize(&records, ym("2026-01"), &policy("3000", "2026-01"), &BaseAmounts);

        assert_eq!(summary.total, d("95.05"));
        assert_eq!(summary.previous_month_total, Decimal::ZERO);
        assert_eq!(summary.change, d("100"));
        assert_eq!(summary.expense_count, 2);
        assert!(summary.has_budget);
        assert_eq!(summary.budget_remaining, Some(d("2904.95")));
        assert_eq!(summary.currency, "EUR");
        assert_eq!(summary.by_category.len(), 2);
        assert_eq!(summary.by_category[&Category::Dining], d("8.75"));
    }

    #[test]
    fn test_previous_month_rolls_year_boundary() {
        let records = vec![
            record("a", "2025-12-31", "30", Category::Bills),
            record("b", "2026-01-01", "40", Category::Bills),
            record("c", "2025-11-30", "999", Category::Bills),
        ];
        let summary = summarize(&records, ym("2026-01"), &policy("100", "2025-01"), &BaseAmounts);
        assert_eq!(summary.previous_month_total, d("30"));
        assert_eq!(summary.total, d("40"));
        // 10 / 30 * 100 = 33.33..
        assert_eq!(summary.change, d("33.3"));
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(d("30"), d("40")), d("-25.0"));
        assert_eq!(percent_change(d("0"), d("40")), d("-100"));
        assert_eq!(percent_change(d("12"), d("0")), d("100"));
        assert_eq!(percent_change(d("0"), d("0")), d("0"));
        // 1 / 6 * 100 = 16.666..
        assert_eq!(percent_change(d("7"), d("6")), d("16.7"));
    }

    #[test]
    fn test_huge_increase_over_tiny_previous_month() {
        let records = vec![
            record("a", "2026-01-10", "1000000000000000000000000000", Category::Bills),
            record("b", "2025-12-10", "0.01", Category::Bills),
        ];
        let summary = summarize(&records, ym("2026-01"), &policy("3000", "2026-01"), &BaseAmounts);
        assert_eq!(summary.total, d("1000000000000000000000000000"));
        assert_eq!(summary.previous_month_total, d("0.01"));
        assert_eq!(summary.change, Decimal::MAX);
        assert_eq!(percent_change(d("0.01"), d("0.02")), d("-50.0"));
    }

    #[test]
    fn test_total_beyond_decimal_range_holds_at_max() {
        let records = vec![
            record("a", "2026-01-10", "50000000000000000000000000000", Category::Other),
            record("b", "2026-01-11", "50000000000000000000000000000", Category::Other),
        ];
        let summary = summarize(&records, ym("2026-01"), &policy("3000", "2026-01"), &BaseAmounts);
        assert_eq!(summary.total, Decimal::MAX);
        assert_eq!(summary.by_category[&Category::Other], Decimal::MAX);
        assert_eq!(summary.expense_count, 2);
        assert_eq!(summary.change, d("100"));
        assert!(summary.budget_remaining.unwrap() < Decimal::ZERO);
    }

    #[test]
    fn test_empty_month() {
        let summary = summarize(&[], ym("2026-02"), &policy("3000", "2026-01"), &BaseAmounts);
        assert_eq!(summary.total, Decimal::ZERO);
        assert_eq!(summary.change, Decimal::ZERO);
        assert_eq!(summary.expense_count, 0);
        assert!(summary.by_category.is_empty());
        assert_eq!(summary.budget_remaining, Some(d("3000")));
    }

    #[test]
    fn test_month_before_effective_has_no_budget() {
        let records = vec![record("a", "2026-02-10", "50", Category::Health)];
        let summary = summarize(&records, ym("2026-02"), &policy("2000", "2026-03"), &BaseAmounts);
        assert!(!summary.has_budget);
        assert_eq!(summary.budget_remaining, None);

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["budgetRemaining"].is_null());
        assert_eq!(json["byCategory"]["health"], 50.0);
        assert_eq!(json["month"], "2026-02");
    }

    #[test]
    fn test_overspent_budget_goes_negative() {
        let records = vec![record("a", "2026-01-05", "120.50", Category::Other)];
        let summary = summarize(&records, ym("2026-01"), &policy("100", "2026-01"), &BaseAmounts);
        assert_eq!(summary.budget_remaining, Some(d("-20.50")));
    }

    #[test]
    fn test_by_category_sums_to_total_in_display_currency() {
        let mut converter =
            CurrencyConverter::new(Arc::new(MockFeed::failing()), Arc::new(MockFeed::failing()));
        converter.set_display_currency("GBP");

        let records = vec![
            record("a", "2026-01-01", "3.33", Category::Dining),
            record("b", "2026-01-02", "7.77", Category::Dining),
            record("c", "2026-01-03", "1.01", Category::Transport),
            record("d", "2026-01-04", "19.99", Category::Groceries),
        ];
        let summary = summarize(&records, ym("2026-01"), &policy("3000", "2026-01"), &converter);

        let category_sum: Decimal = summary.by_category.values().copied().sum();
        assert_eq!(category_sum, summary.total);
        assert_eq!(summary.currency, "GBP");
        assert_eq!(summary.budget_remaining, Some(d("2580.00") - summary.total));
    }

    #[test]
    fn test_display_summary_converts_amounts_and_budget() {
        let mut converter =
            CurrencyConverter::new(Arc::new(MockFeed::failing()), Arc::new(MockFeed::failing()));
        converter.set_display_currency("USD");

        let records = vec![record("a", "2026-01-10", "100", Category::Bills)];
        let summary = summarize(&records, ym("2026-01"), &policy("3000", "2026-01"), &converter);
        assert_eq!(summary.total, d("108.00"));
        assert_eq!(summary.budget_remaining, Some(d("3132.00")));
    }

    #[test]
    fn test_summarize_is_idempotent() {
        let records = vec![
            record("a", "2026-01-24", "8.75", Category::Dining),
            record("b", "2025-12-21", "86.30", Category::Groceries),
        ];
        let policy = policy("3000", "2025-06");
        let first = summarize(&records, ym("2026-01"), &policy, &BaseAmounts);
        let second = summarize(&records, ym("2026-01"), &policy, &BaseAmounts);
        assert_eq!(first, second);
    }
}
