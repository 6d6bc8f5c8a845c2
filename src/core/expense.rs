use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use crate::core::money::checked_amount;
use crate::core::month::YearMonth;
use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Dining,
    Transport,
    Groceries,
    Bills,
    Health,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Dining,
        Category::Transport,
        Category::Groceries,
        Category::Bills,
        Category::Health,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Dining => "dining",
            Category::Transport => "transport",
            Category::Groceries => "groceries",
            Category::Bills => "bills",
            Category::Health => "health",
            Category::Other => "other",
        }
    }

    /// Returns display name and emoji for the category
    pub fn display_info(&self) -> (&'static str, &'static str) {
        match self {
            Category::Dining => ("Dining", "🍽️"),
            Category::Transport => ("Transport", "🚕"),
            Category::Groceries => ("Groceries", "🛒"),
            Category::Bills => ("Bills", "🧾"),
            Category::Health => ("Health", "💊"),
            Category::Other => ("Other", "📦"),
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EngineError::validation(format!("Unknown category: {s}")))
    }
}

/// A single spending entry. Amounts are always in the base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    pub id: String,
    pub owner: String,
    pub name: String,
    pub amount: Decimal,
    pub category: Category,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExpenseRecord {
    pub fn month(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }
}

/// Fields supplied when recording a new expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub name: String,
    pub amount: Decimal,
    pub category: Category,
    pub date: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
}

impl NewExpense {
    /// Trims text fields and rounds the amount to cents.
    pub fn normalize(self) -> Result<Self> {
        Ok(Self {
            name: normalize_name(&self.name)?,
            amount: normalize_amount(self.amount)?,
            category: self.category,
            date: self.date,
            note: normalize_note(self.note.as_deref()),
        })
    }
}

/// A partial update. `id` and `owner` are deliberately absent.
///
/// `note: Some("")` clears the note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseChanges {
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    pub category: Option<Category>,
    pub date: Option<NaiveDate>,
    pub note: Option<String>,
}

impl ExpenseChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.amount.is_none()
            && self.category.is_none()
            && self.date.is_none()
            && self.note.is_none()
    }

    pub fn normalize(self) -> Result<Self> {
        Ok(Self {
            name: self.name.as_deref().map(normalize_name).transpose()?,
            amount: self.amount.map(normalize_amount).transpose()?,
            category: self.category,
            date: self.date,
            note: self
                .note
                .map(|n| normalize_note(Some(&n)).unwrap_or_default()),
        })
    }

    /// Applies already normalized changes to `record`.
    pub fn apply_to(&self, record: &mut ExpenseRecord) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        if let Some(amount) = self.amount {
            record.amount = amount;
        }
        if let Some(category) = self.category {
            record.category = category;
        }
        if let Some(date) = self.date {
            record.date = date;
        }
        if let Some(note) = &self.note {
            record.note = if note.is_empty() {
                None
            } else {
                Some(note.clone())
            };
        }
    }
}

fn normalize_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(EngineError::validation("Expense name is required"));
    }
    Ok(name.to_string())
}

fn normalize_amount(amount: Decimal) -> Result<Decimal> {
    checked_amount(amount, "Expense amount")
}

fn normalize_note(note: Option<&str>) -> Option<String> {
    note.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}
