//! Store-side operations computed in the base currency.
use chrono::{DateTime, Utc};
use futures::try_join;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::budget::Policy;
use crate::core::expense::ExpenseRecord;
use crate::core::month::{DateRange, YearMonth};
use crate::error::{EngineError, Result};
use crate::records::RecordStore;
use crate::settings::SettingsStore;
use crate::summary::{self, BaseAmounts, MonthlySummary};

/// Summary of `month` in the base currency, read straight from the stores.
///
/// Only the requested and previous months are listed. An owner without a
/// stored policy is summarized against the default one, which is not
/// persisted here.
#[instrument(skip(records, settings))]
pub async fn monthly_summary(
    owner: &str,
    month: YearMonth,
    records: &dyn RecordStore,
    settings: &dyn SettingsStore,
) -> Result<MonthlySummary> {
    if owner.trim().is_empty() {
        return Err(EngineError::validation("Owner is required"));
    }

    let range = DateRange {
        start: month.previous().first_day(),
        end: month.next().first_day(),
    };
    let (expenses, policy) = try_join!(records.list(owner, Some(range)), settings.find(owner))?;
    let policy = policy.unwrap_or_else(|| {
        debug!(owner, "No stored policy, summarizing with defaults");
        Policy::default_as_of(Utc::now())
    });

    Ok(summary::summarize(&expenses, month, &policy, &BaseAmounts))
}

/// Everything stored for one owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub owner: String,
    pub settings: Option<Policy>,
    /// Newest date first.
    pub expenses: Vec<ExpenseRecord>,
    pub export_date: DateTime<Utc>,
    pub count: usize,
}

#[instrument(skip(records, settings))]
pub async fn export(
    owner: &str,
    records: &dyn RecordStore,
    settings: &dyn SettingsStore,
) -> Result<ExportBundle> {
    let (expenses, policy) = try_join!(records.list(owner, None), settings.find(owner))?;
    debug!(owner, count = expenses.len(), "Exporting expenses");
    Ok(ExportBundle {
        owner: owner.to_string(),
        settings: policy,
        count: expenses.len(),
        expenses,
        export_date: Utc::now(),
    })
}
