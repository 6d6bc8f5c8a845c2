pub mod budget;
pub mod cli;
pub mod conversion;
pub mod core;
pub mod error;
pub mod mirror;
pub mod providers;
pub mod records;
pub mod service;
pub mod session;
pub mod settings;
pub mod store;
pub mod summary;

use anyhow::Result;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::config::AppConfig;
use crate::core::currency::Currency;
use crate::core::expense::{Category, ExpenseChanges, NewExpense};
use crate::core::month::YearMonth;
use crate::providers::{FrankfurterFeed, OpenErApiFeed};
use crate::records::{CollectionRecordStore, RecordStore};
use crate::session::{Session, SessionDeps};
use crate::settings::{CollectionSettingsStore, SettingsStore};
use crate::store::{EXPENSES_COLLECTION, KeyValueStore, RATES_COLLECTION, SETTINGS_COLLECTION};

pub enum AppCommand {
    Add(NewExpense),
    List {
        month: Option<YearMonth>,
        category: Option<Category>,
    },
    Edit {
        id: String,
        changes: ExpenseChanges,
    },
    Delete {
        id: String,
    },
    Summary {
        month: Option<YearMonth>,
        base: bool,
    },
    Budget {
        amount: Option<Decimal>,
        currency: Option<Currency>,
    },
    Rates {
        refresh: bool,
    },
    Export {
        output: Option<PathBuf>,
    },
}

/// Wires the configured stores and rate feeds together.
pub fn open_backends(config: &AppConfig) -> Result<SessionDeps> {
    let data_path = config.default_data_path()?;
    let store = KeyValueStore::open(&data_path)?;
    debug!("Using data directory {}", data_path.display());

    let records: Arc<dyn RecordStore> = Arc::new(CollectionRecordStore::new(
        store.collection(EXPENSES_COLLECTION)?,
    ));
    let settings: Arc<dyn SettingsStore> = Arc::new(CollectionSettingsStore::new(
        store.collection(SETTINGS_COLLECTION)?,
    ));
    let primary = Arc::new(FrankfurterFeed::new(config.primary_feed_url())?);
    let fallback = Arc::new(OpenErApiFeed::new(
        config.fallback_feed_url(),
        config.fallback_anchor(),
    )?);

    Ok(SessionDeps {
        records,
        settings,
        primary,
        fallback,
        rate_cache: Some(store.collection(RATES_COLLECTION)?),
    })
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Outlay starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let deps = open_backends(&config)?;
    let owner = config.owner.as_str();

    // Store-side commands run without a session, so without rate refreshes
    match command {
        AppCommand::Summary { month, base: true } => {
            let month = month.unwrap_or_else(YearMonth::current);
            return cli::summary::run_base(
                owner,
                month,
                deps.records.as_ref(),
                deps.settings.as_ref(),
            )
            .await;
        }
        AppCommand::Export { output } => {
            return cli::export::run(
                owner,
                output.as_deref(),
                deps.records.as_ref(),
                deps.settings.as_ref(),
            )
            .await;
        }
        _ => {}
    }

    let pb = cli::ui::new_spinner("Loading expenses...");
    let session = Session::open(owner, &deps).await;
    pb.finish_and_clear();
    let mut session = session?;

    let result = match command {
        AppCommand::Add(expense) => cli::expenses::add(&mut session, expense).await,
        AppCommand::List { month, category } => cli::expenses::list(&session, month, category),
        AppCommand::Edit { id, changes } => cli::expenses::edit(&mut session, &id, changes).await,
        AppCommand::Delete { id } => cli::expenses::delete(&mut session, &id).await,
        AppCommand::Summary { month, .. } => {
            cli::summary::run(&session, month.unwrap_or_else(YearMonth::current))
        }
        AppCommand::Budget { amount, currency } => {
            cli::budget::run(&mut session, amount, currency).await
        }
        AppCommand::Rates { refresh } => cli::rates::run(&mut session, refresh).await,
        AppCommand::Export { .. } => Ok(()),
    };

    session.close();
    result
}
