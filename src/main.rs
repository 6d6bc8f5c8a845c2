use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::{Args, CommandFactory, Parser, Subcommand};
use outlay::core::currency::Currency;
use outlay::core::expense::{Category, ExpenseChanges, NewExpense};
use outlay::core::log::init_logging;
use outlay::core::month::YearMonth;
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct ExpenseFields {
    /// What the money was spent on
    #[arg(long)]
    name: Option<String>,
    /// Amount in EUR
    #[arg(long)]
    amount: Option<Decimal>,
    /// One of dining, transport, groceries, bills, health, other
    #[arg(long)]
    category: Option<Category>,
    /// Date of the expense, YYYY-MM-DD
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Free-form note, pass an empty string to clear it
    #[arg(long)]
    note: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Record a new expense
    Add {
        /// What the money was spent on
        name: String,
        /// Amount in EUR
        amount: Decimal,
        /// One of dining, transport, groceries, bills, health, other
        #[arg(short = 't', long, default_value = "other")]
        category: Category,
        /// Date of the expense, YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Free-form note
        #[arg(short, long)]
        note: Option<String>,
    },
    /// List recent expenses, or all expenses of a month or category
    List {
        /// Month to list, YYYY-MM
        #[arg(short, long)]
        month: Option<YearMonth>,
        /// Only expenses of this category
        #[arg(short = 't', long)]
        category: Option<Category>,
    },
    /// Change fields of an expense
    Edit {
        id: String,
        #[command(flatten)]
        fields: ExpenseFields,
    },
    /// Delete an expense
    Delete { id: String },
    /// Display the monthly summary
    Summary {
        /// Month to summarize, YYYY-MM (defaults to the current month)
        #[arg(short, long)]
        month: Option<YearMonth>,
        /// Report in EUR without currency conversion
        #[arg(long)]
        base: bool,
    },
    /// Show or change the monthly budget and display currency
    Budget {
        /// Monthly budget in EUR
        #[arg(short, long)]
        amount: Option<Decimal>,
        /// Display currency: EUR, USD, GBP or JPY
        #[arg(long)]
        currency: Option<Currency>,
    },
    /// Show exchange rates
    Rates {
        /// Fetch the latest rates first
        #[arg(short, long)]
        refresh: bool,
    },
    /// Export all expenses and settings as JSON
    Export {
        /// File to write, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl From<Commands> for outlay::AppCommand {
    fn from(cmd: Commands) -> outlay::AppCommand {
        match cmd {
            Commands::Add {
                name,
                amount,
                category,
                date,
                note,
            } => outlay::AppCommand::Add(NewExpense {
                name,
                amount,
                category,
                date: date.unwrap_or_else(|| Utc::now().date_naive()),
                note,
            }),
            Commands::List { month, category } => outlay::AppCommand::List { month, category },
            Commands::Edit { id, fields } => outlay::AppCommand::Edit {
                id,
                changes: ExpenseChanges {
                    name: fields.name,
                    amount: fields.amount,
                    category: fields.category,
                    date: fields.date,
                    note: fields.note,
                },
            },
            Commands::Delete { id } => outlay::AppCommand::Delete { id },
            Commands::Summary { month, base } => outlay::AppCommand::Summary { month, base },
            Commands::Budget { amount, currency } => outlay::AppCommand::Budget { amount, currency },
            Commands::Rates { refresh } => outlay::AppCommand::Rates { refresh },
            Commands::Export { output } => outlay::AppCommand::Export { output },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => outlay::cli::setup::setup_at_path(path),
            None => outlay::cli::setup::setup(),
        },
        Some(cmd) => outlay::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
