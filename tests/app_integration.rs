use outlay::AppCommand;
use outlay::core::config::AppConfig;
use outlay::core::currency::Currency;
use outlay::core::expense::{Category, NewExpense};
use outlay::session::Session;
use rust_decimal::Decimal;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_primary_mock_server(status: u16, expected_calls: u64) -> MockServer {
        let mock_server = MockServer::start().await;
        let body = r#"{"amount":1.0,"base":"EUR","date":"2026-01-23","rates":{"GBP":0.85,"JPY":160.0,"USD":1.1}}"#;

        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("from", "EUR"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(expected_calls)
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub async fn create_fallback_mock_server(expected_calls: u64) -> MockServer {
        let mock_server = MockServer::start().await;
        let body = r#"{"result":"success","base_code":"USD","rates":{"USD":1,"EUR":0.92,"GBP":0.79,"JPY":149.5}}"#;

        Mock::given(method("GET"))
            .and(path("/v6/latest/USD"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(expected_calls)
            .mount(&mock_server)
            .await;

        mock_server
    }
}

fn write_config(dir: &Path, owner: &str, primary_uri: &str, fallback_uri: &str) -> String {
    let config_path = dir.join(format!("{owner}.yaml"));
    let data_path = dir.join("data");
    let config_content = format!(
        r#"
owner: "{owner}"
data_path: "{}"
providers:
  primary:
    base_url: "{primary_uri}"
  fallback:
    base_url: "{fallback_uri}"
    anchor: "USD"
"#,
        data_path.display()
    );
    fs::write(&config_path, config_content).expect("Failed to write config file");
    config_path.to_string_lossy().into_owned()
}

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn expense(name: &str, amount: &str, category: Category, date: &str) -> NewExpense {
    NewExpense {
        name: name.to_string(),
        amount: d(amount),
        category,
        date: date.parse().unwrap(),
        note: None,
    }
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_mock() {
    let temp_dir = TempDir::new().unwrap();
    // Rates are cached after the first session, later commands reuse them
    let primary = test_utils::create_primary_mock_server(200, 1).await;
    let fallback = test_utils::create_fallback_mock_server(0).await;
    let config_path = write_config(temp_dir.path(), "alice", &primary.uri(), &fallback.uri());

    for command in [
        AppCommand::Add(expense("Starbucks", "8.75", Category::Dining, "2026-01-24")),
        AppCommand::Add(expense("Whole Foods", "86.30", Category::Groceries, "2026-01-21")),
        AppCommand::Summary {
            month: Some("2026-01".parse().unwrap()),
            base: false,
        },
        AppCommand::Summary {
            month: Some("2026-01".parse().unwrap()),
            base: true,
        },
        AppCommand::List {
            month: None,
            category: None,
        },
        AppCommand::List {
            month: Some("2026-01".parse().unwrap()),
            category: Some(Category::Dining),
        },
        AppCommand::Budget {
            amount: None,
            currency: Some(Currency::Usd),
        },
        AppCommand::Rates { refresh: false },
    ] {
        let result = outlay::run_command(command, Some(&config_path)).await;
        assert!(result.is_ok(), "Command failed with: {:?}", result.err());
    }

    let export_path = temp_dir.path().join("export.json");
    outlay::run_command(
        AppCommand::Export {
            output: Some(export_path.clone()),
        },
        Some(&config_path),
    )
    .await
    .unwrap();

    let exported: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&export_path).unwrap()).unwrap();
    info!(?exported, "Export written");
    assert_eq!(exported["owner"], "alice");
    assert_eq!(exported["count"], 2);
    assert_eq!(exported["settings"]["currency"], "USD");
    assert_eq!(exported["settings"]["monthlyBudget"], 3000.0);
    assert_eq!(exported["expenses"][0]["name"], "Starbucks");
    assert_eq!(exported["expenses"][1]["category"], "groceries");
}

#[test_log::test(tokio::test)]
async fn test_rates_fall_back_when_primary_fails() {
    let temp_dir = TempDir::new().unwrap();
    let primary = test_utils::create_primary_mock_server(500, 1).await;
    let fallback = test_utils::create_fallback_mock_server(1).await;
    let config_path = write_config(temp_dir.path(), "alice", &primary.uri(), &fallback.uri());

    let config = AppConfig::load_from_path(&config_path).unwrap();
    let deps = outlay::open_backends(&config).unwrap();
    let session = Session::open("alice", &deps).await.unwrap();

    let table = session.converter().table();
    assert!(!session.converter().has_error());
    assert_eq!(table.rate("EUR"), Some(Decimal::ONE));
    assert_eq!(table.rate("USD"), Some(Decimal::ONE / d("0.92")));
    assert_eq!(table.rate("GBP"), Some(d("0.79") / d("0.92")));
    assert!(table.last_updated().is_some());
}

#[test_log::test(tokio::test)]
async fn test_owners_do_not_share_state() {
    let temp_dir = TempDir::new().unwrap();
    let primary = test_utils::create_primary_mock_server(200, 1).await;
    let fallback = test_utils::create_fallback_mock_server(0).await;
    let alice_config = write_config(temp_dir.path(), "alice", &primary.uri(), &fallback.uri());
    let bob_config = write_config(temp_dir.path(), "bob", &primary.uri(), &fallback.uri());

    let config = AppConfig::load_from_path(&alice_config).unwrap();
    let deps = outlay::open_backends(&config).unwrap();

    let mut alice = Session::open("alice", &deps).await.unwrap();
    alice
        .mirror_mut()
        .add(expense("Rent", "900", Category::Bills, "2026-01-01"))
        .await
        .unwrap();
    let update = outlay::budget::PolicyUpdate::new(d("1200"), Currency::Gbp).unwrap();
    alice.update_settings(update).await.unwrap();
    alice.close();

    let bob = Session::open("bob", &deps).await.unwrap();
    assert!(bob.mirror().records().is_empty());
    assert_eq!(bob.policy().currency, Currency::Eur);
    assert_eq!(bob.policy().monthly_budget, d("3000"));
    assert_eq!(bob.converter().display_currency(), "EUR");
    // Exchange rates are not user scoped
    assert_eq!(bob.converter().table().rate("USD"), Some(d("1.1")));
    bob.close();
    drop(deps);

    let export_path = temp_dir.path().join("bob.json");
    outlay::run_command(
        AppCommand::Export {
            output: Some(export_path.clone()),
        },
        Some(&bob_config),
    )
    .await
    .unwrap();
    let exported: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&export_path).unwrap()).unwrap();
    assert_eq!(exported["owner"], "bob");
    assert_eq!(exported["count"], 0);
    assert_eq!(exported["settings"]["currency"], "EUR");
}
