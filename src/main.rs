use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod domain;
mod event_sourcing;
mod metrics;
mod projection;
mod utils;

use api::AppState;
use config::Config;
use domain::account::{AccountCommand, AccountCommandHandler, AccountNumber};
use event_sourcing::{EventBus, EventStore};
use projection::BalanceProjection;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,bank_ledger=debug")),
        )
        .init();

    tracing::info!("🚀 Starting event-sourced account ledger");

    let config = Config::from_env();
    tracing::info!(
        http_addr = %config.http_addr,
        metrics_port = config.metrics_port,
        min_transaction_amount = config.policy.min_transaction_amount,
        allow_overdraft = config.policy.allow_overdraft,
        "Configuration loaded"
    );

    // === 1. Metrics registry ===
    let metrics = Arc::new(metrics::Metrics::new()?);

    // === 2. Write side: bus → store → command handler ===
    let bus = Arc::new(EventBus::new(metrics.clone()));

    // === 3. Read side: balance projection fed by the bus ===
    let balance_projection = Arc::new(BalanceProjection::new(metrics.clone()));
    bus.register(balance_projection.clone());

    let event_store = Arc::new(EventStore::new(bus));
    let command_handler = Arc::new(AccountCommandHandler::new(
        event_store,
        config.policy.clone(),
        metrics.clone(),
    ));

    // === 4. Metrics HTTP server in a background thread ===
    let metrics_registry = Arc::new(metrics.registry().clone());
    let metrics_port = config.metrics_port;
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().expect("metrics runtime");
        rt.block_on(async {
            if let Err(e) = metrics::start_metrics_server(metrics_registry, metrics_port).await {
                tracing::error!("Metrics server error: {}", e);
            }
        });
    });

    // === 5. Optional demo data ===
    if config.seed_demo {
        seed_demo_account(&command_handler).await;
    }

    // === 6. Serve the API until shutdown ===
    let state = AppState {
        commands: command_handler,
        queries: balance_projection,
    };
    api::start_api_server(state, &config.http_addr).await?;

    Ok(())
}

/// Seed the demo account: one creation and three deposits.
async fn seed_demo_account(handler: &AccountCommandHandler) {
    let demo = AccountNumber::new("BE00 0000 0000 0001");

    let commands = [
        AccountCommand::OpenAccount {
            account_number: demo.clone(),
            name: "Jan Van Rensbergen".to_string(),
            balance: 10_000,
        },
        AccountCommand::Deposit {
            account_number: demo.clone(),
            amount: 10_000,
        },
        AccountCommand::Deposit {
            account_number: demo.clone(),
            amount: 20_000,
        },
        AccountCommand::Deposit {
            account_number: demo,
            amount: 30_000,
        },
    ];

    for command in commands {
        match handler.handle(command).await {
            Ok(account) => tracing::info!(
                account_number = %account.account_number(),
                holder = account.name(),
                balance = account.balance(),
                "✅ Seeded demo command"
            ),
            Err(error) => tracing::warn!(error = %error, "Demo seeding command failed"),
        }
    }
}
