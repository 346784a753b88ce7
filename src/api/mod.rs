use std::sync::Arc;

use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use serde::Deserialize;

use crate::domain::account::{AccountCommand, AccountCommandHandler, AccountNumber, CommandError};
use crate::projection::{BalanceProjection, Query};

// ============================================================================
// HTTP Adapter
// ============================================================================
//
// Thin translation layer over the command handler and the query side; no
// business logic lives here. Domain rejections map to 400, infrastructure
// failures to 500.
//
// Routes:
//   GET  /health
//   GET  /{account_number}
//   PUT  /{account_number}                      body: { "name"?, "balance"? }
//   PUT  /{account_number}/deposit/{amount}
//   PUT  /{account_number}/withdraw/{amount}
//
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub commands: Arc<AccountCommandHandler>,
    pub queries: Arc<BalanceProjection>,
}

/// Body of the open-account request. The defaults are adapter concerns,
/// applied here at the boundary and nowhere in the core.
#[derive(Debug, Deserialize)]
struct OpenAccountBody {
    name: Option<String>,
    balance: Option<i64>,
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/{account_number}", web::get().to(account_balance))
        .route("/{account_number}", web::put().to(open_account))
        .route(
            "/{account_number}/deposit/{amount}",
            web::put().to(deposit),
        )
        .route(
            "/{account_number}/withdraw/{amount}",
            web::put().to(withdraw),
        );
}

/// Run the API server until shutdown.
pub async fn start_api_server(state: AppState, addr: &str) -> std::io::Result<()> {
    tracing::info!("🚀 Starting API server on http://{}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(routes)
    })
    .bind(addr)?
    .run()
    .await
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "bank-ledger",
    }))
}

async fn account_balance(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let query = Query::AccountBalance {
        account_number: AccountNumber::new(path.into_inner()),
    };
    HttpResponse::Ok().json(state.queries.handle(&query))
}

async fn open_account(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: Option<web::Json<OpenAccountBody>>,
) -> impl Responder {
    let (name, balance) = match body {
        Some(body) => {
            let body = body.into_inner();
            (
                body.name.unwrap_or_else(|| "Jos".to_string()),
                body.balance.unwrap_or(0),
            )
        }
        None => ("Jos".to_string(), 0),
    };

    let command = AccountCommand::OpenAccount {
        account_number: AccountNumber::new(path.into_inner()),
        name,
        balance,
    };
    respond(state.commands.handle(command).await)
}

async fn deposit(state: web::Data<AppState>, path: web::Path<(String, i64)>) -> impl Responder {
    let (account_number, amount) = path.into_inner();
    let command = AccountCommand::Deposit {
        account_number: AccountNumber::new(account_number),
        amount,
    };
    respond(state.commands.handle(command).await)
}

async fn withdraw(state: web::Data<AppState>, path: web::Path<(String, i64)>) -> impl Responder {
    let (account_number, amount) = path.into_inner();
    let command = AccountCommand::Withdraw {
        account_number: AccountNumber::new(account_number),
        amount,
    };
    respond(state.commands.handle(command).await)
}

fn respond(
    result: Result<crate::domain::account::AccountAggregate, CommandError>,
) -> HttpResponse {
    match result {
        Ok(account) => HttpResponse::Ok().json(serde_json::json!({
            "account": account.account_number().as_str(),
            "balance": account.balance(),
        })),
        Err(CommandError::Rejected(rejection)) => HttpResponse::BadRequest().json(
            serde_json::json!({ "error": rejection.to_string() }),
        ),
        Err(CommandError::Store(error)) => {
            tracing::error!(error = %error, "Command failed on the store side");
            HttpResponse::InternalServerError().finish()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
