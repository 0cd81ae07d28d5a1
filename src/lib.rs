pub mod domain;
pub mod infra;
pub mod subsystems;

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::extract::FromRef;
use domain::{
    DecisionMaker, EventStore,
    addresses::{PgAddressBook, SharedAddressBook},
    cart::{CartRegistry, CartSyncQueue, FileCartStorage},
    create_eventstore_and_decider,
    orders::{OrderRecordWriter, PgOrderRepository},
};
use infra::{DatabaseSettings, RazorpayClient, Settings};
use sqlx::{PgPool, postgres::PgPoolOptions};
use subsystems::{CartSync, WebServer};
use tokio_graceful_shutdown::{IntoSubsystem, SubsystemBuilder, Toplevel};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub settings: Settings,
    pub pool: PgPool,
    pub decider: DecisionMaker,
    pub event_store: EventStore,
    pub carts: CartRegistry,
    pub cart_sync: CartSyncQueue,
    pub orders: OrderRecordWriter,
    pub addresses: SharedAddressBook,
}

pub fn build_subsystems(state: AppState) -> Toplevel {
    let cart_sync = CartSync::new(state.clone());
    let webserver = WebServer::new(state);

    // Setup and execute subsystem tree
    Toplevel::new(async |s| {
        s.start(SubsystemBuilder::new("CartSync", cart_sync.into_subsystem()));
        s.start(SubsystemBuilder::new(
            "Webserver",
            webserver.into_subsystem(),
        ));
    })
}

pub async fn test_server(toplevel: Toplevel, pool: PgPool) -> anyhow::Result<()> {
    let result = toplevel
        .handle_shutdown_requests(Duration::from_millis(2000))
        .await
        .map_err(Into::into);
    pool.close().await;
    result
}

pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    build_subsystems(state)
        .catch_signals()
        .handle_shutdown_requests(Duration::from_millis(2000))
        .await
        .map_err(Into::into)
}

pub fn configure_tracing(settings: &Settings) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(
        settings.application.logs_directory.clone(),
        "boutique_server.log",
    );
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(non_blocking)
        .init();
    _guard
}

pub async fn construct_app_state(settings: Settings) -> Result<AppState, anyhow::Error> {
    let pool = construct_db_pool(&settings.database).await?;
    let (event_store, decider) = create_eventstore_and_decider(&pool).await?;

    let cart_sync = CartSyncQueue::new(settings.cart_sync.queue_capacity);
    let carts = CartRegistry::new(
        Arc::new(FileCartStorage::new(
            settings.application.carts_directory.clone(),
        )),
        cart_sync.clone(),
    )
    .with_idle_timeout(settings.application.cart_session_idle());
    let gateway = RazorpayClient::new(&settings.payments)?;
    let orders = OrderRecordWriter::new(
        Arc::new(PgOrderRepository::new(pool.clone())),
        Arc::new(gateway),
        settings.payments.clone(),
    );
    let addresses: SharedAddressBook = Arc::new(PgAddressBook::new(pool.clone()));

    Ok(AppState {
        settings,
        pool,
        event_store,
        decider,
        carts,
        cart_sync,
        orders,
        addresses,
    })
}

pub async fn construct_db_pool(settings: &DatabaseSettings) -> Result<PgPool, anyhow::Error> {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_with(settings.with_db_name())
        .await
        .context("Failed to connect to Postgres database.\n1. Check database is running.\n2. Check Postgres database settings in configuration file(s).")
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    sqlx::migrate!()
        .run(pool)
        .await
        .context("Failed to apply database migrations.")
}
