//! Composition root: reads configuration, wires the stores, the task
//! service, the two worker pools, and the HTTP server together, then runs
//! until killed.
//!
//! Any failure before the HTTP server starts accepting connections is
//! fatal — there is no degraded-mode startup, matching the original
//! coordinator's `e.Logger.Fatal` behavior on init errors.

mod config;

use std::sync::Arc;

use ocr_core::{OcrAdapter, TaskService};
use ocr_http::{server, AppState, ServerConfig};
use ocr_store::{run_migrations, PostgresImageStore, PostgresTaskStore};
use ocr_workers::{deleter_worker, ocr_worker, Notifier, WorkerPool};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use config::Config;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "fatal: invalid configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(profile = ?cfg.profile, database_url = %config::mask_db_url(&cfg.database_url), "starting");

    let pool = match PgPoolOptions::new()
        .max_connections(cfg.ocr_pool_size as u32 + cfg.deleter_pool_size as u32 + 4)
        .connect(&cfg.database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "fatal: could not connect to database");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_migrations(&pool).await {
        tracing::error!(error = %e, "fatal: could not run migrations");
        std::process::exit(1);
    }

    let tasks = PostgresTaskStore::new(pool.clone());
    let images = PostgresImageStore::new(pool.clone());

    let task_service = Arc::new(TaskService::new(tasks.clone(), images.clone()));

    let (ocr_notifier, ocr_rx) = Notifier::channel(cfg.channel_capacity);
    let (deletion_notifier, deletion_rx) = Notifier::channel(cfg.channel_capacity);

    let ocr_tasks = tasks.clone();
    let ocr_images = images.clone();
    let ocr_adapter_for_pool = OcrAdapter::new();
    let _ocr_pool = WorkerPool::spawn(cfg.ocr_pool_size, ocr_rx, move || {
        let tasks = ocr_tasks.clone();
        let images = ocr_images.clone();
        let ocr_adapter = ocr_adapter_for_pool;
        async move {
            if let Err(e) = ocr_worker::run_once(&tasks, &images, &ocr_adapter).await {
                tracing::warn!(error = %e, "OCR worker run failed");
            }
        }
    });

    let deleter_tasks = tasks.clone();
    let deleter_images = images.clone();
    let _deleter_pool = WorkerPool::spawn(cfg.deleter_pool_size, deletion_rx, move || {
        let tasks = deleter_tasks.clone();
        let images = deleter_images.clone();
        async move {
            if let Err(e) = deleter_worker::run_once(&tasks, &images).await {
                tracing::warn!(error = %e, "deleter worker run failed");
            }
        }
    });

    let state = Arc::new(AppState {
        task_service,
        ocr_adapter: OcrAdapter::new(),
        ocr_notifier,
        deletion_notifier,
    });

    let server_config = ServerConfig::with_port(cfg.bind_addr.port());
    if let Err(e) = server::run(server_config, state).await {
        tracing::error!(error = %e, "fatal: HTTP server exited");
        std::process::exit(1);
    }
}
