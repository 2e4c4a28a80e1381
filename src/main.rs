use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing::{error, info};

use courier_api as api;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = api::config::load_config()?;
    let (_log_guard, db_sink) = api::logging::init(&api::logging::LoggingConfig::from(&cfg));

    let db_pool = api::db::establish_connection_from_app_config(&cfg).await?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db_pool).await.map_err(|e| {
            error!("Failed running migrations: {}", e);
            e
        })?;
    }

    let db = Arc::new(db_pool);

    // Start the database log sink worker; events recorded so far flush now.
    let log_writer = db_sink.map(|rx| api::logging::spawn_db_writer(rx, db.clone()));

    let state = api::AppState {
        db: db.clone(),
        config: cfg.clone(),
    };
    let app = api::build_router(state);

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port).parse()?;
    info!("courier-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // The sink layer outlives the runtime, so the writer is stopped rather
    // than waited on; the pool closes once the last clone is released.
    if let Some(handle) = log_writer {
        handle.abort();
        let _ = handle.await;
    }
    match Arc::try_unwrap(db) {
        Ok(pool) => api::db::close_pool(pool).await?,
        Err(db) => error!(
            "Database pool still shared at shutdown ({} handles)",
            Arc::strong_count(&db)
        ),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
