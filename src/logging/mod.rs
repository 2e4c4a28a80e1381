//! Three-sink logging pipeline: console, daily-rolling file, and a database
//! table. The database sink is fire-and-forget with respect to request
//! handling: events are pushed onto an unbounded channel by a
//! `tracing_subscriber` layer and drained into the `logs` table by a worker
//! task spawned once the connection pool exists. Events recorded before the
//! worker starts stay buffered in the channel and are flushed when it starts.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, Set};
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::entities::log_entry;

const LOG_FILE_PREFIX: &str = "courier-api.log";

/// Targets forwarded to the database sink. Restricting the sink to this
/// crate's own events also makes feedback through the sink's sqlx inserts
/// impossible.
const DB_SINK_TARGET_PREFIX: &str = "courier_api";

/// The sink worker logs under this target; excluded so a failing insert can
/// never re-enter the channel it is draining.
const DB_SINK_SELF_TARGET: &str = "courier_api::logging";

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    pub dir: String,
    pub to_db: bool,
}

impl From<&AppConfig> for LoggingConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            level: cfg.log_level.clone(),
            json: cfg.log_json,
            dir: cfg.log_dir.clone(),
            to_db: cfg.log_to_db,
        }
    }
}

/// One log event, decoupled from the subscriber so it can cross the channel.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: String,
    pub target: String,
    pub message: String,
    pub fields: Option<String>,
    pub raise_date: DateTime<Utc>,
}

/// Keeps the non-blocking file writer alive for the program's lifetime.
pub struct LogGuard {
    _file_guard: WorkerGuard,
}

/// Initializes the global subscriber with console and daily-rolling file
/// sinks, plus the database sink layer when enabled. Returns the receiving
/// half of the sink channel so the caller can start the writer once a pool
/// is available.
pub fn init(cfg: &LoggingConfig) -> (LogGuard, Option<mpsc::UnboundedReceiver<LogRecord>>) {
    let file_appender = tracing_appender::rolling::daily(&cfg.dir, LOG_FILE_PREFIX);
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);

    let default_directive = format!("{}={},tower_http=info", DB_SINK_TARGET_PREFIX, cfg.level);
    let filter_directive = std::env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let (db_layer, db_sink) = if cfg.to_db {
        let (tx, rx) = mpsc::unbounded_channel();
        (Some(DbSinkLayer::new(tx)), Some(rx))
    } else {
        (None, None)
    };

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false);

    let registry = tracing_subscriber::registry()
        .with(EnvFilter::new(filter_directive))
        .with(file_layer)
        .with(db_layer);

    if cfg.json {
        let _ = registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init();
    } else {
        let _ = registry.with(tracing_subscriber::fmt::layer()).try_init();
    }

    (
        LogGuard {
            _file_guard: file_guard,
        },
        db_sink,
    )
}

/// Drains the sink channel into the `logs` table. Insert failures are counted
/// and reported but never surfaced to the request path.
pub fn spawn_db_writer(
    mut rx: mpsc::UnboundedReceiver<LogRecord>,
    db: Arc<DbPool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut failures: u64 = 0;
        while let Some(record) = rx.recv().await {
            let row = log_entry::ActiveModel {
                level: Set(record.level),
                target: Set(record.target),
                message: Set(record.message),
                fields: Set(record.fields),
                raise_date: Set(record.raise_date),
                ..Default::default()
            };
            if row.insert(db.as_ref()).await.is_err() {
                failures = failures.saturating_add(1);
            }
        }
        if failures > 0 {
            tracing::warn!(failures, "database log sink dropped records");
        }
    })
}

/// Subscriber layer that forwards this crate's events to the sink channel.
pub struct DbSinkLayer {
    tx: mpsc::UnboundedSender<LogRecord>,
}

impl DbSinkLayer {
    pub fn new(tx: mpsc::UnboundedSender<LogRecord>) -> Self {
        Self { tx }
    }
}

impl<S: Subscriber> Layer<S> for DbSinkLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let target = event.metadata().target();
        if !target.starts_with(DB_SINK_TARGET_PREFIX) || target.starts_with(DB_SINK_SELF_TARGET) {
            return;
        }

        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);

        let fields = if visitor.fields.is_empty() {
            None
        } else {
            serde_json::to_string(&visitor.fields).ok()
        };

        let record = LogRecord {
            level: event.metadata().level().to_string(),
            target: target.to_string(),
            message: visitor.message.unwrap_or_default(),
            fields,
            raise_date: Utc::now(),
        };

        // Receiver gone means shutdown is in progress; drop the event.
        let _ = self.tx.send(record);
    }
}

/// Collects an event's `message` and remaining fields as JSON values.
#[derive(Default)]
struct JsonVisitor {
    message: Option<String>,
    fields: serde_json::Map<String, serde_json::Value>,
}

impl Visit for JsonVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields
                .insert(field.name().to_string(), value.to_string().into());
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), value.into());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{:?}", value);
        if field.name() == "message" {
            self.message = Some(rendered);
        } else {
            self.fields.insert(field.name().to_string(), rendered.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, DbConfig};
    use sea_orm::EntityTrait;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn layer_forwards_crate_events_with_fields() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscriber = tracing_subscriber::registry().with(DbSinkLayer::new(tx));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(
                target: "courier_api::handlers::orders",
                order_id = 7,
                district_id = 2,
                "order created"
            );
        });

        let record = rx.try_recv().expect("event should be forwarded");
        assert_eq!(record.level, "INFO");
        assert_eq!(record.target, "courier_api::handlers::orders");
        assert_eq!(record.message, "order created");

        let fields: serde_json::Value =
            serde_json::from_str(record.fields.as_deref().expect("fields present")).unwrap();
        assert_eq!(fields["order_id"], 7);
        assert_eq!(fields["district_id"], 2);
    }

    #[test]
    fn layer_ignores_foreign_and_own_targets() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscriber = tracing_subscriber::registry().with(DbSinkLayer::new(tx));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "sqlx::query", "SELECT 1");
            tracing::warn!(target: "courier_api::logging", "sink trouble");
        });

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn writer_persists_records_to_logs_table() {
        let cfg = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&cfg)
            .await
            .expect("connect");
        db::run_migrations(&pool).await.expect("migrate");
        let pool = Arc::new(pool);

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = spawn_db_writer(rx, pool.clone());

        tx.send(LogRecord {
            level: "INFO".into(),
            target: "courier_api::handlers::orders".into(),
            message: "order created".into(),
            fields: Some(r#"{"order_id":1}"#.into()),
            raise_date: Utc::now(),
        })
        .expect("send record");
        drop(tx);
        handle.await.expect("writer finishes");

        let rows = log_entry::Entity::find()
            .all(pool.as_ref())
            .await
            .expect("query logs");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].message, "order created");
        assert_eq!(rows[0].level, "INFO");
    }
}
