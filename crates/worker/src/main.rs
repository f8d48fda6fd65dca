//! `jobrelay-worker` -- executes queued jobs.
//!
//! Start as many of these processes as needed; they share the broker queue
//! and never contend for the same message.

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jobrelay_core::jobs::JobRegistry;
use jobrelay_db::DbConfig;
use jobrelay_queue::{BrokerConfig, PgBroker};
use jobrelay_worker::{Worker, WorkerConfig, WorkerPool};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "jobrelay_worker=debug,jobrelay_core=info,jobrelay_queue=info".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // --- Configuration ---
    let db_config = DbConfig::from_env().expect("Invalid job store configuration");
    let broker_config = BrokerConfig::from_env().expect("Invalid broker configuration");
    let worker_config = WorkerConfig::from_env().expect("Invalid worker configuration");
    tracing::info!(
        concurrency = worker_config.concurrency,
        visibility_timeout_secs = worker_config.visibility_timeout.as_secs(),
        delay_scale = worker_config.delay_scale,
        store_host = db_config.connect_options.get_host(),
        broker_shared = broker_config.is_shared(),
        "Loaded worker configuration",
    );

    // --- Job store ---
    let pool = jobrelay_db::connect(db_config.connect_options, db_config.max_connections)
        .await
        .expect("Failed to connect to database");
    jobrelay_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    jobrelay_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Job store ready");

    // --- Broker ---
    let broker_pool = broker_config
        .connect(&pool)
        .await
        .expect("Failed to connect to broker");
    jobrelay_queue::run_migrations(&broker_pool)
        .await
        .expect("Failed to run broker migrations");
    let broker = PgBroker::new(broker_pool).with_visibility_timeout(worker_config.visibility_timeout);
    broker.health_check().await.expect("Broker health check failed");
    tracing::info!("Broker ready");

    // --- Worker pool ---
    let job_registry = JobRegistry::with_delay_scale(worker_config.delay_scale);
    let worker = Worker::new(pool, broker, job_registry);
    let worker_pool = WorkerPool::new(worker, &worker_config);

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_cancel.cancel();
    });

    worker_pool.run(cancel).await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM. In-flight jobs finish before the pool exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), finishing in-flight jobs");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, finishing in-flight jobs");
        }
    }
}
