//! End-to-end worker tests: dispatch -> broker -> worker -> job store.
//!
//! Job delays are disabled (`JobRegistry::with_delay_scale(0.0)`) so the
//! tests exercise the state machine without waiting on simulated work.

use std::time::Duration;

use assert_matches::assert_matches;
use jobrelay_core::job_input::{AddNumbers, JobInput, ProcessData, SendEmail};
use jobrelay_core::jobs::{JobError, JobRegistry};
use jobrelay_core::types::JobId;
use jobrelay_db::models::job_record::JobRecord;
use jobrelay_db::models::status::JobStatus;
use jobrelay_db::repositories::JobRecordRepo;
use jobrelay_queue::{Dispatcher, PgBroker};
use jobrelay_worker::{Processed, Worker, WorkerConfig, WorkerError, WorkerPool};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn setup(pool: &PgPool) -> (Dispatcher, Worker) {
    jobrelay_queue::run_migrations(pool).await.unwrap();
    let broker = PgBroker::new(pool.clone());
    let dispatcher = Dispatcher::new(pool.clone(), broker.clone());
    let worker = Worker::new(pool.clone(), broker, JobRegistry::with_delay_scale(0.0));
    (dispatcher, worker)
}

async fn record(pool: &PgPool, job_id: JobId) -> JobRecord {
    JobRecordRepo::find_by_job_id(pool, job_id)
        .await
        .unwrap()
        .expect("record should exist")
}

fn add(x: i64, y: i64) -> JobInput {
    JobInput::AddNumbers(AddNumbers { x, y })
}

// ---------------------------------------------------------------------------
// Success path
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_add_numbers_reaches_success(pool: PgPool) {
    let (dispatcher, worker) = setup(&pool).await;
    let dispatched = dispatcher.dispatch(&add(2, 3)).await.unwrap();

    let processed = worker.process_next().await.unwrap();
    assert_eq!(
        processed,
        Some(Processed::Succeeded {
            job_id: dispatched.job_id,
            result: "5".to_string(),
        })
    );

    let done = record(&pool, dispatched.job_id).await;
    assert_eq!(done.status(), Some(JobStatus::Success));
    assert_eq!(done.result.as_deref(), Some("5"));
    assert!(done.error.is_none());
    assert!(done.started_at.is_some());
    assert!(done.completed_at.is_some());
    assert!(done.duration_seconds.unwrap() >= 0.0);
    assert!(done.started_at <= done.completed_at);

    // Acknowledged: nothing left to claim.
    assert_eq!(dispatcher.broker().depth().await.unwrap(), 0);
    assert!(worker.process_next().await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_add_numbers_for_many_inputs(pool: PgPool) {
    let (dispatcher, worker) = setup(&pool).await;
    let cases = [
        (0, 0),
        (-7, 3),
        (1_000_000, 2_345),
        (i64::MAX - 1, 1),
        (i64::MAX, 1),
        (i64::MIN, -1),
    ];

    let mut ids = Vec::new();
    for (x, y) in cases {
        let job_id = dispatcher.dispatch(&add(x, y)).await.unwrap().job_id;
        ids.push((job_id, i128::from(x) + i128::from(y)));
    }

    while worker.process_next().await.unwrap().is_some() {}

    for (job_id, expected) in ids {
        let done = record(&pool, job_id).await;
        assert_eq!(done.status(), Some(JobStatus::Success));
        assert_eq!(done.result, Some(expected.to_string()));
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_email_and_process_results(pool: PgPool) {
    let (dispatcher, worker) = setup(&pool).await;
    let email = dispatcher
        .dispatch(&JobInput::SendEmail(SendEmail {
            email: "test@example.com".into(),
            subject: "Test Email".into(),
            message: "This is a test message".into(),
        }))
        .await
        .unwrap();
    let process = dispatcher
        .dispatch(&JobInput::ProcessData(ProcessData {
            data: "Sample data".into(),
        }))
        .await
        .unwrap();

    worker.process_next().await.unwrap();
    worker.process_next().await.unwrap();

    assert_eq!(
        record(&pool, email.job_id).await.result.as_deref(),
        Some("Email sent to test@example.com")
    );
    assert_eq!(
        record(&pool, process.job_id).await.result.as_deref(),
        Some("Processed: Sample data")
    );
}

// ---------------------------------------------------------------------------
// Failure path
// ---------------------------------------------------------------------------

/// Queue a message whose payload cannot be decoded into its job's input.
async fn publish_malformed(pool: &PgPool) -> JobId {
    let job_id = Uuid::new_v4();
    JobRecordRepo::create_pending(
        pool,
        job_id,
        jobrelay_core::job_type::JobType::AddNumbers,
        &serde_json::json!({"x": 1, "y": 2}),
    )
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO job_queue (job_id, job_type, payload) VALUES ($1, 'add_numbers', '{\"x\": \"one\"}')",
    )
    .bind(job_id)
    .execute(pool)
    .await
    .unwrap();
    job_id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failure_is_recorded_and_dead_lettered(pool: PgPool) {
    let (dispatcher, worker) = setup(&pool).await;
    let job_id = publish_malformed(&pool).await;

    let err = worker.process_next().await.unwrap_err();
    assert_matches!(
        err,
        WorkerError::JobFailed { job_id: failed_id, source: JobError::InvalidInput(_) }
            if failed_id == job_id
    );

    let failed = record(&pool, job_id).await;
    assert_eq!(failed.status(), Some(JobStatus::Failure));
    assert!(failed.result.is_none());
    assert!(failed
        .error
        .as_deref()
        .unwrap()
        .starts_with("Job input is invalid"));
    assert!(failed.completed_at.is_some());
    assert!(failed.duration_seconds.unwrap() >= 0.0);

    let dead = dispatcher.broker().dead_letters(10).await.unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].job_id, job_id);
    assert_eq!(dead[0].last_error, failed.error);

    // No automatic retry.
    assert!(worker.process_next().await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_malformed_payload_fails_job(pool: PgPool) {
    let (_, worker) = setup(&pool).await;
    let job_id = publish_malformed(&pool).await;

    let err = worker.process_next().await.unwrap_err();
    assert_matches!(err, WorkerError::JobFailed { source: JobError::InvalidInput(_), .. });

    let failed = record(&pool, job_id).await;
    assert_eq!(failed.status(), Some(JobStatus::Failure));
    // The started transition snapshots what the worker actually received.
    assert_eq!(failed.input_data, serde_json::json!({"x": "one"}));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_add_numbers_past_i64_max_succeeds(pool: PgPool) {
    let (dispatcher, worker) = setup(&pool).await;
    let dispatched = dispatcher.dispatch(&add(i64::MAX, 1)).await.unwrap();
    assert_eq!(
        dispatched.message,
        "Task started: Adding 9223372036854775807 + 1"
    );

    let processed = worker.process_next().await.unwrap();
    assert_matches!(processed, Some(Processed::Succeeded { ref result, .. }) if result == "9223372036854775808");

    let done = record(&pool, dispatched.job_id).await;
    assert_eq!(done.status(), Some(JobStatus::Success));
    assert!(done.error.is_none());
    assert!(dispatcher.broker().dead_letters(10).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Redelivery
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_redelivery_after_crash_leaves_record_started(pool: PgPool) {
    jobrelay_queue::run_migrations(&pool).await.unwrap();
    let broker = PgBroker::new(pool.clone()).with_visibility_timeout(Duration::ZERO);
    let dispatcher = Dispatcher::new(pool.clone(), broker.clone());
    let worker = Worker::new(pool.clone(), broker.clone(), JobRegistry::with_delay_scale(0.0));
    let dispatched = dispatcher.dispatch(&add(2, 3)).await.unwrap();

    // Simulate a worker that picked the job up and died before finishing.
    let message = broker.claim().await.unwrap().unwrap();
    JobRecordRepo::mark_started(&pool, dispatched.job_id, &message.payload)
        .await
        .unwrap()
        .unwrap();

    // The message reappears; the surviving worker drops it.
    let processed = worker.process_next().await.unwrap();
    assert_eq!(
        processed,
        Some(Processed::Skipped {
            job_id: dispatched.job_id
        })
    );

    let stuck = record(&pool, dispatched.job_id).await;
    assert_eq!(stuck.status(), Some(JobStatus::Started));
    assert!(stuck.completed_at.is_none());
    assert!(stuck.duration_seconds.is_none());
    assert_eq!(broker.depth().await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_message_without_record_is_dead_lettered(pool: PgPool) {
    let (_, worker) = setup(&pool).await;
    let broker = PgBroker::new(pool.clone());
    let orphan = Uuid::new_v4();
    broker.publish(orphan, &add(1, 1)).await.unwrap();

    let processed = worker.process_next().await.unwrap();
    assert_eq!(processed, Some(Processed::Skipped { job_id: orphan }));

    let dead = broker.dead_letters(10).await.unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].job_id, orphan);
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_pool_drains_queue_and_stops_on_cancel(pool: PgPool) {
    let (dispatcher, worker) = setup(&pool).await;
    let mut ids = Vec::new();
    for i in 0..6 {
        ids.push(dispatcher.dispatch(&add(i, i)).await.unwrap().job_id);
    }

    let config = WorkerConfig {
        concurrency: 3,
        poll_interval: Duration::from_millis(10),
        ..WorkerConfig::default()
    };
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(WorkerPool::new(worker, &config).run(cancel.clone()));

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let done: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM job_records WHERE status_id = $1",
        )
        .bind(JobStatus::Success.id())
        .fetch_one(&pool)
        .await
        .unwrap();
        if done == ids.len() as i64 {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "pool did not drain the queue in time"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("pool should stop after cancel")
        .unwrap();

    for (i, job_id) in ids.into_iter().enumerate() {
        assert_eq!(record(&pool, job_id).await.result, Some((2 * i).to_string()));
    }
}
