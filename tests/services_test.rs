mod helpers;

use std::time::Duration;

use chrono::{TimeZone, Utc};
use helpers::{ManualClock, test_memory};
use spark_embed::application::ports::GpuMemory;
use spark_embed::application::services::job_projection;
use spark_embed::application::services::{BatchSizePolicy, LegacyProgressTracker, StatsTracker};
use spark_embed::domain::{IndexJob, JobId, JobStatus};

fn job_started_at_noon(total: i64, current: i64) -> IndexJob {
    let noon = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
    let mut job = IndexJob::new(
        JobId::from("abcd1234"),
        "alpha".to_string(),
        "inst-1".to_string(),
        total,
        noon,
    );
    job.status = JobStatus::Active;
    job.started_at = Some(noon);
    job.current = current;
    job
}

#[test]
fn given_active_job_when_projecting_then_rate_eta_and_percent_are_derived() {
    let job = job_started_at_noon(200, 50);
    let now = job.started_at.unwrap() + chrono::Duration::seconds(10);

    let view = job_projection::project(&job, now);

    assert_eq!(view.elapsed_seconds, Some(10.0));
    assert_eq!(view.chunks_per_second, Some(5.0));
    assert_eq!(view.eta_seconds, Some(30.0));
    assert_eq!(view.percent, Some(25));
    assert_eq!(view.duration_seconds, None);
}

#[test]
fn given_no_progress_yet_when_projecting_then_eta_is_absent() {
    let job = job_started_at_noon(200, 0);
    let now = job.started_at.unwrap() + chrono::Duration::seconds(4);

    let view = job_projection::project(&job, now);

    assert_eq!(view.chunks_per_second, Some(0.0));
    assert_eq!(view.eta_seconds, None);
    assert_eq!(view.percent, Some(0));
}

#[test]
fn given_zero_total_when_projecting_then_percent_is_absent() {
    let job = job_started_at_noon(0, 0);

    let view = job_projection::project(&job, job.started_at.unwrap());

    assert_eq!(view.percent, None);
    assert_eq!(view.elapsed_seconds, Some(0.0));
    assert_eq!(view.chunks_per_second, None);
}

#[test]
fn given_queued_job_when_serializing_view_then_optional_metrics_are_omitted() {
    let created = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
    let job = IndexJob::new(
        JobId::from("abcd1234"),
        "alpha".to_string(),
        "inst-1".to_string(),
        10,
        created,
    );

    let json = serde_json::to_value(job_projection::project(&job, created)).unwrap();

    assert_eq!(json["id"], "abcd1234");
    assert_eq!(json["status"], "queued");
    assert_eq!(json["created_at"], created.timestamp() as f64);
    assert!(json.get("started_at").is_none());
    assert!(json.get("elapsed_seconds").is_none());
    assert!(json.get("error").is_none());
    assert_eq!(json["percent"], 0);
}

#[test]
fn given_extreme_counters_when_computing_percent_then_result_is_clamped() {
    assert_eq!(job_projection::percent_of(i64::MAX, 1), i64::MAX);
    assert_eq!(job_projection::percent_of(i64::MIN, 1), i64::MIN);
    assert_eq!(job_projection::percent_of(i64::MAX / 10, 100), i64::MAX / 10);
    assert_eq!(job_projection::percent_of(-1, 3), -34);
    assert_eq!(job_projection::percent_of(2, 3), 66);
}

#[test]
fn given_extreme_progress_when_projecting_then_remaining_saturates() {
    let job = job_started_at_noon(100, i64::MIN);

    assert_eq!(job.remaining_chunks(), i64::MAX);
    let view = job_projection::project(&job, job.started_at.unwrap());
    assert_eq!(view.percent, Some(i64::MIN));
}

#[test]
fn given_fresh_tracker_when_snapshotting_then_counters_are_zero() {
    let stats = StatsTracker::new();

    let snapshot = stats.snapshot();

    assert_eq!(snapshot.requests, 0);
    assert_eq!(snapshot.avg_latency_ms, 0.0);
    assert_eq!(snapshot.texts_per_second, 0.0);
    assert_eq!(snapshot.queue_depth, 0);
}

#[test]
fn given_recorded_requests_when_snapshotting_then_average_latency_is_derived() {
    let stats = StatsTracker::new();
    stats.record_success(4, Duration::from_millis(10));
    stats.record_success(6, Duration::from_millis(30));
    stats.record_error();

    let snapshot = stats.snapshot();

    assert_eq!(snapshot.requests, 2);
    assert_eq!(snapshot.texts_embedded, 10);
    assert_eq!(snapshot.errors, 1);
    assert_eq!(snapshot.avg_latency_ms, 20.0);
}

#[test]
fn given_queue_slot_when_dropped_then_depth_returns_to_zero() {
    let stats = StatsTracker::new();

    let first = stats.enter_queue();
    let second = stats.enter_queue();
    assert_eq!(first.depth_on_entry(), 1);
    assert_eq!(second.depth_on_entry(), 2);
    assert_eq!(stats.queue_depth(), 2);

    drop(first);
    drop(second);

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.queue_depth, 0);
    assert_eq!(snapshot.queue_waits, 2);
}

#[test]
fn given_plenty_of_free_memory_when_recommending_then_capped_at_max() {
    let policy = BatchSizePolicy::default();

    assert_eq!(policy.available_mb(&test_memory()), 104_000.0);
    assert_eq!(policy.recommended(&test_memory()), 64);
}

#[test]
fn given_tight_memory_when_recommending_then_items_that_fit_are_returned() {
    let policy = BatchSizePolicy::default();
    let memory = GpuMemory {
        total_mb: 20_000.0,
        allocated_mb: 10_000.0,
        reserved_mb: 10_500.0,
    };
    let nearly_full = GpuMemory {
        total_mb: 20_000.0,
        allocated_mb: 11_000.0,
        reserved_mb: 11_800.0,
    };
    let barely = GpuMemory {
        total_mb: 20_000.0,
        allocated_mb: 10_000.0,
        reserved_mb: 10_000.0,
    };

    assert_eq!(policy.recommended(&memory), 31);
    assert_eq!(policy.recommended(&nearly_full), 8);
    assert_eq!(policy.recommended(&barely), 42);
}

#[test]
fn given_no_free_memory_when_recommending_then_minimum_is_returned() {
    let policy = BatchSizePolicy::default();
    let memory = GpuMemory {
        total_mb: 8_000.0,
        allocated_mb: 4_000.0,
        reserved_mb: 4_000.0,
    };

    assert_eq!(policy.recommended(&memory), 8);
}

#[test]
fn given_busy_gpu_when_recommending_under_load_then_busy_cap_applies() {
    let policy = BatchSizePolicy::default();

    assert_eq!(policy.recommended_under_load(&test_memory(), true), 32);
    assert_eq!(policy.recommended_under_load(&test_memory(), false), 64);
}

#[tokio::test]
async fn given_no_updates_when_reporting_legacy_progress_then_inactive() {
    let tracker = LegacyProgressTracker::new(ManualClock::new());

    let json = serde_json::to_value(tracker.report().await).unwrap();

    assert_eq!(json, serde_json::json!({ "active": false }));
}

#[tokio::test]
async fn given_progress_updates_when_reporting_then_start_time_is_kept_from_first_update() {
    let clock = ManualClock::new();
    let tracker = LegacyProgressTracker::new(clock.clone());

    tracker.update("alpha".to_string(), 0, 100).await;
    clock.advance_secs(10);
    tracker.update("alpha".to_string(), 50, 100).await;

    let report = tracker.report().await;
    assert!(report.active);
    assert_eq!(report.percent, Some(50));
    assert_eq!(report.elapsed_seconds, Some(10.0));
    assert_eq!(report.chunks_per_second, Some(5.0));
    assert_eq!(report.eta_seconds, Some(10.0));
}

#[tokio::test]
async fn given_finished_progress_when_reporting_then_eta_is_absent() {
    let clock = ManualClock::new();
    let tracker = LegacyProgressTracker::new(clock.clone());

    tracker.update("alpha".to_string(), 0, 10).await;
    clock.advance_secs(2);
    tracker.update("alpha".to_string(), 10, 10).await;

    let report = tracker.report().await;
    assert_eq!(report.percent, Some(100));
    assert_eq!(report.eta_seconds, None);
}

#[tokio::test]
async fn given_zero_total_when_reporting_then_percent_is_zero() {
    let tracker = LegacyProgressTracker::new(ManualClock::new());

    tracker.update("alpha".to_string(), 3, 0).await;

    let report = tracker.report().await;
    assert_eq!(report.percent, Some(0));
    assert_eq!(report.eta_seconds, None);
}

#[tokio::test]
async fn given_cleared_progress_when_updating_again_then_start_time_resets() {
    let clock = ManualClock::new();
    let tracker = LegacyProgressTracker::new(clock.clone());

    tracker.update("alpha".to_string(), 0, 10).await;
    clock.advance_secs(30);
    tracker.clear().await;
    assert!(!tracker.report().await.active);

    tracker.update("beta".to_string(), 1, 10).await;

    let report = tracker.report().await;
    assert_eq!(report.project.as_deref(), Some("beta"));
    assert_eq!(report.elapsed_seconds, Some(0.0));
}

#[tokio::test]
async fn given_huge_legacy_progress_when_reporting_then_values_do_not_overflow() {
    let clock = ManualClock::new();
    let tracker = LegacyProgressTracker::new(clock.clone());

    tracker.update("alpha".to_string(), 0, 100).await;
    clock.advance_secs(10);
    tracker.update("alpha".to_string(), i64::MAX / 10, 100).await;

    let report = tracker.report().await;
    assert_eq!(report.percent, Some(i64::MAX / 10));
    assert!(report.eta_seconds.unwrap() < 0.0);

    tracker.update("alpha".to_string(), i64::MIN, i64::MAX).await;
    let report = tracker.report().await;
    assert!(report.percent.unwrap() < 0);
    assert_eq!(report.eta_seconds, None);
}
