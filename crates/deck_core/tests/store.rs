use chrono::{DateTime, Utc};
use deck_core::{JobStatus, JobStore, JobUpdate, Placement, DEFAULT_JOB_LABEL, JOB_CAPACITY};
use pretty_assertions::assert_eq;

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
}

#[test]
fn insert_fills_defaults() {
    let mut store = JobStore::new();
    let outcome = store.upsert(JobUpdate::with_id("j1"), at(0), Placement::Head);
    assert!(outcome.inserted);
    assert!(outcome.evicted.is_empty());

    let job = store.get("j1").unwrap();
    assert_eq!(job.label, DEFAULT_JOB_LABEL);
    assert_eq!(job.subtitle, "");
    assert_eq!(job.message, "");
    assert_eq!(job.progress, 0);
    assert!(job.metadata.is_empty());
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.started_at, at(0));
    assert_eq!(job.updated_at, at(0));
}

#[test]
fn upsert_without_id_is_noop() {
    let mut store = JobStore::new();
    let outcome = store.upsert(JobUpdate::default().progress(10.0), at(0), Placement::Head);
    assert!(!outcome.changed);
    let outcome = store.upsert(JobUpdate::with_id("  "), at(0), Placement::Head);
    assert!(!outcome.changed);
    assert!(store.is_empty());
}

#[test]
fn merges_pin_started_at_and_advance_updated_at() {
    let mut store = JobStore::new();
    store.upsert(JobUpdate::with_id("j1"), at(10), Placement::Head);

    let mut previous_updated = store.get("j1").unwrap().updated_at;
    for (step, now) in [(1, 20), (2, 15), (3, 40)] {
        store.upsert(
            JobUpdate::with_id("j1")
                .status(JobStatus::Processing)
                .progress(f64::from(step) * 10.0)
                .started_at(at(999)),
            at(now),
            Placement::Head,
        );
        let job = store.get("j1").unwrap();
        assert_eq!(job.started_at, at(10));
        assert!(job.updated_at >= previous_updated);
        previous_updated = job.updated_at;
    }

    let job = store.get("j1").unwrap();
    assert_eq!(job.progress, 30);
    assert_eq!(job.updated_at, at(40));
    assert_eq!(store.len(), 1);
}

#[test]
fn server_updated_at_is_preferred_over_now() {
    let mut store = JobStore::new();
    store.upsert(JobUpdate::with_id("j1"), at(0), Placement::Head);
    let update = JobUpdate {
        updated_at: Some(at(5)),
        ..JobUpdate::with_id("j1")
    };
    store.upsert(update, at(100), Placement::Head);
    assert_eq!(store.get("j1").unwrap().updated_at, at(5));
}

#[test]
fn merge_is_shallow_and_drops_blank_metadata() {
    let mut store = JobStore::new();
    store.upsert(
        JobUpdate {
            label: Some("Heat – Trailer".to_string()),
            subtitle: Some("Extra • Trailer".to_string()),
            metadata: Some(vec!["1080p".to_string(), String::new(), " ".to_string()]),
            ..JobUpdate::with_id("j1")
        },
        at(0),
        Placement::Head,
    );
    store.upsert(JobUpdate::with_id("j1").progress(55.0), at(1), Placement::Head);

    let job = store.get("j1").unwrap();
    assert_eq!(job.label, "Heat – Trailer");
    assert_eq!(job.subtitle, "Extra • Trailer");
    assert_eq!(job.metadata, vec!["1080p".to_string()]);
    assert_eq!(job.progress, 55);
}

#[test]
fn store_is_capped_and_evicts_oldest() {
    let mut store = JobStore::new();
    let mut evicted = Vec::new();
    // Insert out of order so eviction has to look at started_at, not arrival.
    let starts = [5, 1, 9, 3, 12, 7, 0, 11, 2, 8, 4];
    for start in starts {
        let outcome = store.upsert(
            JobUpdate::with_id(format!("job-{start}")).started_at(at(start)),
            at(100),
            Placement::Tail,
        );
        evicted.extend(outcome.evicted);
        assert!(store.len() <= JOB_CAPACITY);
    }

    assert_eq!(store.len(), JOB_CAPACITY);
    let ids: Vec<_> = store.iter().map(|job| job.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["job-12", "job-11", "job-9", "job-8", "job-7", "job-5", "job-4", "job-3"]
    );
    evicted.sort();
    assert_eq!(evicted, vec!["job-0", "job-1", "job-2"]);
}

#[test]
fn placement_orders_equal_start_times() {
    let mut store = JobStore::new();
    store.upsert(JobUpdate::with_id("a"), at(0), Placement::Tail);
    store.upsert(JobUpdate::with_id("b"), at(0), Placement::Tail);
    store.upsert(JobUpdate::with_id("c"), at(0), Placement::Head);
    let ids: Vec<_> = store.iter().map(|job| job.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
}
