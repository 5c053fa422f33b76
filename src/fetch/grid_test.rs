use std::time::Duration;

use super::*;
use crate::coords::CellRange;
use crate::net::realtime::{Inbound, apply_inbound};
use crate::test_helpers::{FakeTransport, cell};

const THROTTLE: Duration = Duration::from_millis(1000);

fn chunk(row: i64, col: i64) -> FetchChunk {
    FetchChunk::new(row, col)
}

fn loader(transport: &Arc<FakeTransport>) -> (FluxStore, GridLoader) {
    let store = FluxStore::new();
    let loader = GridLoader::new(transport.clone(), store.clone(), THROTTLE);
    (store, loader)
}

fn size() -> CanvasSize {
    CanvasSize::new(800.0, 600.0)
}

async fn wait_for_calls(transport: &FakeTransport, n: usize) {
    while transport.cell_call_count() < n {
        tokio::task::yield_now().await;
    }
}

// --- viewport triggers ---

#[tokio::test]
async fn viewport_trigger_loads_visible_chunk() {
    let transport = Arc::new(FakeTransport::new().with_cells([cell(1, 5, 5, "hello"), cell(2, 40, 40, "far")]));
    let (store, loader) = loader(&transport);

    let outcome = loader.load_for_viewport(&Viewport::new(0.0, 0.0, 1.0), size()).await;

    assert_eq!(
        outcome,
        LoadOutcome::Requested(FetchReport { requested: vec![chunk(0, 0)], failed: vec![] })
    );
    assert_eq!(store.cell_count(), 1);
    assert!(store.cell(crate::coords::CellCoord::new(5, 5)).is_some());
    assert!(!loader.is_loading());
    assert_eq!(loader.loaded_chunks(), 1);
}

#[tokio::test]
async fn scenario_viewport_requests_single_chunk() {
    let transport = Arc::new(FakeTransport::new());
    let (_store, loader) = loader(&transport);
    loader.load_for_viewport(&Viewport::new(-1500.0, -1500.0, 1.0), size()).await;
    assert_eq!(transport.cell_call_chunks(), vec![chunk(1, 1)]);
}

// --- idempotence ---

#[tokio::test]
async fn repeated_request_issues_no_new_fetch() {
    let transport = Arc::new(FakeTransport::new());
    let (_store, loader) = loader(&transport);
    let ids = [chunk(0, 0), chunk(0, 1)];

    let first = loader.request_chunks(&ids).await;
    let second = loader.request_chunks(&ids).await;

    assert_eq!(first.requested.len(), 2);
    assert!(second.is_empty());
    assert_eq!(transport.cell_call_count(), 1);
}

// --- batching ---

#[tokio::test]
async fn claimed_chunks_share_one_covering_request() {
    let transport = Arc::new(FakeTransport::new());
    let (_store, loader) = loader(&transport);

    let report = loader.request_chunks(&[chunk(0, 0), chunk(0, 1), chunk(1, 0), chunk(1, 1)]).await;

    assert_eq!(report.requested.len(), 4);
    assert_eq!(transport.cell_call_ranges(), vec![CellRange::new(0, 19, 0, 19)]);
    assert_eq!(loader.loaded_chunks(), 4);
}

#[tokio::test]
async fn covering_request_leaves_unclaimed_chunks_alone() {
    let transport = Arc::new(FakeTransport::new().with_cells([
        cell(1, 0, 0, "left"),
        cell(2, 0, 15, "stale middle"),
        cell(3, 0, 25, "right"),
    ]));
    let (store, loader) = loader(&transport);
    loader.request_chunks(&[chunk(0, 1)]).await;
    apply_inbound(&store, Inbound::CellUpdated(cell(9, 0, 15, "pushed")));

    let report = loader.request_chunks(&[chunk(0, 0), chunk(0, 1), chunk(0, 2)]).await;

    assert_eq!(report.requested, vec![chunk(0, 0), chunk(0, 2)]);
    assert_eq!(transport.cell_call_ranges()[1], CellRange::new(0, 9, 0, 29));
    assert_eq!(store.cell_count(), 3);
    let middle = store.cell(crate::coords::CellCoord::new(0, 15)).unwrap();
    assert_eq!(middle.content.as_deref(), Some("pushed"));
}

#[tokio::test]
async fn far_viewport_requests_a_valid_range() {
    let transport = Arc::new(FakeTransport::new());
    let (_store, loader) = loader(&transport);

    let outcome = loader.load_for_viewport(&Viewport::new(-1.0e22, 1.0e22, 1.0), size()).await;

    assert!(matches!(outcome, LoadOutcome::Requested(_)));
    let ranges = transport.cell_call_ranges();
    assert_eq!(ranges.len(), 1);
    assert!(ranges[0].start_col > 0 && ranges[0].start_col <= ranges[0].end_col);
    assert!(ranges[0].end_row < 0 && ranges[0].start_row <= ranges[0].end_row);
}

// --- at most one fetch per chunk ---

#[tokio::test]
async fn overlapping_triggers_never_double_fetch() {
    let transport = Arc::new(FakeTransport::gated());
    let (_store, loader) = loader(&transport);
    let loader = Arc::new(loader);

    let a = tokio::spawn({
        let loader = loader.clone();
        async move { loader.request_chunks(&[chunk(0, 0), chunk(0, 1)]).await }
    });
    wait_for_calls(&transport, 1).await;
    assert!(loader.is_loading());

    let b = tokio::spawn({
        let loader = loader.clone();
        async move { loader.request_chunks(&[chunk(0, 1), chunk(0, 2)]).await }
    });
    wait_for_calls(&transport, 2).await;

    transport.release(2);
    let a = a.await.unwrap();
    let b = b.await.unwrap();

    assert_eq!(a.requested, vec![chunk(0, 0), chunk(0, 1)]);
    assert_eq!(b.requested, vec![chunk(0, 2)]);
    assert_eq!(
        transport.cell_call_ranges(),
        vec![CellRange::new(0, 9, 0, 19), CellRange::new(0, 9, 20, 29)]
    );
    assert!(!loader.is_loading());
}

// --- retry after failure ---

#[tokio::test]
async fn failed_chunk_is_retried_on_next_request() {
    let transport = Arc::new(FakeTransport::new());
    let (_store, loader) = loader(&transport);
    transport.fail_chunk(chunk(2, 3), true);

    let failed = loader.request_chunks(&[chunk(2, 3)]).await;
    assert_eq!(failed.failed, vec![chunk(2, 3)]);
    assert_eq!(loader.last_error().as_deref(), Some("Failed to fetch messages"));

    transport.fail_chunk(chunk(2, 3), false);
    let retried = loader.request_chunks(&[chunk(2, 3)]).await;
    assert_eq!(retried.requested, vec![chunk(2, 3)]);
    assert!(retried.succeeded());
    assert!(loader.last_error().is_none());
    assert_eq!(transport.cell_call_count(), 2);
}

#[tokio::test]
async fn failed_batch_rolls_back_every_claimed_chunk() {
    let transport = Arc::new(FakeTransport::new().with_cells([cell(1, 0, 15, "ok")]));
    let (store, loader) = loader(&transport);
    transport.fail_chunk(chunk(0, 0), true);

    let report = loader.request_chunks(&[chunk(0, 0), chunk(0, 1)]).await;
    assert_eq!(report.failed, vec![chunk(0, 0), chunk(0, 1)]);
    assert_eq!(store.cell_count(), 0);
    assert_eq!(loader.loaded_chunks(), 0);
    assert!(!loader.is_loading());

    transport.fail_chunk(chunk(0, 0), false);
    let retried = loader.request_chunks(&[chunk(0, 0), chunk(0, 1)]).await;
    assert!(retried.succeeded());
    assert_eq!(store.cell_count(), 1);
}

// --- cache convergence ---

#[tokio::test]
async fn realtime_update_after_fetch_wins() {
    let transport = Arc::new(FakeTransport::new().with_cells([cell(1, 5, 5, "fetched")]));
    let (store, loader) = loader(&transport);
    loader.request_chunks(&[chunk(0, 0)]).await;

    apply_inbound(&store, Inbound::CellUpdated(cell(7, 5, 5, "pushed")));

    let cached = store.cell(crate::coords::CellCoord::new(5, 5)).unwrap();
    assert_eq!(cached.content.as_deref(), Some("pushed"));
    assert_eq!(cached.id, 7);
}

// --- throttle ---

#[tokio::test]
async fn new_area_inside_throttle_window_is_throttled() {
    let transport = Arc::new(FakeTransport::new());
    let (_store, loader) = loader(&transport);
    let start = Instant::now();
    let far = Viewport::new(-3000.0, 0.0, 1.0);

    let first = loader.load_for_viewport_at(&Viewport::default(), size(), start).await;
    assert!(matches!(first, LoadOutcome::Requested(_)));

    let early = loader.load_for_viewport_at(&far, size(), start + Duration::from_millis(500)).await;
    assert_eq!(early, LoadOutcome::Throttled);

    let later = loader.load_for_viewport_at(&far, size(), start + THROTTLE).await;
    assert!(matches!(later, LoadOutcome::Requested(_)));
}

#[tokio::test]
async fn nothing_new_is_not_throttled() {
    let transport = Arc::new(FakeTransport::new());
    let (_store, loader) = loader(&transport);
    let start = Instant::now();

    loader.load_for_viewport_at(&Viewport::default(), size(), start).await;
    let again = loader.load_for_viewport_at(&Viewport::default(), size(), start + Duration::from_millis(10)).await;

    assert_eq!(again, LoadOutcome::NothingNew);
    assert_eq!(transport.cell_call_count(), 1);
}

#[tokio::test]
async fn failed_viewport_chunk_is_retried_by_later_trigger() {
    let transport = Arc::new(FakeTransport::new());
    let (_store, loader) = loader(&transport);
    let start = Instant::now();
    transport.fail_chunk(chunk(0, 0), true);

    let first = loader.load_for_viewport_at(&Viewport::default(), size(), start).await;
    assert_eq!(first.report().map(|r| r.failed.clone()), Some(vec![chunk(0, 0)]));

    transport.fail_chunk(chunk(0, 0), false);
    let second = loader.load_for_viewport_at(&Viewport::default(), size(), start + THROTTLE).await;
    assert_eq!(second.report().map(FetchReport::succeeded), Some(true));
    assert_eq!(transport.cell_call_count(), 2);
}
