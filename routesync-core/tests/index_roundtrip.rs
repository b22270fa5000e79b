//! Persisted index roundtrip tests for `routesync-core`.

use routesync_core::{index_store, parse_timestamp, Index, RouteId};
use rstest::rstest;
use tempfile::TempDir;

fn build(entries: &[(u64, &str)]) -> Index {
    entries
        .iter()
        .map(|(id, t)| (RouteId(*id), parse_timestamp(t).expect("fixture timestamp")))
        .collect()
}

#[rstest]
#[case("empty", build(&[]))]
#[case("utc", build(&[(1, "2023-01-01T00:00:00Z"), (2, "2023-02-01T00:00:00Z")]))]
#[case(
    "non_utc_offsets",
    build(&[(10, "2023-01-01T09:00:00+09:00"), (11, "2023-01-01T00:00:00-05:30")])
)]
#[case("fractional_seconds", build(&[(99, "2023-01-01T00:00:00.123456Z")]))]
#[case("large_ids", build(&[(u64::MAX, "2023-01-01T00:00:00Z"), (0, "1999-12-31T23:59:59Z")]))]
fn index_roundtrip(#[case] label: &str, #[case] index: Index) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("index.txt");
    index_store::save_at(&path, &index).unwrap_or_else(|e| panic!("[{label}] save failed: {e}"));
    let back = index_store::load_at(&path).unwrap_or_else(|e| panic!("[{label}] load failed: {e}"));
    assert_eq!(back, index, "[{label}] index");
    for (id, ts) in &index {
        assert_eq!(back[id].offset(), ts.offset(), "[{label}] offset preserved for {id}");
    }
}

#[test]
fn save_overwrites_previous_contents() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("index.txt");
    index_store::save_at(&path, &build(&[(1, "2023-01-01T00:00:00Z"), (2, "2023-01-01T00:00:00Z")]))
        .expect("first save");
    let second = build(&[(3, "2023-01-01T00:00:00Z")]);
    index_store::save_at(&path, &second).expect("second save");
    assert_eq!(index_store::load_at(&path).expect("load"), second);
}
