//! Integration tests for the read, store and render pipeline.

use countchart_desktop::bluetooth::{FrameReader, ReadEnd};
use countchart_desktop::chart::{BarPoint, ChartData, DEFAULT_LABEL};
use countchart_desktop::record::{self, Record};
use countchart_desktop::storage::RecordStore;
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tempfile::tempdir;
use tokio::io::{AsyncRead, ReadBuf};

/// Returns one chunk per read, like an RFCOMM socket delivering frames.
struct ChunkStream {
    chunks: VecDeque<io::Result<Vec<u8>>>,
}

impl ChunkStream {
    fn new(chunks: Vec<io::Result<Vec<u8>>>) -> Self {
        Self {
            chunks: chunks.into(),
        }
    }
}

impl AsyncRead for ChunkStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.chunks.pop_front() {
            Some(Ok(bytes)) => {
                buf.put_slice(&bytes);
                Poll::Ready(Ok(()))
            }
            Some(Err(e)) => Poll::Ready(Err(e)),
            None => Poll::Ready(Ok(())),
        }
    }
}

fn frame(text: &str) -> io::Result<Vec<u8>> {
    Ok(text.as_bytes().to_vec())
}

/// Run frames through reader and store, then chart what was stored.
async fn pipeline(
    store: &RecordStore,
    chunks: Vec<io::Result<Vec<u8>>>,
) -> (io::Result<ReadEnd>, usize, ChartData) {
    let mut reader = FrameReader::new(1024);
    let mut saves = 0;
    let result = reader
        .run(ChunkStream::new(chunks), |records| {
            store.save(&records).unwrap();
            saves += 1;
        })
        .await;

    let stored = store.load().unwrap();
    let chart = ChartData::from_records(DEFAULT_LABEL, stored.as_ref());
    (result, saves, chart)
}

#[tokio::test]
async fn test_single_frame_scenario() {
    let dir = tempdir().unwrap();
    let store = RecordStore::new(dir.path()).unwrap();

    let (result, saves, chart) =
        pipeline(&store, vec![frame(r#"[{"time":5,"count":20}]"#)]).await;

    assert_eq!(result.unwrap(), ReadEnd::EndOfStream);
    assert_eq!(saves, 1);
    assert_eq!(store.load().unwrap(), Some(vec![Record::new(5, 20)]));
    assert_eq!(chart.points, vec![BarPoint { x: 5.0, y: 4.0 }]);
}

#[tokio::test]
async fn test_latest_frame_replaces_previous() {
    let dir = tempdir().unwrap();
    let store = RecordStore::new(dir.path()).unwrap();

    let (_, saves, chart) = pipeline(
        &store,
        vec![
            frame(r#"[{"time":1,"count":3}]"#),
            frame(r#"[{"time":2,"count":10}]"#),
        ],
    )
    .await;

    assert_eq!(saves, 2);
    assert_eq!(chart.points, vec![BarPoint { x: 2.0, y: 5.0 }]);
}

#[tokio::test]
async fn test_one_point_per_record_in_order() {
    let dir = tempdir().unwrap();
    let store = RecordStore::new(dir.path()).unwrap();

    let records = vec![
        Record::new(1, 1),
        Record::new(3, 12),
        Record::new(8, 2),
        Record::new(4, 10),
    ];
    let text = record::encode(&records).unwrap();

    let (_, _, chart) = pipeline(&store, vec![frame(&text)]).await;

    let expected: Vec<BarPoint> = records
        .iter()
        .map(|r| BarPoint {
            x: r.time as f32,
            y: r.count as f32 / r.time as f32,
        })
        .collect();
    assert_eq!(chart.points, expected);
}

#[tokio::test]
async fn test_joined_frames_keep_the_first() {
    let dir = tempdir().unwrap();
    let store = RecordStore::new(dir.path()).unwrap();

    let (_, saves, chart) = pipeline(
        &store,
        vec![frame(r#"[{"time":5,"count":20}][{"time":2,"count":10}]"#)],
    )
    .await;

    assert_eq!(saves, 1);
    assert_eq!(store.load().unwrap(), Some(vec![Record::new(5, 20)]));
    assert_eq!(chart.points, vec![BarPoint { x: 5.0, y: 4.0 }]);
}

#[tokio::test]
async fn test_bad_frame_is_isolated() {
    let dir = tempdir().unwrap();
    let store = RecordStore::new(dir.path()).unwrap();

    let (result, saves, chart) = pipeline(
        &store,
        vec![
            frame(r#"[{"time":5,"count":20}]"#),
            frame("garbage"),
            frame(r#"[{"time":4,"count":6}]"#),
        ],
    )
    .await;

    assert!(result.is_ok());
    assert_eq!(saves, 2);
    assert_eq!(chart.points, vec![BarPoint { x: 4.0, y: 1.5 }]);
}

#[tokio::test]
async fn test_no_saves_after_read_error() {
    let dir = tempdir().unwrap();
    let store = RecordStore::new(dir.path()).unwrap();

    let (result, saves, chart) = pipeline(
        &store,
        vec![
            frame(r#"[{"time":2,"count":4}]"#),
            Err(io::Error::new(io::ErrorKind::ConnectionAborted, "link lost")),
            frame(r#"[{"time":9,"count":9}]"#),
        ],
    )
    .await;

    assert!(result.is_err());
    assert_eq!(saves, 1);
    assert_eq!(chart.points, vec![BarPoint { x: 2.0, y: 2.0 }]);
}

#[test]
fn test_nothing_saved_renders_empty_chart() {
    let dir = tempdir().unwrap();
    let store = RecordStore::new(dir.path()).unwrap();

    let stored = store.load().unwrap();
    assert!(stored.is_none());

    let chart = ChartData::from_records(DEFAULT_LABEL, stored.as_ref());
    assert!(chart.is_empty());
}
