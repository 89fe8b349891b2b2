use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;

use mnist_stream::dataset::{read_image_header, MemorySource};
use mnist_stream::{Dataset, Geometry, LoaderError};

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

fn archives(count: u32, rows: u32, cols: u32) -> (Vec<u8>, Vec<u8>) {
    let mut images = Vec::new();
    for field in [2051, count, rows, cols] {
        images.extend_from_slice(&field.to_be_bytes());
    }
    let pixels = (count * rows * cols) as usize;
    images.extend((0..pixels).map(|i| (i * 37 % 256) as u8));

    let mut labels = Vec::new();
    for field in [2049, count] {
        labels.extend_from_slice(&field.to_be_bytes());
    }
    labels.extend((0..count).map(|i| (i % 10) as u8));

    (images, labels)
}

async fn loaded(count: u32, rows: u32, cols: u32) -> Dataset {
    let (images, labels) = archives(count, rows, cols);
    let mut dataset = Dataset::new();
    dataset
        .load(
            MemorySource::chunked(&gzip(&images), 13),
            MemorySource::chunked(&gzip(&labels), 2),
        )
        .await
        .unwrap();
    dataset
}

#[test]
fn header_parse_example() {
    let header = [0x00, 0x00, 0x08, 0x03, 0, 0, 0, 10, 0, 0, 0, 4, 0, 0, 0, 4];
    assert_eq!(
        read_image_header(&header).unwrap(),
        Geometry {
            record_count: 10,
            rows: 4,
            cols: 4
        }
    );
}

#[tokio::test]
async fn two_record_dataset_wraps_within_batch() {
    let mut images = vec![0, 0, 8, 3, 0, 0, 0, 2, 0, 0, 0, 2, 0, 0, 0, 2];
    images.extend_from_slice(&[0, 85, 170, 255, 255, 170, 85, 0]);
    let labels = vec![0, 0, 8, 1, 0, 0, 0, 2, 3, 7];

    let mut dataset = Dataset::new();
    dataset
        .load(
            MemorySource::chunked(&gzip(&images), 4),
            MemorySource::chunked(&gzip(&labels), 4),
        )
        .await
        .unwrap();

    let batch = dataset.next_batch(3);
    assert_eq!(batch.iter().map(|e| e.index).collect::<Vec<_>>(), vec![0u64, 1, 0]);
    assert_eq!(batch.iter().map(|e| e.label).collect::<Vec<_>>(), vec![3u8, 7, 3]);

    let expected: [[f32; 2]; 2] = [[0.0, 0.333], [0.667, 1.0]];
    for (r, row) in expected.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            assert!((batch[0].pixels[[r, c]] - value).abs() < 1e-3);
        }
    }
    assert_eq!(dataset.cursor(), 1);
}

#[tokio::test]
async fn batch_length_matches_request() {
    let dataset = loaded(7, 3, 2).await;
    for n in [0u32, 1, 6, 7, 8, 30] {
        assert_eq!(dataset.next_batch(n).len(), n as usize);
    }

    let unloaded = Dataset::new();
    for n in [0u32, 1, 30] {
        assert!(unloaded.next_batch(n).is_empty());
    }
}

#[tokio::test]
async fn repeated_full_batches_equal_one_long_batch() {
    let k = 3u32;
    let stepwise = loaded(5, 2, 2).await;
    stepwise.seek(2);
    let many: Vec<_> = (0..k).flat_map(|_| stepwise.next_batch(5)).collect();

    let single = loaded(5, 2, 2).await;
    single.seek(2);
    let once = single.next_batch(k * 5);

    assert_eq!(many, once);
    for (i, entry) in once.iter().enumerate() {
        assert_eq!(entry.index, (2 + i as u64) % 5);
    }
    assert_eq!(stepwise.cursor(), single.cursor());
}

#[tokio::test]
async fn geometry_is_stable_and_pixels_bounded() {
    let dataset = loaded(11, 4, 3).await;
    let geometry = dataset.geometry();

    for _ in 0..5 {
        for entry in dataset.next_batch(9) {
            assert_eq!(entry.pixels.dim(), (4, 3));
            assert!(entry.pixels.iter().all(|v| (0.0..=1.0).contains(v)));
            assert!(entry.label < 10);
        }
        assert_eq!(dataset.geometry(), geometry);
        assert_eq!((dataset.rows(), dataset.cols()), (4, 3));
    }
}

#[tokio::test]
async fn stacked_batch_has_one_hot_labels() {
    let dataset = loaded(12, 2, 3).await;
    let batch = dataset.next_stacked_batch(12);
    assert_eq!(batch.xs.shape(), &[12, 2, 3, 1]);
    assert_eq!(batch.ys.shape(), &[12, 10]);
    for (i, row) in batch.ys.outer_iter().enumerate() {
        assert_eq!(row.sum(), 1.0);
        assert_eq!(row[i % 10], 1.0);
    }
}

#[tokio::test]
async fn truncated_image_stream_leaves_dataset_unloaded() {
    let (_, labels) = archives(2, 2, 2);
    let mut dataset = Dataset::new();
    let err = dataset
        .load(
            MemorySource::chunked(&gzip(&[0, 0, 8, 3, 0, 0, 0, 2, 0, 0]), 3),
            MemorySource::chunked(&gzip(&labels), 3),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LoaderError::Format(_) | LoaderError::Decode(_)
    ));
    assert!(!dataset.is_loaded());
    assert!(dataset.next_batch(4).is_empty());
    assert_eq!((dataset.rows(), dataset.cols()), (0, 0));
}

#[tokio::test]
async fn loads_archive_files() {
    let dir = tempfile::tempdir().unwrap();
    let (images, labels) = archives(20, 28, 28);
    let images_path = dir.path().join("images-idx3-ubyte.gz");
    let labels_path = dir.path().join("labels-idx1-ubyte");
    std::fs::write(&images_path, gzip(&images)).unwrap();
    // Labels stored uncompressed; auto encoding passes them through
    std::fs::write(&labels_path, &labels).unwrap();

    let mut dataset = Dataset::new();
    dataset.load_files(&images_path, &labels_path).await.unwrap();
    assert_eq!(dataset.record_count(), 20);
    assert_eq!((dataset.rows(), dataset.cols()), (28, 28));

    let batch = dataset.next_batch(25);
    assert_eq!(batch[21].index, 1);
    assert_eq!(batch[21].label, 1);
    assert_eq!(dataset.cursor(), 5);
}

#[tokio::test]
async fn missing_file_is_transport_error() {
    let mut dataset = Dataset::new();
    let err = dataset
        .load_files("/nonexistent/images.gz", "/nonexistent/labels.gz")
        .await
        .unwrap_err();
    assert!(matches!(err, LoaderError::Transport(_)));
    assert!(!dataset.is_loaded());
}
