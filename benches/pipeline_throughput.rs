//! End-to-end destination throughput benchmark.
//!
//! Measures the full pipeline data path: record feed → marshal workers →
//! row queue → writer workers → per-stream CSV files on a temp dir.

use bytes::Bytes;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tempfile::TempDir;
use tokio::sync::mpsc;

use snowdrift::protocol::{Catalog, ConfiguredStream, Record, TracingLogger};
use snowdrift::{CsvDestination, DestinationConfig, WorkerConfig};

fn generate_records(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| Record {
            stream: format!("stream_{}", i % 3),
            id: format!("rec-{i}"),
            emitted_at: 1_700_000_000 + i as i64,
            data: Bytes::from(format!(r#"{{"sequence":{i},"flag":true}}"#)),
        })
        .collect()
}

async fn run_once(records: Vec<Record>) {
    let root = TempDir::new().unwrap();
    let catalog = Catalog::new(
        (0..3)
            .map(|i| ConfiguredStream {
                name: format!("stream_{i}"),
            })
            .collect(),
    );
    let destination = CsvDestination::new(root.path(), WorkerConfig::default()).unwrap();
    let config = DestinationConfig {
        destination_path: "bench".to_string(),
    };

    let (record_tx, record_rx) = mpsc::channel(256);
    let (error_tx, mut error_rx) = mpsc::channel(64);

    let feeder = tokio::spawn(async move {
        for record in records {
            if record_tx.send(record).await.is_err() {
                break;
            }
        }
    });
    let drainer = tokio::spawn(async move { while error_rx.recv().await.is_some() {} });

    destination
        .write(&catalog, &config, &TracingLogger, record_rx, error_tx)
        .await
        .unwrap();

    feeder.await.unwrap();
    drainer.await.unwrap();
}

/// Full-path benchmark: the primary number for sizing worker pools.
fn destination_end_to_end(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("destination_e2e");

    for record_count in [1_000, 10_000] {
        group.throughput(Throughput::Elements(record_count as u64));
        group.sample_size(10);

        group.bench_with_input(
            BenchmarkId::new("records_to_csv", record_count),
            &record_count,
            |b, &count| {
                b.iter(|| {
                    let records = generate_records(count);
                    rt.block_on(run_once(records));
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, destination_end_to_end);
criterion_main!(benches);
