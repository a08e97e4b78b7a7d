//! Benchmarks for chunked upload encoding
//!
//! Covers splitting and checksumming a container at typical and maximum
//! sizes, plus a full session run against the in-memory transport with all
//! delays disabled.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tokio_util::sync::CancellationToken;
use ysled::codec::{CHUNK_PAYLOAD_SIZE, MAX_CHUNKS, build_upload_packets, split};
use ysled::test_utils::RecordingTransport;
use ysled::{SessionConfig, UploadSession};

fn container(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 256) as u8).collect()
}

fn bench_build_upload_packets(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_upload_packets");

    for len in [CHUNK_PAYLOAD_SIZE, 8 * 1024, MAX_CHUNKS * CHUNK_PAYLOAD_SIZE] {
        let blob = container(len);
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &blob, |b, blob| {
            b.iter(|| black_box(build_upload_packets(black_box(blob)).unwrap()))
        });
    }

    group.finish();
}

fn bench_encode_chunks(c: &mut Criterion) {
    let chunks = split(&container(MAX_CHUNKS * CHUNK_PAYLOAD_SIZE)).unwrap();

    c.bench_function("encode_max_chunks", |b| {
        b.iter(|| {
            for chunk in &chunks {
                black_box(chunk.encode());
            }
        })
    });
}

fn bench_session_run(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
    let blob = container(16 * 1024);

    c.bench_function("session_run_in_memory", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let mut session =
                    UploadSession::from_payload(&blob, SessionConfig::immediate()).unwrap();
                let mut transport = RecordingTransport::new();
                let report =
                    session.run(&mut transport, &CancellationToken::new()).await.unwrap();
                black_box(report)
            })
        })
    });
}

criterion_group!(benches, bench_build_upload_packets, bench_encode_chunks, bench_session_run);
criterion_main!(benches);
