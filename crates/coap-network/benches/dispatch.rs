//! Endpoint dispatch benchmarks
//!
//! Measures the cost the endpoint layer adds on top of its transports, using
//! the in-memory loopback capabilities so no socket time is included.

use coap_network::memory::{MemoryDatagramTransport, MemorySecureTransport};
use coap_network::{EndpointParams, NetworkEndpoint, MAX_PDU_LEN};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;

const PAYLOAD_SIZES: [usize; 3] = [4, 256, 1024];

fn bench_insecure_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("insecure_round_trip");

    for size in PAYLOAD_SIZES {
        let payload = vec![0xA5u8; size];
        let datagram = MemoryDatagramTransport::loopback().without_history();
        let params = EndpointParams::insecure("bench.local", 5683);
        let Ok(mut endpoint) =
            NetworkEndpoint::init(&datagram, MemorySecureTransport::new(), Some(&params))
        else {
            panic!("insecure init failed");
        };
        let mut buffer = vec![0u8; MAX_PDU_LEN];

        group.bench_with_input(BenchmarkId::new("write_read", size), &payload, |b, payload| {
            b.iter(|| {
                let written = endpoint.write(black_box(payload));
                let received = endpoint.read(&mut buffer, Duration::ZERO);
                black_box((written, received))
            })
        });
    }

    group.finish();
}

fn bench_secure_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("secure_round_trip");

    for size in PAYLOAD_SIZES {
        let payload = vec![0x5Au8; size];
        let secure = MemorySecureTransport::loopback().without_history();
        let params = EndpointParams::secure("bench.local", 5684, b"bench-anchor");
        let Ok(mut endpoint) =
            NetworkEndpoint::init(MemoryDatagramTransport::new(), &secure, Some(&params))
        else {
            panic!("secure init failed");
        };
        let mut buffer = vec![0u8; MAX_PDU_LEN];

        group.bench_with_input(BenchmarkId::new("write_read", size), &payload, |b, payload| {
            b.iter(|| {
                let written = endpoint.write(black_box(payload));
                let received = endpoint.read(&mut buffer, Duration::ZERO);
                black_box((written, received))
            })
        });
    }

    group.finish();
}

fn bench_lifecycle(c: &mut Criterion) {
    let datagram = MemoryDatagramTransport::new().without_history();
    let params = EndpointParams::insecure("bench.local", 5683);

    c.bench_function("init_deinit", |b| {
        b.iter(|| {
            if let Ok(endpoint) =
                NetworkEndpoint::init(&datagram, MemorySecureTransport::new(), Some(&params))
            {
                black_box(endpoint.deinit())
            } else {
                panic!("init failed")
            }
        })
    });
}

criterion_group!(
    benches,
    bench_insecure_round_trip,
    bench_secure_round_trip,
    bench_lifecycle
);
criterion_main!(benches);
