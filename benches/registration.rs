//! Benchmark for address parsing and the register-then-verify round trip

use contract_registrar::{ClientConfig, ContractAddress, MemoryRegistry, RegistrationClient};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::sync::Arc;

const STAKING: &str = "0xcC7A9e9c8E60ecc12D5A6cd9BEFEFFCD253104E9";

fn bench_parse_address(c: &mut Criterion) {
    let mut group = c.benchmark_group("address");
    group.throughput(Throughput::Elements(1));

    group.bench_function("parse_checksummed", |b| {
        b.iter(|| ContractAddress::parse(black_box(STAKING)));
    });

    let lower = STAKING.to_lowercase();
    group.bench_function("parse_lowercase", |b| {
        b.iter(|| ContractAddress::parse(black_box(&lower)));
    });

    group.finish();
}

fn bench_register_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("registration");
    group.throughput(Throughput::Elements(1));

    let rt = tokio::runtime::Runtime::new().unwrap();
    let registry = Arc::new(MemoryRegistry::default());
    let client = RegistrationClient::new(registry, ClientConfig::default());

    group.bench_function("register_and_verify", |b| {
        let mut counter = 0u64;
        b.iter(|| {
            counter += 1;
            let name = format!("contract-{}", counter % 1000);
            rt.block_on(async {
                let _ = client
                    .register(black_box(&name), "1.0", black_box(STAKING))
                    .await;
            });
        });
    });

    group.finish();
}

criterion_group!(benches, bench_parse_address, bench_register_round_trip);
criterion_main!(benches);
