//! # QC-11 Native Contracts Benchmarks
//!
//! Measured paths:
//! - Table store: emplace with secondary index, undo of a full session
//! - Address book: upsert through the host (counter call and notification included)
//! - Hodl: deposit through the token contract and the escrow notification
//!
//! Conditions:
//! - Tables pre-filled to 1k and 10k rows
//! - Every host benchmark runs the whole unit of work, commit included

use std::time::Duration;

use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use tokio::runtime::Runtime;

use qc_11_native_contracts::prelude::*;
use shared_types::{Asset, Name, PermissionLevel, Symbol};

const SYS: Symbol = Symbol::from_static("SYS", 4);
const BENCH_CODE: Name = Name::from_static("bench");

fn user(i: u64) -> Name {
    Name::from_raw((i + 1) << 20)
}

fn person(key: Name, age: u64) -> Person {
    Person {
        key,
        first_name: "First".into(),
        last_name: "Last".into(),
        street: "Main St".into(),
        city: "Springfield".into(),
        state: "IL".into(),
        age,
    }
}

fn upsert(user: Name, age: u64) -> Action {
    Action::new(
        accounts::ADDRESSBOOK,
        actions::UPSERT,
        vec![PermissionLevel::active(user)],
        &UpsertPayload {
            user,
            first_name: "First".into(),
            last_name: "Last".into(),
            age,
            street: "Main St".into(),
            city: "Springfield".into(),
            state: "IL".into(),
        },
    )
    .expect("encodable payload")
}

fn deposit(from: Name, units: i64) -> Action {
    Action::new(
        accounts::TOKEN,
        actions::TRANSFER,
        vec![PermissionLevel::active(from)],
        &TransferPayload {
            from,
            to: accounts::HODL,
            quantity: Asset::new(units, SYS).expect("valid asset"),
            memo: String::new(),
        },
    )
    .expect("encodable payload")
}

fn filled_database(rows: u64) -> ChainDatabase {
    let mut rng = rand::thread_rng();
    let mut db = ChainDatabase::new();
    let mut table = db.table_mut::<Person>(BENCH_CODE, BENCH_CODE);
    for i in 0..rows {
        table
            .emplace(BENCH_CODE, &person(user(i), rng.gen_range(0..120)))
            .expect("fresh key");
    }
    db
}

pub fn table_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-11/table_store");
    group.measurement_time(Duration::from_secs(10));

    for rows in [1_000_u64, 10_000] {
        group.bench_with_input(BenchmarkId::new("emplace_into", rows), &rows, |b, &rows| {
            b.iter_batched(
                || filled_database(rows),
                |mut db| {
                    db.table_mut::<Person>(BENCH_CODE, BENCH_CODE)
                        .emplace(BENCH_CODE, &person(user(rows), 42))
                        .expect("fresh key");
                    black_box(db)
                },
                criterion::BatchSize::LargeInput,
            );
        });

        let db = filled_database(rows);
        group.bench_with_input(BenchmarkId::new("age_range_scan", rows), &db, |b, db| {
            b.iter(|| {
                let rows = db
                    .table::<Person>(BENCH_CODE, BENCH_CODE)
                    .secondary_range(30..=40)
                    .expect("decodable rows");
                black_box(rows.len())
            });
        });
    }

    group.throughput(Throughput::Elements(1_000));
    group.bench_function("undo_1k_emplaces", |b| {
        b.iter_batched(
            ChainDatabase::new,
            |mut db| {
                db.begin_session().expect("no open session");
                let mut table = db.table_mut::<Person>(BENCH_CODE, BENCH_CODE);
                for i in 0..1_000 {
                    table
                        .emplace(BENCH_CODE, &person(user(i), i % 100))
                        .expect("fresh key");
                }
                black_box(db.undo())
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

pub fn addressbook_upsert(c: &mut Criterion) {
    let runtime = Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("qc-11/addressbook");
    group.throughput(Throughput::Elements(1));

    group.bench_function("upsert_new_record", |b| {
        let host = create_test_host().expect("test host");
        let mut next = 0_u64;
        b.iter(|| {
            next += 1;
            runtime
                .block_on(host.push_action(upsert(user(next), 30)))
                .expect("committed")
        });
    });

    group.bench_function("upsert_age_change", |b| {
        let host = create_test_host().expect("test host");
        let alice = user(0);
        runtime
            .block_on(host.push_action(upsert(alice, 30)))
            .expect("committed");
        let mut age = 30_u64;
        b.iter(|| {
            age += 1;
            runtime
                .block_on(host.push_action(upsert(alice, age)))
                .expect("committed")
        });
    });

    group.finish();
}

pub fn hodl_deposit(c: &mut Criterion) {
    let runtime = Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("qc-11/hodl");
    group.throughput(Throughput::Elements(1));

    group.bench_function("deposit_accumulate", |b| {
        let host = create_test_host().expect("test host");
        let alice = user(0);
        host.gateway()
            .issue(alice, Asset::new(1_000_000_000_000_000, SYS).expect("valid asset"));
        b.iter(|| {
            runtime
                .block_on(host.push_action(deposit(alice, 1)))
                .expect("committed")
        });
    });

    group.finish();
}

pub fn register_benchmarks(c: &mut Criterion) {
    table_store(c);
    addressbook_upsert(c);
    hodl_deposit(c);
}
