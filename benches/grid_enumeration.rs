//! Grid enumeration benchmarks
//!
//! Enumeration, key rendering and the pre-flight uniqueness check for the
//! largest configuration (cross-validation, every window set, stratified),
//! plus a dry-run sweep against the in-memory tracking repo.
//!
//! Run with: cargo bench --bench grid_enumeration

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vo2_sweep::config::{RunConfiguration, RunOverrides};
use vo2_sweep::experiment::{CommandLauncher, TrackingRepo};
use vo2_sweep::grid::{Grid, GridPoint};
use vo2_sweep::sweep::Sweep;

fn all_window_sets() -> Vec<Vec<u8>> {
    (1u8..8)
        .map(|mask| (0..3).filter(|i| mask & (1 << i) != 0).collect())
        .collect()
}

fn config(gender: &str, full_load: bool) -> RunConfiguration {
    RunConfiguration::resolve(
        RunOverrides::default()
            .with_time_list(all_window_sets())
            .with_gender_group(gender)
            .with_full_load(full_load),
    )
    .unwrap()
}

/// Benchmark enumerating every grid point
fn bench_enumerate(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_enumerate");

    for (label, config) in [
        ("full_load_all", config("all", true)),
        ("cv_all", config("all", false)),
        ("cv_each", config("each", false)),
    ] {
        let size = Grid::new(&config).len();
        group.bench_with_input(BenchmarkId::new(label, size), &config, |b, config| {
            b.iter(|| Grid::new(black_box(config)).iter().count());
        });
    }

    group.finish();
}

/// Benchmark key rendering and the pre-flight uniqueness check
fn bench_plan(c: &mut Criterion) {
    let config = config("each", false);
    let points: Vec<GridPoint> = Grid::new(&config).iter().collect();
    let launcher = CommandLauncher::dry_run();
    let repo = TrackingRepo::in_memory();

    c.bench_function("grid_keys", |b| {
        b.iter(|| black_box(&points).iter().map(GridPoint::key).count());
    });
    c.bench_function("sweep_plan", |b| {
        b.iter(|| Sweep::new(black_box(&config), &launcher, &repo).plan().unwrap());
    });
}

/// Benchmark a dry-run sweep (tracking overhead only)
fn bench_dry_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("dry_run_sweep");
    group.sample_size(20);

    for parallelism in [1usize, 4] {
        let config = RunConfiguration::resolve(
            RunOverrides::default()
                .with_time_list(all_window_sets())
                .with_parallelism(parallelism),
        )
        .unwrap();
        let launcher = CommandLauncher::dry_run();
        group.bench_with_input(
            BenchmarkId::new("parallelism", parallelism),
            &config,
            |b, config| {
                b.iter(|| {
                    let repo = TrackingRepo::in_memory();
                    Sweep::new(config, &launcher, &repo).run().unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_enumerate, bench_plan, bench_dry_run);
criterion_main!(benches);
