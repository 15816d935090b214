use criterion::{criterion_group, criterion_main, Criterion};
use std::time::Duration;

use bb_nonhalt::{
    config::Config,
    decider::{
        decider_closed_states::DeciderClosedStates, decider_loop::DeciderLoop,
        decider_ngram_cps::DeciderNGramCps, decider_rep_wl::DeciderRepWl, Decider,
    },
    far::solver::solve_machine,
    machine_binary::{MachineBinary, NotableMachine},
};

const WARM_UP_TIME_MS: u64 = 500;
const MEASUREMENT_TIME_MS: u64 = 2000;

criterion_group!(
    benches,
    benchmark_closed_states,
    benchmark_loop,
    benchmark_ngram_cps,
    benchmark_rep_wl,
    benchmark_far_solver,
);
criterion_main!(benches);

fn bench_group<'a>(c: &'a mut Criterion, name: &str) -> criterion::BenchmarkGroup<'a, criterion::measurement::WallTime> {
    let mut group = c.benchmark_group(name);
    group.warm_up_time(Duration::from_millis(WARM_UP_TIME_MS));
    group.measurement_time(Duration::from_millis(MEASUREMENT_TIME_MS));
    group.sample_size(10);
    group
}

fn benchmark_closed_states(c: &mut Criterion) {
    let mut group = bench_group(c, "Bench Decider Closed States");
    let machine = NotableMachine::ClosedStatesExample.machine();
    let config = Config::new_default(5);

    group.bench_function("Closed states witness machine", |b| {
        b.iter(|| DeciderClosedStates::decide_single_machine(&machine, &config))
    });

    group.finish();
}

fn benchmark_loop(c: &mut Criterion) {
    let mut group = bench_group(c, "Bench Decider Loop");
    let machine = NotableMachine::BB5Max.machine();
    let config = Config::builder(5).step_limit_loop(512).build();

    group.bench_function("Loop 512 steps on BB5 champion", |b| {
        b.iter(|| DeciderLoop::decide_single_machine(&machine, &config))
    });

    group.finish();
}

fn benchmark_ngram_cps(c: &mut Criterion) {
    let mut group = bench_group(c, "Bench Decider NGramCPS");
    let machine = NotableMachine::NGramExample.machine();
    let config = Config::builder(5)
        .ngram_gram_len(2, 2)
        .ngram_gas(10_000)
        .build();

    group.bench_function("NGramCPS 2-grams", |b| {
        b.iter(|| DeciderNGramCps::decide_single_machine(&machine, &config))
    });

    group.finish();
}

fn benchmark_rep_wl(c: &mut Criterion) {
    let mut group = bench_group(c, "Bench Decider RepWL");
    let machine = NotableMachine::RepWlExample.machine();
    let config = Config::builder(5)
        .rep_wl_block_len(2)
        .rep_wl_plus_threshold(6)
        .build();

    group.bench_function("RepWL block 2 threshold 6", |b| {
        b.iter(|| DeciderRepWl::decide_single_machine(&machine, &config))
    });

    group.finish();
}

fn benchmark_far_solver(c: &mut Criterion) {
    let mut group = bench_group(c, "Bench FAR Solver");
    let machine = MachineBinary::try_from("1RB1LB_1LA1RA").unwrap();

    group.bench_function("FAR solve without halt transition", |b| {
        b.iter(|| solve_machine(&machine, 2))
    });

    group.finish();
}
