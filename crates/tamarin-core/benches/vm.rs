// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tamarin_core::{Engine, VM};

const FIBONACCI: &str = "
let fibonacci = fn(x) {
    if (x < 2) { x } else { fibonacci(x - 1) + fibonacci(x - 2) }
};
";

const MAP_REDUCE: &str = "
let map = fn(arr, f) {
    let iter = fn(arr, acc) {
        if (len(arr) == 0) { acc } else { iter(tail(arr), push(acc, f(first(arr)))) }
    };
    iter(arr, [])
};
";

fn bench_fibonacci(c: &mut Criterion) {
    let mut group = c.benchmark_group("fibonacci");

    for n in [10, 15, 20] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut engine = Engine::new();
            engine.eval(FIBONACCI).unwrap();
            let call = format!("fibonacci({})", n);
            b.iter(|| engine.eval(black_box(&call)).unwrap());
        });
    }

    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    group.bench_function("fibonacci", |b| {
        let engine = Engine::new();
        b.iter(|| engine.compile(black_box(FIBONACCI)).unwrap());
    });

    group.bench_function("map", |b| {
        let engine = Engine::new();
        b.iter(|| engine.compile(black_box(MAP_REDUCE)).unwrap());
    });

    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let engine = Engine::new();
    let bytecode = engine
        .compile("let a = [1, 2, 3]; let h = {\"k\": a}; h[\"k\"][2] * (10 - 4) / 2 == 9")
        .unwrap();

    c.bench_function("dispatch_composites", |b| {
        b.iter(|| {
            let mut vm = VM::new(black_box(&bytecode));
            vm.run().unwrap();
        });
    });
}

criterion_group!(benches, bench_fibonacci, bench_compile, bench_dispatch);
criterion_main!(benches);
