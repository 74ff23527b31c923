// Copyright 2026 stowage Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Compare [`Sequence`] with [`VecDeque`] on queue, stack and middle-insertion workloads.

use std::{collections::VecDeque, hint::black_box};

use criterion::{criterion_group, criterion_main, Criterion};
use stowage_sequence::Sequence;

const N: u64 = 10_000;

fn bench_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue");
    group.bench_function("sequence", |b| {
        b.iter(|| {
            let mut sequence = Sequence::with_capacity(4);
            for i in 0..N {
                sequence.enqueue(i).unwrap();
            }
            while let Some(i) = sequence.try_dequeue() {
                black_box(i);
            }
        })
    });
    group.bench_function("vec_deque", |b| {
        b.iter(|| {
            let mut deque = VecDeque::with_capacity(4);
            for i in 0..N {
                deque.push_back(i);
            }
            while let Some(i) = deque.pop_front() {
                black_box(i);
            }
        })
    });
    group.finish();
}

fn bench_stack(c: &mut Criterion) {
    let mut group = c.benchmark_group("stack");
    group.bench_function("sequence", |b| {
        b.iter(|| {
            let mut sequence = Sequence::stack();
            for i in 0..N {
                sequence.push(i).unwrap();
            }
            while let Some(i) = sequence.try_pop() {
                black_box(i);
            }
        })
    });
    group.bench_function("vec_deque", |b| {
        b.iter(|| {
            let mut deque = VecDeque::new();
            for i in 0..N {
                deque.push_front(i);
            }
            while let Some(i) = deque.pop_front() {
                black_box(i);
            }
        })
    });
    group.finish();
}

fn bench_insert_middle(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_middle");
    group.bench_function("sequence", |b| {
        b.iter(|| {
            let mut sequence = Sequence::new();
            for i in 0..N / 10 {
                sequence.insert(sequence.len() / 3, i).unwrap();
            }
            black_box(sequence.len())
        })
    });
    group.bench_function("vec_deque", |b| {
        b.iter(|| {
            let mut deque = VecDeque::new();
            for i in 0..N / 10 {
                deque.insert(deque.len() / 3, i);
            }
            black_box(deque.len())
        })
    });
    group.finish();
}

criterion_group!(benches, bench_queue, bench_stack, bench_insert_middle);
criterion_main!(benches);
