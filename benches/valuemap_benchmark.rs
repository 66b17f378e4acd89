// The benchmarks aim to only measure times of the operations in their names.
// That's why all use Bencher::iter_batched which enables non-benchmarked
// preparation before running the measured function.
// Set and get have benchmarks with empty values and with custom structs of
// 42 64-bit integers, since the single-shot get clones the value out.
// The counts of set/searched elements are chosen at random from constant
// ranges in an attempt to avoid a single count performing better because of
// specific HW features of computers the code is benchmarked with.

extern crate criterion;
extern crate rand;
extern crate valuemap;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::Rng;
use valuemap::ValueMap;

// ranges of counts for different benchmarks (MINs are inclusive, MAXes exclusive):
const SET_COUNT_MIN: usize = 120;
const SET_COUNT_MAX: usize = 140;
const INSERT_COUNT_FOR_SEARCH_MIN: usize = 120;
const INSERT_COUNT_FOR_SEARCH_MAX: usize = 140;
const SEARCH_COUNT_MIN: usize = 120;
const SEARCH_COUNT_MAX: usize = 140;
const MERGE_COUNT_MIN: usize = 340;
const MERGE_COUNT_MAX: usize = 360;
// In the search benches, we randomly search for elements of a range of SEARCH_SIZE_NUMERATOR / SEARCH_SIZE_DENOMINATOR
// times the number of elements contained.
const SEARCH_SIZE_NUMERATOR: usize = 4;
const SEARCH_SIZE_DENOMINATOR: usize = 3;

pub fn set_empty_value(c: &mut Criterion) {
    c.bench_function("set_empty_value", |b| {
        b.iter_batched(
            || prepare_set(()),
            |(map, list)| set_vec(&map, list),
            BatchSize::SmallInput,
        )
    });
}

pub fn set_struct_value(c: &mut Criterion) {
    c.bench_function("set_struct_value", |b| {
        b.iter_batched(
            || prepare_set(Struct::default()),
            |(map, list)| set_vec(&map, list),
            BatchSize::SmallInput,
        )
    });
}

pub fn set_struct_value_txn(c: &mut Criterion) {
    c.bench_function("set_struct_value_txn", |b| {
        b.iter_batched(
            || prepare_set(Struct::default()),
            |(map, list)| {
                let mut write_txn = map.write();
                for (key, val) in list.into_iter() {
                    write_txn.set(key, val);
                }
            },
            BatchSize::SmallInput,
        )
    });
}

pub fn get_empty_value(c: &mut Criterion) {
    c.bench_function("get_empty_value", |b| {
        b.iter_batched(
            || prepare_search(()),
            |(ref map, ref list)| get_vec(map, list),
            BatchSize::SmallInput,
        )
    });
}

pub fn get_struct_value(c: &mut Criterion) {
    c.bench_function("get_struct_value", |b| {
        b.iter_batched(
            || prepare_search(Struct::default()),
            |(ref map, ref list)| get_vec(map, list),
            BatchSize::SmallInput,
        )
    });
}

pub fn get_struct_value_txn(c: &mut Criterion) {
    c.bench_function("get_struct_value_txn", |b| {
        b.iter_batched(
            || prepare_search(Struct::default()),
            |(ref map, ref list)| {
                let read_txn = map.read();
                for i in list.iter() {
                    black_box(read_txn.get(black_box(i)));
                }
            },
            BatchSize::SmallInput,
        )
    });
}

pub fn merge_struct_value(c: &mut Criterion) {
    c.bench_function("merge_struct_value", |b| {
        b.iter_batched(
            || prepare_merge(Struct::default()),
            |(ref dst, ref src)| dst.merge(src),
            BatchSize::SmallInput,
        )
    });
}

pub fn clone_struct_value(c: &mut Criterion) {
    c.bench_function("clone_struct_value", |b| {
        b.iter_batched(
            || prepare_merge(Struct::default()).1,
            |ref map| black_box(map.clone()),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(set, set_empty_value, set_struct_value, set_struct_value_txn);
criterion_group!(get, get_empty_value, get_struct_value, get_struct_value_txn);
criterion_group!(bulk, merge_struct_value, clone_struct_value);
criterion_main!(set, get, bulk);

// Utility functions:

fn set_vec<V: Clone>(map: &ValueMap<u32, V>, list: Vec<(u32, V)>) {
    for (key, val) in list.into_iter() {
        map.set(key, val);
    }
}

fn get_vec<V: Clone>(map: &ValueMap<u32, V>, list: &[u32]) {
    for i in list.iter() {
        black_box(map.get(black_box(i)));
    }
}

#[derive(Default, Clone)]
#[allow(dead_code)]
struct Struct {
    var1: i64,
    var2: i64,
    var3: i64,
    var4: i64,
    var5: i64,
    var6: i64,
    var7: i64,
    var8: i64,
    var9: i64,
    var10: i64,
    var11: i64,
    var12: i64,
    var13: i64,
    var14: i64,
    var15: i64,
    var16: i64,
    var17: i64,
    var18: i64,
    var19: i64,
    var20: i64,
    var21: i64,
    var22: i64,
    var23: i64,
    var24: i64,
    var25: i64,
    var26: i64,
    var27: i64,
    var28: i64,
    var29: i64,
    var30: i64,
    var31: i64,
    var32: i64,
    var33: i64,
    var34: i64,
    var35: i64,
    var36: i64,
    var37: i64,
    var38: i64,
    var39: i64,
    var40: i64,
    var41: i64,
    var42: i64,
}

fn prepare_set<V: Clone>(value: V) -> (ValueMap<u32, V>, Vec<(u32, V)>) {
    let mut rng = rand::rng();
    let count = rng.random_range(SET_COUNT_MIN..SET_COUNT_MAX);
    let mut list = Vec::with_capacity(count);
    for _ in 0..count {
        list.push((
            rng.random_range(0..SET_COUNT_MAX << 8) as u32,
            value.clone(),
        ));
    }
    (ValueMap::new(), list)
}

fn prepare_search<V: Clone>(value: V) -> (ValueMap<u32, V>, Vec<u32>) {
    let mut rng = rand::rng();
    let insert_count = rng.random_range(INSERT_COUNT_FOR_SEARCH_MIN..INSERT_COUNT_FOR_SEARCH_MAX);
    let search_limit = insert_count * SEARCH_SIZE_NUMERATOR / SEARCH_SIZE_DENOMINATOR;
    let search_count = rng.random_range(SEARCH_COUNT_MIN..SEARCH_COUNT_MAX);

    // Create a map with elements 0 through insert_count(-1)
    let map: ValueMap<u32, V> = (0..insert_count as u32)
        .map(|k| (k, value.clone()))
        .collect();

    // Choose 'search_count' numbers from [0,search_limit) randomly to be searched in the created map.
    let mut list = Vec::with_capacity(search_count);
    for _ in 0..search_count {
        list.push(rng.random_range(0..search_limit as u32));
    }
    (map, list)
}

/// Prepares two maps that overlap in roughly half their keys.
fn prepare_merge<V: Clone>(value: V) -> (ValueMap<u32, V>, ValueMap<u32, V>) {
    let mut rng = rand::rng();
    let count = rng.random_range(MERGE_COUNT_MIN..MERGE_COUNT_MAX) as u32;
    let dst = (0..count).map(|k| (k, value.clone())).collect();
    let src = (count / 2..count + count / 2)
        .map(|k| (k, value.clone()))
        .collect();
    (dst, src)
}
