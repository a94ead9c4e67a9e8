//! This bench measures the route tree at its worst: identifiers inserted in
//! increasing order, so every node only has a right child.

#![allow(missing_docs)]

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use routeledger::{Endpoint, Route, RouteData, RouteId, RouteName, RouteTree};

const ROUTES: u64 = 2_000;

fn route(id: u64) -> Route {
    Route::new(
        RouteId::new(id).unwrap(),
        RouteData {
            name: RouteName::new(format!("route {id}")).unwrap(),
            distance_km: 10.0,
            origin: Endpoint::new("A"),
            destination: Endpoint::new("B"),
            capacity: 100.0,
            current_load: 50.0,
        },
    )
}

fn degenerate(n: u64) -> RouteTree {
    let mut tree = RouteTree::with_capacity(usize::try_from(n).unwrap());
    for id in 1..=n {
        tree.insert(route(id)).unwrap();
    }
    tree
}

fn insert_increasing(c: &mut Criterion) {
    c.bench_function("insert increasing ids", |b| {
        b.iter(|| degenerate(ROUTES));
    });
}

fn delete_from_root(c: &mut Criterion) {
    c.bench_function("delete every route from the root", |b| {
        b.iter_batched(
            || degenerate(ROUTES),
            |mut tree| {
                for id in 1..=ROUTES {
                    tree.delete(RouteId::new(id).unwrap()).unwrap();
                }
                tree
            },
            BatchSize::SmallInput,
        );
    });
}

fn find_deepest(c: &mut Criterion) {
    let tree = degenerate(ROUTES);
    let deepest = RouteId::new(ROUTES).unwrap();
    c.bench_function("find deepest by id", |b| {
        b.iter(|| tree.find_by_id(deepest).is_some());
    });
    c.bench_function("find deepest by name", |b| {
        b.iter(|| tree.find_by_name("ROUTE 2000").is_some());
    });
}

criterion_group!(benches, insert_increasing, delete_from_root, find_deepest);
criterion_main!(benches);
