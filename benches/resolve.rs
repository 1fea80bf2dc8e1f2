use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use edge_router::config::{MethodKey, RouteEntry, RouteTable};
use edge_router::router::Router;
use http::Method;

fn route_table() -> RouteTable {
    let mut table = RouteTable::new()
        .route(Method::GET, "/", "Home", "index")
        .route(Method::GET, "/user/view/1", "User", "first")
        .route(Method::GET, "/user/view/:id", "User", "view")
        .route(Method::GET, "/user/display/:id/*", "User", "display")
        .route(Method::GET, "/user/load/*", "User", "load")
        .route(Method::POST, "/user/edit/:id", "User", "save")
        .route(MethodKey::Any, "/api/:version/:resource/:id", "Api", "dispatch");
    for i in 0..50 {
        table.insert(
            Method::GET,
            RouteEntry::new(format!("/section{i}/:id/items/:item"), "Section", "item"),
        );
    }
    table
}

fn bench_resolve(c: &mut Criterion) {
    let router = Router::new(route_table()).expect("routes compile");

    c.bench_function("resolve_exact", |b| {
        b.iter(|| black_box(router.resolve(&Method::GET, black_box("/user/view/1"))))
    });
    c.bench_function("resolve_placeholder", |b| {
        b.iter(|| black_box(router.resolve(&Method::GET, black_box("/user/view/42"))))
    });
    c.bench_function("resolve_greedy", |b| {
        b.iter(|| {
            black_box(router.resolve(&Method::GET, black_box("/user/display/5/extra/more")))
        })
    });
    c.bench_function("resolve_last_of_many", |b| {
        b.iter(|| black_box(router.resolve(&Method::GET, black_box("/section49/7/items/3"))))
    });
    c.bench_function("resolve_wildcard_fallback", |b| {
        b.iter(|| black_box(router.resolve(&Method::PUT, black_box("/api/v1/users/9"))))
    });
    c.bench_function("resolve_miss", |b| {
        b.iter(|| black_box(router.resolve(&Method::GET, black_box("/does/not/exist"))))
    });
}

fn bench_link(c: &mut Criterion) {
    let router = Router::new(route_table()).expect("routes compile");

    c.bench_function("create_link", |b| {
        b.iter(|| {
            black_box(router.create_link(
                "Section",
                "item",
                black_box(&[("id", "7"), ("item", "3"), ("anchor", "#top")]),
                &Method::GET,
            ))
        })
    });
}

criterion_group!(benches, bench_resolve, bench_link);
criterion_main!(benches);
