//! Benchmarks of the 2D Delaunay triangulation.

use cgmath::Point3;
use criterion::{
    criterion_group, criterion_main, black_box, Criterion,
};

use vizmesh::algo::Delaunay2D;


/// Pseudo random points in the unit square (z = 0).
fn scattered(n: usize) -> Vec<Point3<f64>> {
    let mut seed = 0x9E37_79B9_7F4A_7C15u64;
    let mut next = move || {
        seed ^= seed >> 12;
        seed ^= seed << 25;
        seed ^= seed >> 27;
        (seed.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 11) as f64 / (1u64 << 53) as f64
    };

    (0..n).map(|_| Point3::new(next(), next(), 0.0)).collect()
}


// ===============================================================================================
// ===== Benchmarks
// ===============================================================================================

fn triangulate_1k(c: &mut Criterion) {
    c.bench_function(
        "triangulate_1k",
        |b| {
            let points = scattered(1_000);
            b.iter(|| Delaunay2D::default().triangulate(black_box(&points)).unwrap())
        },
    );
}

fn triangulate_10k(c: &mut Criterion) {
    c.bench_function(
        "triangulate_10k",
        |b| {
            let points = scattered(10_000);
            b.iter(|| Delaunay2D::default().triangulate(black_box(&points)).unwrap())
        },
    );
}

fn triangulate_alpha_10k(c: &mut Criterion) {
    c.bench_function(
        "triangulate_alpha_10k",
        |b| {
            let points = scattered(10_000);
            let config = Delaunay2D {
                alpha: 0.01,
                .. Delaunay2D::default()
            };
            b.iter(|| config.triangulate(black_box(&points)).unwrap())
        },
    );
}


criterion_group!(benches,
    triangulate_1k,
    triangulate_10k,
    triangulate_alpha_10k,
);
criterion_main!(benches);
