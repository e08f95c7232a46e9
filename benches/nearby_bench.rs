use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::{Vec2, Vec3};
use snappick::codec::{SnapCategory, SnapIdCodec};
use snappick::nearby::collect_ids;
use snappick::proxy::{build_proxies, ProxyExtents};
use snappick::snap::Snap;
use snappick::viewport::{PixelRect, ReadbackTicket, TileReadback};

fn tile(side: u32) -> TileReadback {
    // Sparse sprites: one 3x3 block of ids every 8 pixels.
    let pixels = (0..side * side)
        .map(|i| {
            let (x, y) = (i % side, i / side);
            if x % 8 < 3 && y % 8 < 3 {
                1 + (x / 8) + (y / 8) * side
            } else {
                0
            }
        })
        .collect();
    TileReadback {
        ticket: ReadbackTicket {
            generation: 0,
            epoch: 0,
            serial: 0,
            center: Vec2::splat(side as f32 * 0.5),
        },
        rect: PixelRect { x: 0, y: 0, width: side, height: side },
        pixels,
    }
}

fn collect_ids_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("collect_ids");
    for side in [20, 60, 120] {
        let readback = tile(side);
        let center = readback.ticket.center;
        let radius = side as f32 * 0.5;
        group.bench_function(format!("{side}px_tile"), |b| {
            b.iter(|| black_box(collect_ids(black_box(&readback), center, radius)));
        });
    }
    group.finish();
}

fn build_proxies_benchmark(c: &mut Criterion) {
    let snaps: Vec<Snap> = (0..10_000)
        .map(|i| match i % 3 {
            0 => Snap::point(Vec3::splat(i as f32)),
            1 => Snap::axis(Vec3::splat(i as f32), Vec3::X),
            _ => Snap::construction_plane(Vec3::splat(i as f32), Vec3::Z),
        })
        .collect();
    let codec = SnapIdCodec::Production;
    c.bench_function("build_10k_proxies", |b| {
        b.iter(|| {
            black_box(build_proxies(black_box(&snaps), ProxyExtents::default(), |i| {
                codec.encode(SnapCategory::Registry, i)
            }))
        });
    });
}

criterion_group!(benches, collect_ids_benchmark, build_proxies_benchmark);
criterion_main!(benches);
