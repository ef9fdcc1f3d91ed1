//! Criterion benchmarks for frame painting and payload validation.
//!
//! Run with:
//!   cargo bench -p mazeview
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;

use mazeview::protocol::{Grid, Position, Snapshot};
use mazeview::render::{paint_frame, Palette};
use mazeview::surface::RecordingSurface;
use mazeview::validate::validate;
use mazeview::view::GameView;

fn view_of(width: usize, height: usize) -> GameView {
    let mut view = GameView::new();
    view.replace(Snapshot {
        grid: Grid::bordered(width, height),
        player: Position::new(1, 1),
        goal: Position::new(width as i64 - 2, height as i64 - 2),
        score: 0,
        game_over: false,
        won: false,
    });
    view
}

fn payload_of(width: usize, height: usize) -> String {
    let cells: Vec<Vec<u8>> = (0..height)
        .map(|y| {
            (0..width)
                .map(|x| u8::from(x == 0 || y == 0 || x + 1 == width || y + 1 == height))
                .collect()
        })
        .collect();
    json!({
        "maze": {"cells": cells, "width": width, "height": height},
        "player_x": 1, "player_y": 1,
        "goal_x": width - 2, "goal_y": height - 2,
        "score": 0, "game_over": false, "won": false,
    })
    .to_string()
}

/// Paint one frame at several grid sizes, with and without grid lines.
fn bench_paint(c: &mut Criterion) {
    let mut group = c.benchmark_group("paint_frame");
    let palette = Palette::default();

    for (w, h) in [(20, 15), (40, 30), (80, 60)] {
        let view = view_of(w, h);
        group.throughput(Throughput::Elements((w * h) as u64));
        for grid_lines in [false, true] {
            let id = format!("{w}x{h}/{}", if grid_lines { "lines" } else { "plain" });
            group.bench_function(BenchmarkId::from_parameter(id), |b| {
                let mut surface = RecordingSurface::new(640.0, 480.0);
                b.iter(|| {
                    surface.take_ops();
                    paint_frame(&mut surface, black_box(&view), grid_lines, &palette)
                })
            });
        }
    }

    group.finish();
}

/// Validate a full snapshot payload.
fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");

    for (w, h) in [(20, 15), (80, 60)] {
        let raw = payload_of(w, h);
        group.throughput(Throughput::Bytes(raw.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(format!("{w}x{h}")), &raw, |b, raw| {
            b.iter(|| validate(black_box(raw)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_paint, bench_validate);
criterion_main!(benches);
