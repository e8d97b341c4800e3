#![deny(warnings)]

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use rasterize_svg::*;
use std::hint::black_box;

const SQUIRREL: &str = "M12 1C5.925 1 1 5.925 1 12s4.925 11 11 11 11-4.925 11-11S18.075 1 12 1zm0 \
    2.5c1.5 0 2.75 1.25 2.75 2.75S13.5 9 12 9 9.25 7.75 9.25 6.25 10.5 3.5 12 3.5zM6.5 \
    17.5c0-3 2.5-5.5 5.5-5.5s5.5 2.5 5.5 5.5v.5h-11v-.5zm14-8l-3 3 3 3v-6zm-17 0v6l3-3-3-3z";

fn path_data(count: usize) -> String {
    let mut data = String::new();
    for index in 0..count {
        data.push_str(&format!("M{} 0 ", index * 24));
        data.push_str(SQUIRREL.trim_start_matches("M12 1"));
        data.push(' ');
    }
    data
}

fn parse_benchmark(c: &mut Criterion) {
    let data = path_data(64);
    let path = PathData::parse(&data);
    let mut group = c.benchmark_group("path data");
    group
        .throughput(Throughput::Elements(path.commands().len() as u64))
        .bench_function("parse", |b| b.iter(|| PathData::parse(black_box(&data))))
        .bench_function("bbox", |b| b.iter(|| black_box(&path).bbox()));
    group.finish();
}

fn canvas_benchmark(c: &mut Criterion) {
    let path = PathData::parse(SQUIRREL);
    let mut canvas = Canvas::new(512, 512);
    canvas.scale(20.0, 20.0);
    canvas.set_fill_paint(RGBA::new(255, 128, 0, 255));
    canvas.set_stroke_paint(RGBA::new(0, 0, 0, 255));
    canvas.set_line_width(0.25);

    let mut group = c.benchmark_group("canvas");
    group
        .bench_function("fill", |b| {
            b.iter(|| {
                canvas.begin_path();
                path.trace(&mut canvas);
                canvas.fill(FillRule::NonZero);
            })
        })
        .bench_function("stroke", |b| {
            b.iter(|| {
                canvas.begin_path();
                path.trace(&mut canvas);
                canvas.stroke();
            })
        });
    group.finish();
}

criterion_group!(benches, parse_benchmark, canvas_benchmark);
criterion_main!(benches);
