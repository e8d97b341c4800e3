#![deny(warnings)]

use criterion::{Criterion, criterion_group, criterion_main};
use rasterize_svg::*;

const DOCUMENT: &str = r##"<svg width="256" height="256" viewBox="0 0 64 64">
    <defs>
        <linearGradient id="sky" x1="0" y1="0" x2="0" y2="1">
            <stop offset="0" stop-color="#4a90d9"/>
            <stop offset="1" stop-color="#ffffff"/>
        </linearGradient>
        <clipPath id="round"><circle cx="32" cy="32" r="30"/></clipPath>
        <symbol id="leaf" viewBox="0 0 10 10"><path d="M5 0Q10 5 5 10Q0 5 5 0z"/></symbol>
    </defs>
    <g clip-path="url(#round)">
        <rect width="64" height="64" fill="url(#sky)"/>
        <use href="#leaf" x="10" y="30" width="12" height="12" fill="#2e8b57"/>
        <use href="#leaf" x="40" y="34" width="10" height="10" fill="#3cb371"/>
        <ellipse cx="32" cy="56" rx="30" ry="8" fill="#8b5a2b" stroke="#5a3a1b" stroke-width="0.5"/>
    </g>
    <text x="32" y="12" font-size="6" text-anchor="middle">frame</text>
    <circle cx="12" cy="12" r="4" fill="#ffcc00">
        <animate attributeName="r" from="4" to="6" dur="2s" repeatCount="indefinite"/>
    </circle>
</svg>"##;

struct NoLoader;

impl ResourceLoader for NoLoader {
    fn load(&self, _url: &str, _cross_origin: bool) -> Result<Resource, Error> {
        Ok(Resource::Pending)
    }
}

fn frame_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");
    group
        .bench_function("parse", |b| {
            b.iter(|| Document::parse(DOCUMENT, &NoLoader, false).expect("valid document"))
        })
        .bench_function("draw", |b| {
            let mut renderer =
                Renderer::from_str(DOCUMENT, Options::default(), NoLoader).expect("valid document");
            b.iter(|| renderer.draw())
        })
        .bench_function("tick", |b| {
            let mut renderer =
                Renderer::from_str(DOCUMENT, Options::default(), NoLoader).expect("valid document");
            b.iter(|| renderer.tick(FRAME_INTERVAL))
        });
    group.finish();
}

criterion_group!(benches, frame_benchmark);
criterion_main!(benches);
