use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sheetsync::host::memory::MemorySession;
use sheetsync::net::{match_segment, MatchOptions};
use sheetsync::prelude::*;

fn p(x: i32, y: i32) -> Point {
    Point::new(x, y)
}

/// Sheet "2" holding a drawn divider, ready to be copied
fn divider_session() -> MemorySession {
    let mut session = MemorySession::with_blank_sheet("Schematic1", "1");
    session.insert_sheet("Schematic1", "2").unwrap();
    session.activate("Schematic1", "2");
    SheetSyncCore::draw_voltage_divider(&mut session, DividerOptions::default(), &SyncConfig::default()).unwrap();
    session
}

fn bench_match_segment(c: &mut Criterion) {
    let candidates: Vec<(i32, Span)> = (0..200)
        .map(|i| (i, Span::new(p(i * 10, 0), p(i * 10, 100))))
        .collect();
    let options = MatchOptions::default();
    let recorded = Span::new(p(5000, 0), p(5000, 100));

    c.bench_function("match_segment_nearest", |b| {
        b.iter(|| match_segment(black_box(&candidates), black_box(&recorded), black_box(p(1234, 50)), &options));
    });
}

fn bench_direct_copy(c: &mut Criterion) {
    let config = SyncConfig::default();

    c.bench_function("copy_sheet_direct", |b| {
        b.iter_batched(
            divider_session,
            |mut session| SheetSyncCore::copy_sheet_direct(&mut session, CopyOptions::default(), black_box(&config)),
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_match_segment, bench_direct_copy);
criterion_main!(benches);
