use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ss6_test_fixtures::load_project;

fn bench_update(c: &mut Criterion) {
    let project = load_project("quads").expect("quads fixture");
    let mut player = project
        .create_player_for("character", "idle")
        .expect("idle animation");
    player.play(None);
    c.bench_function("player_update_quads_16ms", |b| {
        b.iter(|| {
            player.update(black_box(16.0));
            black_box(player.frame_no());
        })
    });

    let project = load_project("nested").expect("nested fixture");
    let mut player = project
        .create_player_for("scene", "main")
        .expect("main animation");
    player.play(None);
    c.bench_function("player_update_nested_16ms", |b| {
        b.iter(|| {
            player.update(black_box(16.0));
            black_box(player.frame_no());
        })
    });
}

criterion_group!(benches, bench_update);
criterion_main!(benches);
