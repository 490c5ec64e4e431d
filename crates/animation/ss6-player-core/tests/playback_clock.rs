use std::cell::RefCell;
use std::rc::Rc;

use ss6_player::{Config, Player};
use ss6_test_fixtures::{counting_project, project, MemoryProject};

fn timing_player(end: i32, fps: f64) -> Player {
    project(MemoryProject::timing_only(0, end, fps))
        .create_player_for("pack", "anim")
        .expect("timing animation exists")
}

#[test]
fn two_loops_in_one_update_end_once_at_start() {
    let mut p = timing_player(9, 30.0);
    let ends = Rc::new(RefCell::new(0));
    let seen = ends.clone();
    p.on_play_end(move |player| {
        assert!(!player.is_playing());
        *seen.borrow_mut() += 1;
    });
    p.set_loops(2);
    p.play(None);
    p.update(1000.0);

    assert!(!p.is_playing());
    assert_eq!(p.frame_no(), 0);
    assert_eq!(p.loops(), 0);
    assert_eq!(*ends.borrow(), 1);

    // nothing more happens once stopped
    p.update(1000.0);
    assert_eq!(*ends.borrow(), 1);
    assert_eq!(p.frame_no(), 0);
}

#[test]
fn catch_up_delivers_user_data_for_every_crossed_frame() {
    let data = MemoryProject::timing_only(0, 9, 10.0).with_user_data("pack", "anim", &[0, 2, 3, 4, 7]);
    let mut p = project(data).create_player_for("pack", "anim").unwrap();
    let frames = Rc::new(RefCell::new(Vec::new()));
    let sink = frames.clone();
    p.on_user_data(move |ud| sink.borrow_mut().push(ud.frame));

    p.play(None);
    assert_eq!(*frames.borrow(), vec![0]);

    p.update(400.0);
    assert_eq!(*frames.borrow(), vec![0, 2, 3, 4]);
    assert_eq!(p.frame_no(), 4);
}

#[test]
fn frame_stays_within_section_across_uneven_updates() {
    let mut p = timing_player(9, 24.0);
    p.set_animation_section(Some(2), Some(7), None);
    p.play(None);
    for (i, elapsed) in [13.0, 41.7, 250.0, 0.5, 999.9, 33.3, 1234.5, 16.6]
        .iter()
        .cycle()
        .take(64)
        .enumerate()
    {
        p.update(*elapsed);
        let f = p.frame_no();
        assert!((2..=7).contains(&f), "update {i}: frame {f} left section");
    }
    assert!(p.is_playing());
}

#[test]
fn idle_player_resolves_without_advancing() {
    let mut p = timing_player(9, 30.0);
    assert!(!p.is_playing());
    p.update(5000.0);
    assert_eq!(p.frame_no(), 0);

    p.set_frame(6.0);
    p.update(5000.0);
    assert_eq!(p.frame_no(), 6);
}

#[test]
fn tick_converts_timestamps_into_deltas() {
    let mut p = timing_player(9, 10.0);
    p.play(None);
    p.tick(1_000.0);
    assert_eq!(p.frame_no(), 0);
    p.tick(1_100.0);
    assert_eq!(p.frame_no(), 1);
    p.tick(1_350.0);
    assert_eq!(p.frame_no(), 3);
}

#[test]
fn backward_play_starts_at_end_and_wraps() {
    let mut p = timing_player(9, 10.0);
    p.set_play_direction(-1);
    p.play(None);
    assert_eq!(p.frame_no(), 9);
    p.update(100.0);
    assert_eq!(p.frame_no(), 8);
    p.update(900.0);
    assert_eq!(p.frame_no(), 9);
    assert!(p.is_playing());
}

#[test]
fn finishing_without_rewind_holds_last_frame() {
    let mut p = timing_player(9, 10.0);
    p.set_loops(1);
    p.play(None);
    p.update_with_rewind(5000.0, false);
    assert!(!p.is_playing());
    assert_eq!(p.frame_no(), 9);

    p.set_play_direction(-1);
    p.play(None);
    p.update_with_rewind(5000.0, false);
    assert_eq!(p.frame_no(), 0);
}

#[test]
fn backward_finite_loops_rewind_to_end() {
    let mut p = timing_player(9, 10.0);
    p.set_play_direction(-1);
    p.set_loops(2);
    p.play(None);
    p.update(5000.0);
    assert!(!p.is_playing());
    assert_eq!(p.frame_no(), p.end_frame());
    assert_eq!(p.frame_no(), 9);
}

#[test]
fn non_finite_delta_leaves_the_clock_usable() {
    let mut p = timing_player(9, 10.0);
    p.set_animation_section(Some(3), Some(9), None);
    p.play(None);
    p.update(f64::NAN);
    p.update(f64::INFINITY);
    assert_eq!(p.frame_no(), 3);

    p.update(100.0);
    p.update(100.0);
    assert_eq!(p.frame_no(), 5);
    assert!(p.current_frame().is_finite());
}

#[test]
fn play_end_callback_can_start_the_next_pass() {
    let mut p = timing_player(4, 10.0);
    let ends = Rc::new(RefCell::new(0));
    let seen = ends.clone();
    p.on_play_end(move |player| {
        *seen.borrow_mut() += 1;
        player.set_loops(-1);
        player.play(Some(2.0));
    });
    p.set_loops(1);
    p.play(None);
    p.update(1000.0);

    assert_eq!(*ends.borrow(), 1);
    assert!(p.is_playing());
    assert_eq!(p.frame_no(), 2);
    p.update(100.0);
    assert_eq!(p.frame_no(), 3);
}

#[test]
fn config_can_disable_skipping() {
    let config = Config::from_json(r#"{ "skip_enabled": false }"#).unwrap();
    let (project, _) = counting_project(MemoryProject::timing_only(0, 9, 10.0), config);
    let mut p = project.create_player_for("pack", "anim").unwrap();
    assert!(!p.skip_enabled());
    p.play(None);
    p.update(500.0);
    assert_eq!(p.frame_no(), 1);
}

#[test]
fn section_with_loop_count_rewinds_to_section_start() {
    let mut p = timing_player(9, 10.0);
    p.set_animation_section(Some(2), Some(5), Some(1));
    p.play(None);
    assert_eq!(p.frame_no(), 2);
    p.update(10_000.0);
    assert!(!p.is_playing());
    assert_eq!(p.frame_no(), 2);
    assert_eq!((p.start_frame(), p.end_frame()), (2, 5));
}

#[test]
fn pause_and_resume() {
    let mut p = timing_player(9, 10.0);
    p.play(None);
    p.pause();
    assert!(p.is_pausing());
    p.update(300.0);
    assert_eq!(p.frame_no(), 0);
    p.resume();
    p.update(300.0);
    assert_eq!(p.frame_no(), 3);
    p.stop();
    assert!(!p.is_playing());
    p.update(300.0);
    assert_eq!(p.frame_no(), 3);
}

#[test]
fn zero_fps_resolves_but_never_advances() {
    let mut p = timing_player(9, 0.0);
    assert_eq!(p.frame_duration_ms(), 0.0);
    p.play(Some(4.0));
    p.update(10_000.0);
    assert!(p.is_playing());
    assert_eq!(p.frame_no(), 4);
}

#[test]
fn play_restores_loop_count() {
    let mut p = timing_player(4, 10.0);
    p.set_loops(1);
    p.play(None);
    p.update(1000.0);
    assert!(!p.is_playing());
    p.play(None);
    assert!(p.is_playing());
    assert_eq!(p.loops(), 1);
}
