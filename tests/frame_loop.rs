//! The frame loop keeps exactly one request outstanding per active mode.

mod common;

use common::{fire, test_loop};
use greeting_visualizer::{ModeSwitch, RenderMode};

#[test]
fn nothing_is_scheduled_before_a_mode_is_set() {
    let frames = test_loop();
    assert_eq!(frames.mode(), None);
    assert!(frames.scheduler().live().is_empty());
    assert_eq!(fire(&frames, 16.0), 0);
    assert!(frames.painter_mut().frames.is_empty());
}

#[test]
fn each_tick_reschedules_itself() {
    let frames = test_loop();
    frames.switch_to(RenderMode::Idle);

    for n in 1..=5 {
        assert_eq!(fire(&frames, n as f64 * 16.0), 1);
        assert_eq!(frames.scheduler().live().len(), 1);
    }
    let painted = frames.painter_mut().frames.clone();
    assert_eq!(painted.len(), 5);
    assert!(painted.iter().all(|(mode, _)| *mode == RenderMode::Idle));
    assert_eq!(painted[4].1, 80.0);
}

#[test]
fn mode_switches_never_leave_two_requests_live() {
    let frames = test_loop();
    let sequence = [
        RenderMode::Idle,
        RenderMode::Active,
        RenderMode::Active,
        RenderMode::Idle,
        RenderMode::Active,
        RenderMode::Idle,
    ];
    for (n, mode) in sequence.into_iter().enumerate() {
        frames.switch_to(mode);
        assert_eq!(frames.scheduler().live().len(), 1, "after switch {n}");
        assert_eq!(frames.pending(), frames.scheduler().live().first().copied());

        assert_eq!(fire(&frames, n as f64), 1);
        assert_eq!(frames.scheduler().live().len(), 1, "after tick {n}");
    }

    // every frame drew the mode selected just before it
    let painted: Vec<RenderMode> = frames.painter_mut().frames.iter().map(|(mode, _)| *mode).collect();
    assert_eq!(painted, sequence.to_vec());
    // each switch after the first cancelled the previous request
    assert_eq!(frames.scheduler().cancelled.borrow().len(), sequence.len() - 1);
}

#[test]
fn switching_mid_frame_cancels_the_pending_request() {
    let frames = test_loop();
    frames.switch_to(RenderMode::Active);
    let stale = frames.pending().unwrap();
    frames.switch_to(RenderMode::Idle);

    assert!(frames.scheduler().cancelled.borrow().contains(&stale));
    assert!(!frames.scheduler().live().contains(&stale));
    fire(&frames, 1.0);
    assert_eq!(frames.painter_mut().frames, vec![(RenderMode::Idle, 1.0)]);
}

#[test]
fn halt_stops_the_loop() {
    let frames = test_loop();
    frames.switch_to(RenderMode::Active);
    fire(&frames, 1.0);
    frames.halt();

    assert_eq!(frames.mode(), None);
    assert_eq!(frames.pending(), None);
    assert!(frames.scheduler().live().is_empty());
    assert_eq!(fire(&frames, 2.0), 0);
    assert_eq!(frames.painter_mut().frames.len(), 1);
}

#[test]
fn paint_errors_do_not_stop_the_loop() {
    let frames = test_loop();
    frames.painter_mut().fail = true;
    frames.switch_to(RenderMode::Active);

    for n in 0..3 {
        assert_eq!(fire(&frames, n as f64), 1);
    }
    assert_eq!(frames.painter_mut().frames.len(), 3);
    assert_eq!(frames.scheduler().live().len(), 1);

    frames.painter_mut().fail = false;
    fire(&frames, 3.0);
    assert_eq!(frames.painter_mut().frames.len(), 4);
}

#[test]
fn failed_request_leaves_nothing_pending() {
    let frames = test_loop();
    frames.scheduler().failing.set(true);
    frames.switch_to(RenderMode::Idle);

    assert_eq!(frames.pending(), None);
    assert_eq!(frames.mode(), Some(RenderMode::Idle));

    // a later switch retries
    frames.scheduler().failing.set(false);
    frames.switch_to(RenderMode::Idle);
    assert!(frames.pending().is_some());
}
