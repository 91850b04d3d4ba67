mod common;

use common::Harness;
use luapad_core::{CoroutineStatus, DiagnosticKind, DrawCmd};

const FRAME_LOOP: &str = r#"
while true do
  drawRect(0, 0, 1, 1, 0xff0000)
  update()
end
"#;

#[test]
fn test_script_without_yield_completes_after_one_resume() {
    let mut h = Harness::new();
    h.run("drawRect(0, 0, 10, 10, 0xffffff)");

    assert_eq!(h.manager.status(), Some(CoroutineStatus::Completed));
    assert_eq!(h.manager.resumes(), 1);
    assert_eq!(h.draw_count(), 1);

    h.tick_frames(0, 5);
    assert_eq!(h.manager.resumes(), 1);
}

#[test]
fn test_frame_yield_resumes_once_per_tick() {
    let mut h = Harness::new();
    h.run(FRAME_LOOP);

    assert_eq!(h.manager.status(), Some(CoroutineStatus::Suspended));
    assert_eq!(h.manager.resumes(), 1);
    assert_eq!(h.draw_count(), 1);

    for frame in 1..=10u64 {
        assert!(h.tick(frame * 16));
        assert_eq!(h.manager.resumes(), 1 + frame);
        assert_eq!(h.draw_count() as u64, 1 + frame);
        assert_eq!(h.manager.status(), Some(CoroutineStatus::Suspended));
    }

    let yields = h.manager.current().unwrap().coroutine().yields();
    assert_eq!(yields, 11);
}

#[test]
fn test_sleep_waits_for_scheduled_timer() {
    let mut h = Harness::new();
    h.run("sleep(0.5) drawRect(0, 0, 1, 1, 0xffffff)");

    assert_eq!(h.manager.status(), Some(CoroutineStatus::Suspended));
    assert_eq!(h.manager.next_deadline(), Some(h.at(500)));
    assert_eq!(h.manager.pending_timers(), 1);

    // Render ticks before the deadline never resume a sleeping coroutine
    for ms in [16, 100, 250, 400, 499] {
        assert!(!h.tick(ms));
        assert_eq!(h.draw_count(), 0);
    }
    assert!(!h.manager.fire_timers(h.at(499)));

    assert!(h.manager.fire_timers(h.at(500)));
    assert_eq!(h.draw_count(), 1);
    assert_eq!(h.manager.status(), Some(CoroutineStatus::Completed));
    assert_eq!(h.manager.next_deadline(), None);
}

#[test]
fn test_due_timer_resumes_on_render_tick() {
    let mut h = Harness::new();
    h.run("sleep(0.1) drawRect(0, 0, 1, 1, 0xffffff) update() drawRect(0, 0, 1, 1, 0xffffff)");

    // The timer resume and the following frame resume never share a tick
    assert!(h.tick(112));
    assert_eq!(h.draw_count(), 1);
    assert_eq!(h.manager.resumes(), 2);
    assert_eq!(h.manager.status(), Some(CoroutineStatus::Suspended));

    assert!(h.tick(128));
    assert_eq!(h.draw_count(), 2);
    assert_eq!(h.manager.status(), Some(CoroutineStatus::Completed));
}

#[test]
fn test_negative_sleep_resumes_on_next_timer_check() {
    let mut h = Harness::new();
    h.run("sleep(-3) drawRect(0, 0, 1, 1, 0)");

    assert_eq!(h.manager.next_deadline(), Some(h.at(0)));
    assert!(h.manager.fire_timers(h.at(0)));
    assert_eq!(h.draw_count(), 1);
}

#[test]
fn test_replaced_session_timer_never_fires() {
    let mut h = Harness::new();
    h.run("sleep(1) drawRect(0, 0, 1, 1, 0xff0000)");
    let first = h.manager.current_id().unwrap();

    let now = h.at(200);
    let second = h
        .manager
        .run_source(FRAME_LOOP.replace("drawRect", "drawCircle").as_str(), "b.lua", now)
        .unwrap();
    assert_ne!(first, second);
    assert_eq!(h.manager.pending_timers(), 0);

    assert!(!h.manager.fire_timers(h.at(2000)));
    h.tick_frames(200, 10);

    let stale = h
        .commands()
        .iter()
        .filter(|cmd| matches!(cmd, DrawCmd::Rect { .. }))
        .count();
    assert_eq!(stale, 0);
    assert!(h.log.is_empty());
}

#[test]
fn test_new_run_retires_previous_session_first() {
    let mut h = Harness::new();
    h.run(FRAME_LOOP);
    h.tick_frames(0, 3);
    assert_eq!(h.draw_count(), 4);

    let now = h.at(100);
    h.manager
        .run_source(
            "while true do drawCircle(5, 5, 2, 0x00ff00) update() end",
            "next.lua",
            now,
        )
        .unwrap();

    // The surface was reset before the new session's first resume
    assert_eq!(h.draw_count(), 1);
    h.tick_frames(100, 5);
    assert!(h
        .commands()
        .iter()
        .all(|cmd| matches!(cmd, DrawCmd::Circle { .. })));
    assert_eq!(h.manager.resumes(), 6);
}

#[test]
fn test_update_loop_with_empty_update_function() {
    let mut h = Harness::new();
    h.run(
        r#"
        function update() end
        while true do
          drawRect(0, 0, 4, 4, 0x00ff00)
          update()
        end
        "#,
    );

    assert_eq!(h.draw_count(), 1);
    assert_eq!(h.manager.status(), Some(CoroutineStatus::Suspended));

    h.tick_frames(0, 100);
    assert_eq!(h.draw_count(), 101);
    assert_eq!(h.manager.status(), Some(CoroutineStatus::Suspended));
}

#[test]
fn test_runtime_fault_after_three_yields() {
    let mut h = Harness::new();
    h.run(
        r#"
        local n = 0
        while true do
          n = n + 1
          if n > 3 then error("boom") end
          update()
        end
        "#,
    );

    let mut statuses = vec![h.manager.status().unwrap()];
    for frame in 1..=5 {
        h.tick(frame * 16);
        statuses.push(h.manager.status().unwrap());
    }

    use CoroutineStatus::*;
    assert_eq!(
        statuses,
        vec![Suspended, Suspended, Suspended, Failed, Failed, Failed]
    );
    assert_eq!(h.manager.resumes(), 4);

    let diagnostics = h.log.take();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::Runtime);
    assert!(diagnostics[0].message.contains("boom"));
}

#[test]
fn test_failed_session_keeps_last_frame() {
    let mut h = Harness::new();
    h.run("drawRect(0, 0, 1, 1, 0) update() error('late')");
    h.tick(16);

    assert_eq!(h.manager.status(), Some(CoroutineStatus::Failed));
    assert_eq!(h.draw_count(), 1);
    h.tick_frames(16, 3);
    assert_eq!(h.draw_count(), 1);

    let diagnostics = h.log.take();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].to_string(),
        "[session 1] runtime error: test.lua:1: late"
    );
}

#[test]
fn test_first_resume_failure_is_invocation_error() {
    let mut h = Harness::new();
    h.run("error('nope')");

    assert_eq!(h.manager.status(), Some(CoroutineStatus::Failed));
    let diagnostics = h.log.take();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::Invocation);
    assert!(diagnostics[0].message.contains("nope"));
}

#[test]
fn test_compile_error_creates_no_session() {
    let mut h = Harness::new();
    h.run(FRAME_LOOP);

    let now = h.at(16);
    let err = h
        .manager
        .start_session("drawRect(", "broken.lua", now)
        .unwrap_err();

    assert_eq!(err.chunk, "broken.lua");
    assert_eq!(h.manager.current_id(), None);
    assert_eq!(h.manager.status(), None);
    assert!(!h.tick(32));

    let diagnostics = h.log.take();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::Compile);
}

#[test]
fn test_stop_binding_ends_scheduling() {
    let mut h = Harness::new();
    h.run(
        r#"
        local i = 0
        while true do
          i = i + 1
          drawRect(i, 0, 1, 1, 0)
          if i == 3 then stop() end
          update()
        end
        "#,
    );
    h.tick_frames(0, 10);

    assert_eq!(h.manager.resumes(), 3);
    assert_eq!(h.manager.status(), Some(CoroutineStatus::Completed));
    assert_eq!(h.draw_count(), 3);
}

#[test]
fn test_stop_session_is_idempotent_and_cancels_timers() {
    let mut h = Harness::new();
    h.run("sleep(0.25) drawRect(0, 0, 1, 1, 0)");
    assert_eq!(h.manager.pending_timers(), 1);

    h.manager.stop_session();
    h.manager.stop_session();

    assert_eq!(h.manager.pending_timers(), 0);
    assert_eq!(h.manager.status(), Some(CoroutineStatus::Completed));
    assert!(!h.manager.fire_timers(h.at(1000)));
    assert!(!h.tick(1000));
    assert_eq!(h.draw_count(), 0);
}

#[test]
fn test_frame_callbacks_drive_completed_script() {
    let mut h = Harness::new();
    h.run(
        r#"
        local frames = 0
        local total = 0
        function setup() setBackgroundColor(0x123456) end
        function update(dt) frames = frames + 1 total = total + dt end
        function draw() drawRect(frames, total, 1, 1, 0xffffff) end
        "#,
    );
    assert_eq!(h.manager.status(), Some(CoroutineStatus::Completed));
    assert_eq!(h.draw_count(), 0);

    h.tick(16);
    assert_eq!(h.canvas.borrow().background().rgb, 0x123456);
    match h.commands().as_slice() {
        [DrawCmd::Rect { x, y, .. }] => {
            assert_eq!(*x, 1.0);
            assert!((*y - 0.016).abs() < 1e-9);
        }
        other => panic!("unexpected commands {other:?}"),
    }

    // Each callback tick starts from a cleared surface
    h.tick(32);
    assert_eq!(h.draw_count(), 1);
    assert!(matches!(h.commands()[0], DrawCmd::Rect { x, .. } if x == 2.0));
}

#[test]
fn test_frame_callback_error_makes_session_inert() {
    let mut h = Harness::new();
    h.run("function draw() error('bad draw') end");

    h.tick(16);
    h.tick(32);

    let diagnostics = h.log.take();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::Callback);
    assert_eq!(
        diagnostics[0].to_string(),
        "[session 1] callback error: test.lua:1: bad draw"
    );
    assert!(!h.manager.current().unwrap().is_active());
}

#[test]
fn test_frame_clock_reports_dt_and_fps() {
    let mut h = Harness::new();
    h.run("while true do update() end");
    for frame in 1..=60u64 {
        h.tick(frame * 20);
    }
    let fps = h.manager.fps();
    assert!((fps - 50.0).abs() < 1e-6, "fps was {fps}");

    let frame = h.manager.frame_time().unwrap();
    assert_eq!(frame.frame_index, 60);
    assert!((frame.dt - 0.02).abs() < 1e-9);
}
