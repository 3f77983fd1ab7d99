use minisnip::{Phase, Point, Rect, Release, Selection};
use proptest::prelude::*;

fn drag(from: (f64, f64), moves: &[(f64, f64)], to: (f64, f64)) -> (Selection, Release) {
    let mut sel = Selection::new();
    sel.press(Point::new(from.0, from.1));
    for &(x, y) in moves {
        sel.motion(Point::new(x, y));
    }
    let release = sel.release(Point::new(to.0, to.1));
    (sel, release)
}

#[test]
fn drag_on_a_left_hand_monitor_keeps_negative_coordinates() {
    let (sel, release) = drag((-1800.0, 50.0), &[(-1500.0, 200.0)], (-1000.0, 650.0));
    assert_eq!(release, Release::Captured(Rect::new(-1800, 50, 800, 600)));
    assert_eq!(sel.phase(), Phase::Captured(Rect::new(-1800, 50, 800, 600)));
}

#[test]
fn click_without_drag_keeps_overlay_up() {
    let (sel, release) = drag((100.0, 100.0), &[], (100.0, 100.0));
    assert_eq!(release, Release::Discarded);
    assert!(!sel.is_finished());
}

#[test]
fn release_position_wins_over_last_motion() {
    let (_, release) = drag((0.0, 0.0), &[(50.0, 50.0)], (80.0, 60.0));
    assert_eq!(release, Release::Captured(Rect::new(0, 0, 80, 60)));
}

proptest! {
    #[test]
    fn released_drags_are_either_captured_or_discarded(
        sx in -3000.0f64..3000.0, sy in -3000.0f64..3000.0,
        ex in -3000.0f64..3000.0, ey in -3000.0f64..3000.0
    ) {
        let (sel, release) = drag((sx, sy), &[], (ex, ey));
        let big_enough = (ex - sx).abs() >= 2.0 && (ey - sy).abs() >= 2.0;

        match release {
            Release::Captured(rect) => {
                prop_assert!(big_enough);
                prop_assert!(sel.is_finished());
                prop_assert_eq!(rect, Rect::from_corners(Point::new(sx, sy), Point::new(ex, ey)));
            }
            Release::Discarded => {
                prop_assert!(!big_enough);
                prop_assert_eq!(sel.phase(), Phase::Idle);
            }
            Release::Ignored => prop_assert!(false, "a press always starts a drag"),
        }
    }

    #[test]
    fn cancel_always_wins(
        sx in -3000.0f64..3000.0, sy in -3000.0f64..3000.0,
        ex in -3000.0f64..3000.0, ey in -3000.0f64..3000.0
    ) {
        let mut sel = Selection::new();
        sel.press(Point::new(sx, sy));
        sel.motion(Point::new(ex, ey));
        sel.cancel();

        prop_assert_eq!(sel.release(Point::new(ex, ey)), Release::Ignored);
        prop_assert_eq!(sel.result(), None);
        prop_assert_eq!(sel.phase(), Phase::Cancelled);
    }
}
