// The tool state machine. `Session` owns everything that persists between
// frames: the annotation store, the current style, the active tool mode,
// any half-built shape, the control registry, and the calibration timer.
// One `tick` fully processes one frame; nothing runs between ticks.

use std::time::Instant;

use crate::calibrate::{self, PhaseTimer};
use crate::controls::{ControlAction, ControlBank};
use crate::cursor::{self, Cursor};
use crate::store::{AnnotationStore, EllipseShape, RectShape, StrokePoint};
use crate::types::{ColorRange, FrameBuffer, PenColor, Point};
use crate::vision;

/// Default pen width; the eraser window is always one wider.
const DEFAULT_PEN_WIDTH: u32 = 5;

/// Exactly one mode is active at a time. Transitions are the only way the
/// rules for committing geometry or mutating style change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolMode {
    /// Learning the draw marker's color.
    CalibrateFirst,
    /// Learning the pointer marker's color.
    CalibrateSecond,
    Draw,
    Erase,
    /// Waiting for the draw cursor to appear and anchor a rectangle.
    RectAnchor,
    /// Anchor placed; tracking the opposite corner until the cursor drops.
    RectCommit,
    EllipseAnchor,
    EllipseCommit,
    ThicknessPicker,
    ColorPicker,
}

impl ToolMode {
    pub fn is_calibrating(self) -> bool {
        matches!(self, ToolMode::CalibrateFirst | ToolMode::CalibrateSecond)
    }
}

/// Style applied to every newly appended point. Already-persisted geometry
/// keeps whatever style it was appended with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Style {
    pub color: PenColor,
    pub stroke_width: u32,
    pub eraser_width: u32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: PenColor::Black,
            stroke_width: DEFAULT_PEN_WIDTH,
            eraser_width: DEFAULT_PEN_WIDTH + 1,
        }
    }
}

/// A shape between its anchor and its terminal commit. `current` tracks the
/// last place the draw cursor was seen; that position becomes the terminal
/// the frame the cursor drops out.
#[derive(Clone, Copy, Debug)]
pub struct PendingShape {
    pub anchor: StrokePoint,
    pub current: Point,
}

pub struct Session {
    pub mode: ToolMode,
    pub style: Style,
    pub store: AnnotationStore,
    pub pending: Option<PendingShape>,
    pub controls: ControlBank,
    pub timer: PhaseTimer,
    pub draw_range: Option<ColorRange>,
    pub pointer_range: Option<ColorRange>,
    /// Cursors from the most recent tick, kept for the renderer.
    pub draw_cursor: Cursor,
    pub pointer_cursor: Cursor,
    export_requested: bool,
}

impl Session {
    pub fn new(now: Instant) -> Self {
        let style = Style::default();
        Self {
            mode: ToolMode::CalibrateFirst,
            style,
            store: AnnotationStore::new(),
            pending: None,
            controls: ControlBank::new(),
            timer: PhaseTimer::start(now),
            draw_range: None,
            pointer_range: None,
            draw_cursor: Cursor::absent(style.color, style.stroke_width),
            pointer_cursor: Cursor::absent(style.color, style.stroke_width),
            export_requested: false,
        }
    }

    /// Process one frame. While calibrating this only watches the timer;
    /// otherwise it resolves both cursors and runs the mode and control
    /// dispatch in order.
    pub fn tick(&mut self, now: Instant, frame: &FrameBuffer) {
        if self.mode.is_calibrating() {
            self.tick_calibration(now, frame);
            return;
        }

        let draw_range = self
            .draw_range
            .expect("session left calibration without a draw range");
        let pointer_range = self
            .pointer_range
            .expect("session left calibration without a pointer range");

        let last = self.store.last_point();
        let draw = cursor::resolve(frame, &draw_range, last, self.style.color, self.style.stroke_width);
        let pointer =
            cursor::resolve(frame, &pointer_range, last, self.style.color, self.style.stroke_width);
        self.advance(now, draw, pointer);
    }

    fn tick_calibration(&mut self, now: Instant, frame: &FrameBuffer) {
        if !self.timer.done(now) {
            return; // renderer shows the countdown; nothing else happens
        }
        let sample = vision::sample_center_color(frame);
        let range = calibrate::derive_range(sample);
        match self.mode {
            ToolMode::CalibrateFirst => {
                self.draw_range = Some(range);
                self.timer.restart(now);
                self.mode = ToolMode::CalibrateSecond;
                log::info!("draw marker calibrated: {range:?}");
            }
            ToolMode::CalibrateSecond => {
                self.pointer_range = Some(range);
                self.mode = ToolMode::Draw;
                log::info!("pointer marker calibrated: {range:?}");
            }
            _ => unreachable!("tick_calibration outside a calibrate mode"),
        }
    }

    /// Mode dispatch on the draw cursor, then control dispatch on the
    /// pointer cursor. Split from `tick` so tests can feed cursors directly.
    pub fn advance(&mut self, now: Instant, draw: Cursor, pointer: Cursor) {
        self.draw_cursor = draw;
        self.pointer_cursor = pointer;

        match self.mode {
            ToolMode::Draw => match draw.stroke_point() {
                Some(p) => self.store.append_point(p),
                None => self.store.append_gap(),
            },
            ToolMode::Erase => {
                // Eraser follows the draw cursor; an absent cursor erases nothing.
                if let Some(p) = draw.pos {
                    self.store.erase_within(p, self.style.eraser_width as f32);
                }
            }
            ToolMode::RectAnchor | ToolMode::EllipseAnchor => {
                if let Some(anchor) = draw.stroke_point() {
                    self.pending = Some(PendingShape { anchor, current: anchor.pos });
                    self.mode = match self.mode {
                        ToolMode::RectAnchor => ToolMode::RectCommit,
                        _ => ToolMode::EllipseCommit,
                    };
                }
                // absent: stay armed
            }
            ToolMode::RectCommit => match draw.pos {
                Some(p) => {
                    self.pending
                        .as_mut()
                        .expect("rectangle commit phase without a pending anchor")
                        .current = p;
                }
                None => {
                    let shape = self
                        .pending
                        .take()
                        .expect("rectangle commit phase without a pending anchor");
                    self.store
                        .rects
                        .push(RectShape { anchor: shape.anchor, corner: shape.current });
                    self.mode = ToolMode::RectAnchor;
                }
            },
            ToolMode::EllipseCommit => match draw.pos {
                Some(p) => {
                    self.pending
                        .as_mut()
                        .expect("ellipse commit phase without a pending anchor")
                        .current = p;
                }
                None => {
                    let shape = self
                        .pending
                        .take()
                        .expect("ellipse commit phase without a pending anchor");
                    self.store.ellipses.push(EllipseShape {
                        anchor: shape.anchor,
                        radius: shape.anchor.pos.dist(shape.current),
                    });
                    self.mode = ToolMode::EllipseAnchor;
                }
            },
            // Pickers mutate nothing themselves; their sub-palette controls do.
            ToolMode::ThicknessPicker | ToolMode::ColorPicker => {}
            ToolMode::CalibrateFirst | ToolMode::CalibrateSecond => {
                unreachable!("advance while calibrating")
            }
        }

        let fired = self.controls.dispatch(self.mode, pointer.pos);
        for action in fired {
            self.apply(action, now);
        }
    }

    fn apply(&mut self, action: ControlAction, now: Instant) {
        match action {
            ControlAction::Use(mode) => {
                if mode != self.mode {
                    // a half-built shape dies with its tool
                    self.pending = None;
                    self.mode = mode;
                }
            }
            ControlAction::Recalibrate => {
                self.pending = None;
                self.timer.restart(now);
                self.mode = ToolMode::CalibrateFirst;
            }
            ControlAction::Clear => self.store.clear(),
            ControlAction::Save => self.export_requested = true,
            ControlAction::PickColor(color) => {
                self.style.color = color;
                self.mode = ToolMode::Draw;
            }
            ControlAction::PickWidth(width) => {
                self.style.stroke_width = width;
                self.style.eraser_width = width + 1;
                self.mode = ToolMode::Draw;
            }
        }
    }

    /// True once per Save press; reading it clears the flag.
    pub fn take_export_request(&mut self) -> bool {
        std::mem::take(&mut self.export_requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StrokeSample;

    fn session_in(mode: ToolMode) -> Session {
        let mut s = Session::new(Instant::now());
        s.mode = mode;
        s
    }

    /// Build the draw cursor the way `tick` would: speed measured against
    /// the store's trailing entry.
    fn draw_cursor(s: &Session, pos: Option<(f32, f32)>) -> Cursor {
        match pos {
            Some((x, y)) => {
                let p = Point::new(x, y);
                let speed = s.store.last_point().map_or(0.0, |prev| p.dist(prev));
                Cursor {
                    pos: Some(p),
                    color: s.style.color,
                    width: s.style.stroke_width,
                    speed,
                }
            }
            None => Cursor::absent(s.style.color, s.style.stroke_width),
        }
    }

    fn absent() -> Cursor {
        Cursor::absent(PenColor::Black, 5)
    }

    fn step(s: &mut Session, pos: Option<(f32, f32)>) {
        let draw = draw_cursor(s, pos);
        s.advance(Instant::now(), draw, absent());
    }

    #[test]
    fn draw_sequence_end_to_end() {
        let mut s = session_in(ToolMode::Draw);
        s.style.color = PenColor::Red;
        s.style.stroke_width = 5;

        for pos in [Some((10.0, 10.0)), Some((20.0, 20.0)), None, Some((30.0, 30.0))] {
            step(&mut s, pos);
        }

        assert_eq!(s.store.strokes.len(), 4);
        match s.store.strokes[0] {
            StrokeSample::Point(p) => {
                assert_eq!(p.pos, Point::new(10.0, 10.0));
                assert_eq!(p.color, PenColor::Red);
                assert_eq!(p.speed, 0.0);
                assert_eq!(p.width, 5);
            }
            StrokeSample::Gap => panic!("expected a point"),
        }
        match s.store.strokes[1] {
            StrokeSample::Point(p) => assert!((p.speed - 200.0_f32.sqrt()).abs() < 1e-4),
            StrokeSample::Gap => panic!("expected a point"),
        }
        assert_eq!(s.store.strokes[2], StrokeSample::Gap);
        match s.store.strokes[3] {
            StrokeSample::Point(p) => assert_eq!(p.speed, 0.0), // speed restarts after the gap
            StrokeSample::Gap => panic!("expected a point"),
        }
    }

    #[test]
    fn continuous_presence_leaves_no_gaps() {
        let mut s = session_in(ToolMode::Draw);
        for i in 0..20 {
            step(&mut s, Some((i as f32, i as f32)));
        }
        assert!(s.store.strokes.iter().all(|e| matches!(e, StrokeSample::Point(_))));
    }

    #[test]
    fn rectangle_two_phase_commit() {
        let mut s = session_in(ToolMode::RectAnchor);

        // absent cursor keeps the anchor armed
        step(&mut s, None);
        assert_eq!(s.mode, ToolMode::RectAnchor);
        assert!(s.pending.is_none());

        step(&mut s, Some((100.0, 100.0)));
        assert_eq!(s.mode, ToolMode::RectCommit);

        // corner tracks the cursor while present
        step(&mut s, Some((150.0, 120.0)));
        step(&mut s, Some((160.0, 140.0)));
        assert_eq!(s.store.rects.len(), 0);

        // cursor drops: exactly one committed shape, back to anchor mode
        step(&mut s, None);
        assert_eq!(s.mode, ToolMode::RectAnchor);
        assert!(s.pending.is_none());
        assert_eq!(s.store.rects.len(), 1);
        let rect = s.store.rects[0];
        assert_eq!(rect.anchor.pos, Point::new(100.0, 100.0));
        assert_eq!(rect.corner, Point::new(160.0, 140.0));
    }

    #[test]
    fn ellipse_commit_stores_radius() {
        let mut s = session_in(ToolMode::EllipseAnchor);
        step(&mut s, Some((100.0, 100.0)));
        assert_eq!(s.mode, ToolMode::EllipseCommit);
        step(&mut s, Some((100.0, 140.0)));
        step(&mut s, None);

        assert_eq!(s.mode, ToolMode::EllipseAnchor);
        assert_eq!(s.store.ellipses.len(), 1);
        let e = s.store.ellipses[0];
        assert_eq!(e.anchor.pos, Point::new(100.0, 100.0));
        assert!((e.radius - 40.0).abs() < 1e-4);
    }

    #[test]
    fn erase_targets_draw_cursor() {
        let mut s = session_in(ToolMode::Draw);
        step(&mut s, Some((50.0, 50.0)));
        step(&mut s, Some((200.0, 200.0)));

        s.mode = ToolMode::Erase;
        step(&mut s, Some((52.0, 52.0)));
        assert_eq!(s.store.strokes[0], StrokeSample::Gap);
        assert!(matches!(s.store.strokes[1], StrokeSample::Point(_)));
    }

    #[test]
    fn clear_preserves_mode_and_style() {
        let mut s = session_in(ToolMode::Erase);
        s.style.color = PenColor::Blue;
        s.store.append_point(StrokePoint {
            pos: Point::new(1.0, 1.0),
            color: PenColor::Blue,
            speed: 0.0,
            width: 5,
        });
        s.store.rects.push(RectShape {
            anchor: StrokePoint {
                pos: Point::new(0.0, 0.0),
                color: PenColor::Blue,
                speed: 0.0,
                width: 5,
            },
            corner: Point::new(9.0, 9.0),
        });

        s.apply(ControlAction::Clear, Instant::now());
        assert!(s.store.is_empty());
        assert_eq!(s.mode, ToolMode::Erase);
        assert_eq!(s.style.color, PenColor::Blue);
    }

    #[test]
    fn pickers_return_to_draw() {
        let mut s = session_in(ToolMode::ThicknessPicker);
        s.apply(ControlAction::PickWidth(15), Instant::now());
        assert_eq!(s.mode, ToolMode::Draw);
        assert_eq!(s.style.stroke_width, 15);
        assert_eq!(s.style.eraser_width, 16);

        s.mode = ToolMode::ColorPicker;
        s.apply(ControlAction::PickColor(PenColor::Green), Instant::now());
        assert_eq!(s.mode, ToolMode::Draw);
        assert_eq!(s.style.color, PenColor::Green);
    }

    #[test]
    fn tool_switch_cancels_pending_shape() {
        let mut s = session_in(ToolMode::RectAnchor);
        step(&mut s, Some((100.0, 100.0)));
        assert!(s.pending.is_some());

        s.apply(ControlAction::Use(ToolMode::Draw), Instant::now());
        assert!(s.pending.is_none());
        assert_eq!(s.mode, ToolMode::Draw);
        assert!(s.store.rects.is_empty());
    }

    #[test]
    fn recalibrate_keeps_the_canvas() {
        let mut s = session_in(ToolMode::Draw);
        step(&mut s, Some((10.0, 10.0)));
        s.apply(ControlAction::Recalibrate, Instant::now());
        assert_eq!(s.mode, ToolMode::CalibrateFirst);
        assert_eq!(s.store.strokes.len(), 1);
    }

    #[test]
    fn save_flag_reads_once() {
        let mut s = session_in(ToolMode::Draw);
        s.apply(ControlAction::Save, Instant::now());
        assert!(s.take_export_request());
        assert!(!s.take_export_request());
    }

    #[test]
    fn picker_modes_do_not_touch_geometry() {
        let mut s = session_in(ToolMode::ThicknessPicker);
        step(&mut s, Some((10.0, 10.0)));
        step(&mut s, None);
        assert!(s.store.is_empty());
    }
}
