// On-screen controls driven by the pointer cursor. Each control is a square
// hit region with an action and a per-dwell debounce: once it fires, the
// pointer has to leave the region (or drop out entirely) before it can fire
// again. Without that, a single dwell would re-trigger every frame.

use crate::tools::ToolMode;
use crate::types::{PenColor, Point};

/// Side of every control square, in pixels.
pub const CONTROL_SIZE: f32 = 50.0;
/// Top-bar row y and horizontal pitch.
const BAR_Y: f32 = 20.0;
const BAR_PITCH: f32 = 70.0;
/// y of the picker sub-palette rows.
const PALETTE_Y: f32 = 250.0;

/// What a control does when the pointer dwells on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlAction {
    /// Switch the active tool.
    Use(ToolMode),
    /// Restart the two-phase color calibration, keeping the canvas.
    Recalibrate,
    /// Empty all geometry lists; tool and style stay as they are.
    Clear,
    /// Ask the host loop to export the current canvas as a still image.
    Save,
    PickColor(PenColor),
    PickWidth(u32),
}

/// Which tool modes a control is reachable from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Group {
    /// The persistent top bar: every non-calibration mode.
    Bar,
    /// Thickness sub-palette: only while the thickness picker is open.
    Thickness,
    /// Color sub-palette: only while the color picker is open.
    Palette,
}

pub struct Control {
    pub x: f32,
    pub y: f32,
    pub label: &'static str,
    pub action: ControlAction,
    group: Group,
    pressed: bool,
}

impl Control {
    fn new(group: Group, x: f32, y: f32, label: &'static str, action: ControlAction) -> Self {
        Self { x, y, label, action, group, pressed: false }
    }

    fn contains(&self, p: Point) -> bool {
        p.x > self.x && p.x < self.x + CONTROL_SIZE && p.y > self.y && p.y < self.y + CONTROL_SIZE
    }

    fn visible_in(&self, mode: ToolMode) -> bool {
        match self.group {
            Group::Bar => !mode.is_calibrating(),
            Group::Thickness => mode == ToolMode::ThicknessPicker,
            Group::Palette => mode == ToolMode::ColorPicker,
        }
    }
}

/// The full registry, built once at startup.
pub struct ControlBank {
    controls: Vec<Control>,
}

impl ControlBank {
    pub fn new() -> Self {
        use ControlAction::*;
        let bar = |i: usize, label, action| {
            Control::new(Group::Bar, 10.0 + i as f32 * BAR_PITCH, BAR_Y, label, action)
        };
        let controls = vec![
            bar(0, "DRAW", Use(ToolMode::Draw)),
            bar(1, "ERASE", Use(ToolMode::Erase)),
            bar(2, "RECT", Use(ToolMode::RectAnchor)),
            bar(3, "OVAL", Use(ToolMode::EllipseAnchor)),
            bar(4, "COLOR", Use(ToolMode::ColorPicker)),
            bar(5, "SIZE", Use(ToolMode::ThicknessPicker)),
            bar(6, "SAVE", Save),
            bar(7, "CLEAR", Clear),
            bar(8, "CAL", Recalibrate),
            Control::new(Group::Thickness, 160.0, PALETTE_Y, "THIN", PickWidth(2)),
            Control::new(Group::Thickness, 300.0, PALETTE_Y, "MED", PickWidth(7)),
            Control::new(Group::Thickness, 440.0, PALETTE_Y, "THICK", PickWidth(15)),
            Control::new(Group::Palette, 90.0, PALETTE_Y, "BLACK", PickColor(PenColor::Black)),
            Control::new(Group::Palette, 230.0, PALETTE_Y, "RED", PickColor(PenColor::Red)),
            Control::new(Group::Palette, 370.0, PALETTE_Y, "GREEN", PickColor(PenColor::Green)),
            Control::new(Group::Palette, 510.0, PALETTE_Y, "BLUE", PickColor(PenColor::Blue)),
        ];
        Self { controls }
    }

    /// Check the pointer against every control reachable in `mode`.
    /// An absent pointer releases every debounce latch, so the next dwell
    /// anywhere can fire again.
    pub fn dispatch(&mut self, mode: ToolMode, pointer: Option<Point>) -> Vec<ControlAction> {
        let mut fired = Vec::new();
        match pointer {
            None => {
                for c in &mut self.controls {
                    c.pressed = false;
                }
            }
            Some(p) => {
                for c in &mut self.controls {
                    if !c.visible_in(mode) {
                        continue;
                    }
                    if c.contains(p) {
                        if !c.pressed {
                            c.pressed = true;
                            fired.push(c.action);
                        }
                    } else {
                        c.pressed = false;
                    }
                }
            }
        }
        fired
    }

    /// The controls the renderer should draw for `mode`.
    pub fn visible(&self, mode: ToolMode) -> impl Iterator<Item = &Control> {
        self.controls.iter().filter(move |c| c.visible_in(mode))
    }
}

impl Default for ControlBank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inside_draw() -> Point {
        Point::new(35.0, 45.0)
    }

    #[test]
    fn dwell_fires_exactly_once() {
        let mut bank = ControlBank::new();
        let mut fired = 0;
        for _ in 0..10 {
            fired += bank.dispatch(ToolMode::Erase, Some(inside_draw())).len();
        }
        assert_eq!(fired, 1);
    }

    #[test]
    fn rearms_after_absent_frame() {
        let mut bank = ControlBank::new();
        assert_eq!(bank.dispatch(ToolMode::Erase, Some(inside_draw())).len(), 1);
        assert_eq!(bank.dispatch(ToolMode::Erase, None).len(), 0);
        assert_eq!(bank.dispatch(ToolMode::Erase, Some(inside_draw())).len(), 1);
    }

    #[test]
    fn rearms_after_leaving_region() {
        let mut bank = ControlBank::new();
        assert_eq!(bank.dispatch(ToolMode::Erase, Some(inside_draw())).len(), 1);
        assert_eq!(bank.dispatch(ToolMode::Erase, Some(Point::new(300.0, 400.0))).len(), 0);
        assert_eq!(bank.dispatch(ToolMode::Erase, Some(inside_draw())).len(), 1);
    }

    #[test]
    fn picker_rows_unreachable_outside_their_mode() {
        let mut bank = ControlBank::new();
        let on_thin = Point::new(180.0, 270.0);
        assert!(bank.dispatch(ToolMode::Draw, Some(on_thin)).is_empty());
        assert_eq!(
            bank.dispatch(ToolMode::ThicknessPicker, Some(on_thin)),
            vec![ControlAction::PickWidth(2)]
        );
    }

    #[test]
    fn dispatch_returns_the_control_action() {
        let mut bank = ControlBank::new();
        // CLEAR sits eighth on the bar
        let on_clear = Point::new(10.0 + 7.0 * 70.0 + 25.0, 45.0);
        assert_eq!(
            bank.dispatch(ToolMode::Draw, Some(on_clear)),
            vec![ControlAction::Clear]
        );
    }
}
