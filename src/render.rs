// Window + software compositing. Everything the user sees is drawn here,
// straight into the frame's pixel buffer: persisted strokes and shapes, the
// live shape preview, control chrome, both cursor rings, the calibration
// overlay, and a small 5x7 bitmap font for labels and the HUD.

use std::time::Instant;

use minifb::{Key, Window, WindowOptions};

use crate::controls::{Control, ControlAction, CONTROL_SIZE};
use crate::error::Error;
use crate::store::{AnnotationStore, StrokeSample, StrokePoint};
use crate::tools::{Session, ToolMode};
use crate::types::{FrameBuffer, PenColor, Point};

/// Segments faster than this are treated as detection glitches and not
/// joined; a marker jumping across the frame in one tick is never a stroke.
pub const MAX_DRAW_SPEED: f32 = 100.0;

/// Radius of the on-screen cursor rings.
const CURSOR_RING_RADIUS: i32 = 8;

pub struct Drawer {
    window: Window,
}

impl Drawer {
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
        let window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        Ok(Self { window })
    }

    /// Push this frame's pixels to the screen.
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<(), Error> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))?;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn esc_pressed(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }
}

/* ---------- pixel primitives ---------- */

#[inline]
fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    fb.pixels[y * fb.width + x] = color;
}

/// Filled disc, used as the stamp that gives lines their width.
fn draw_disc(fb: &mut FrameBuffer, cx: i32, cy: i32, r: i32, color: u32) {
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r * r {
                put_pixel(fb, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Bresenham line, 1 pixel wide.
fn draw_line(fb: &mut FrameBuffer, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
    let (mut x0, mut y0) = (x0, y0);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put_pixel(fb, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// A line with pen width: a disc stamped along the Bresenham walk.
fn draw_thick_line(fb: &mut FrameBuffer, x0: i32, y0: i32, x1: i32, y1: i32, width: u32, color: u32) {
    let r = (width as i32 / 2).max(0);
    if r == 0 {
        draw_line(fb, x0, y0, x1, y1, color);
        return;
    }
    let (mut x0, mut y0) = (x0, y0);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        draw_disc(fb, x0, y0, r, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Midpoint circle outline; `thickness` extra rings grow outward.
fn draw_circle(fb: &mut FrameBuffer, cx: i32, cy: i32, radius: i32, thickness: i32, color: u32) {
    for ring in 0..thickness.max(1) {
        let r = radius + ring;
        if r <= 0 {
            continue;
        }
        let mut x = r;
        let mut y = 0;
        let mut err = 1 - r;
        while x >= y {
            for (px, py) in [
                (cx + x, cy + y),
                (cx - x, cy + y),
                (cx + x, cy - y),
                (cx - x, cy - y),
                (cx + y, cy + x),
                (cx - y, cy + x),
                (cx + y, cy - x),
                (cx - y, cy - x),
            ] {
                put_pixel(fb, px, py, color);
            }
            y += 1;
            if err < 0 {
                err += 2 * y + 1;
            } else {
                x -= 1;
                err += 2 * (y - x) + 1;
            }
        }
    }
}

fn draw_rect_outline(fb: &mut FrameBuffer, a: Point, b: Point, width: u32, color: u32) {
    let (x0, x1) = (a.x.min(b.x) as i32, a.x.max(b.x) as i32);
    let (y0, y1) = (a.y.min(b.y) as i32, a.y.max(b.y) as i32);
    draw_thick_line(fb, x0, y0, x1, y0, width, color);
    draw_thick_line(fb, x0, y1, x1, y1, width, color);
    draw_thick_line(fb, x0, y0, x0, y1, width, color);
    draw_thick_line(fb, x1, y0, x1, y1, width, color);
}

fn fill_rect(fb: &mut FrameBuffer, x: i32, y: i32, w: i32, h: i32, color: u32) {
    for py in y..y + h {
        for px in x..x + w {
            put_pixel(fb, px, py, color);
        }
    }
}

/* ---------- 5x7 bitmap font ---------- */

/// Glyph rows; the low 5 bits are the pixels (bit 4 = leftmost column).
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch {
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'B' => g!(0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'G' => g!(0b01110,0b10001,0b10000,0b10111,0b10001,0b10001,0b01111),
        'H' => g!(0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'J' => g!(0b00111,0b00010,0b00010,0b00010,0b00010,0b10010,0b01100),
        'K' => g!(0b10001,0b10010,0b10100,0b11000,0b10100,0b10010,0b10001),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'M' => g!(0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001),
        'N' => g!(0b10001,0b11001,0b10101,0b10011,0b10001,0b10001,0b10001),
        'O' => g!(0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'Q' => g!(0b01110,0b10001,0b10001,0b10001,0b10101,0b10010,0b01101),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'T' => g!(0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        'U' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'V' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b01010,0b00100),
        'W' => g!(0b10001,0b10001,0b10001,0b10101,0b10101,0b11011,0b10001),
        'X' => g!(0b10001,0b01010,0b00100,0b00100,0b00100,0b01010,0b10001),
        'Y' => g!(0b10001,0b01010,0b00100,0b00100,0b00100,0b00100,0b00100),
        'Z' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b10000,0b11111),

        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        '|' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),

        _ => None,
    }
}

fn draw_char_5x7(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, color: u32) {
    if let Some(rows) = glyph5x7(ch) {
        // shadow pass first, offset (1,1) in black for contrast on video
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..5 {
                if (rowbits & (1 << (4 - rx))) != 0 {
                    put_pixel(fb, x + rx as i32 + 1, y + ry as i32 + 1, 0x00000000);
                }
            }
        }
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..5 {
                if (rowbits & (1 << (4 - rx))) != 0 {
                    put_pixel(fb, x + rx as i32, y + ry as i32, color);
                }
            }
        }
    }
}

pub fn draw_text_5x7(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, color: u32) {
    for ch in text.chars() {
        draw_char_5x7(fb, x, y, ch, color);
        x += 6; // 5 pixels glyph width + 1 pixel spacing
    }
}

/* ---------- composition ---------- */

/// Consecutive stroke samples that the renderer should join with a line.
/// A pair qualifies when both entries are real points and the later one was
/// moving slower than the glitch cutoff when it was recorded.
pub fn stroke_segments(strokes: &[StrokeSample]) -> Vec<(Point, StrokePoint)> {
    let mut out = Vec::new();
    for pair in strokes.windows(2) {
        if let [StrokeSample::Point(a), StrokeSample::Point(b)] = pair {
            if b.speed < MAX_DRAW_SPEED {
                out.push((a.pos, *b));
            }
        }
    }
    out
}

/// Persisted geometry only: strokes, rectangles, ellipses. Shared between
/// the live view and the Save snapshot (which wants no chrome or cursors).
pub fn compose_geometry(screen: &mut FrameBuffer, store: &AnnotationStore) {
    for (from, to) in stroke_segments(&store.strokes) {
        draw_thick_line(
            screen,
            from.x as i32,
            from.y as i32,
            to.pos.x as i32,
            to.pos.y as i32,
            to.width,
            to.color.rgb(),
        );
    }
    for rect in &store.rects {
        draw_rect_outline(screen, rect.anchor.pos, rect.corner, rect.anchor.width, rect.anchor.color.rgb());
    }
    for ellipse in &store.ellipses {
        draw_circle(
            screen,
            ellipse.anchor.pos.x as i32,
            ellipse.anchor.pos.y as i32,
            ellipse.radius as i32,
            ellipse.anchor.width as i32,
            ellipse.anchor.color.rgb(),
        );
    }
}

/// Full live view: geometry, live preview, chrome, cursors, overlays.
pub fn compose(screen: &mut FrameBuffer, session: &Session, now: Instant) {
    if session.mode.is_calibrating() {
        compose_calibration(screen, session, now);
        return;
    }

    compose_geometry(screen, &session.store);

    // Not-yet-committed shape follows the cursor.
    if let Some(pending) = &session.pending {
        let color = pending.anchor.color.rgb();
        match session.mode {
            ToolMode::RectCommit => {
                draw_rect_outline(screen, pending.anchor.pos, pending.current, pending.anchor.width, color);
            }
            ToolMode::EllipseCommit => {
                let r = pending.anchor.pos.dist(pending.current) as i32;
                draw_circle(
                    screen,
                    pending.anchor.pos.x as i32,
                    pending.anchor.pos.y as i32,
                    r,
                    pending.anchor.width as i32,
                    color,
                );
            }
            _ => {}
        }
    }

    for control in session.controls.visible(session.mode) {
        draw_control(screen, control, bar_mode(session.mode));
    }

    // Cursor rings: thick ring for the draw cursor, thin for the pointer.
    let ring_color = if session.mode == ToolMode::Erase {
        PenColor::Grey.rgb()
    } else {
        session.style.color.rgb()
    };
    if let Some(p) = session.draw_cursor.pos {
        draw_circle(screen, p.x as i32, p.y as i32, CURSOR_RING_RADIUS, 3, ring_color);
    }
    if let Some(p) = session.pointer_cursor.pos {
        draw_circle(screen, p.x as i32, p.y as i32, CURSOR_RING_RADIUS, 2, ring_color);
    }
}

/// The bar button to highlight: a commit phase lights up its anchor sibling.
fn bar_mode(mode: ToolMode) -> ToolMode {
    match mode {
        ToolMode::RectCommit => ToolMode::RectAnchor,
        ToolMode::EllipseCommit => ToolMode::EllipseAnchor,
        other => other,
    }
}

fn draw_control(screen: &mut FrameBuffer, control: &Control, active: ToolMode) {
    let x = control.x as i32;
    let y = control.y as i32;
    let size = CONTROL_SIZE as i32;

    // color-pick buttons show their color; everything else is a grey plate
    let (fill, text) = match control.action {
        ControlAction::PickColor(c) => (c.rgb(), 0x00_FF_FF_FF),
        _ => (0x00_E8_E8_E8, 0x00_00_00_00),
    };
    fill_rect(screen, x, y, size, size, fill);

    let is_active = control.action == ControlAction::Use(active);
    let border = if is_active { 0x00_FF_88_00 } else { 0x00_20_20_20 };
    let a = Point::new(control.x, control.y);
    let b = Point::new(control.x + CONTROL_SIZE, control.y + CONTROL_SIZE);
    draw_rect_outline(screen, a, b, if is_active { 3 } else { 1 }, border);

    let label_w = control.label.len() as i32 * 6 - 1;
    draw_text_5x7(screen, x + (size - label_w) / 2, y + (size - 7) / 2, control.label, text);
}

fn compose_calibration(screen: &mut FrameBuffer, session: &Session, now: Instant) {
    let which = if session.mode == ToolMode::CalibrateFirst { "ONE" } else { "TWO" };
    let prompt = format!(
        "HOLD MARKER {which} IN RING: {}",
        session.timer.remaining_secs(now)
    );
    draw_text_5x7(screen, 30, 20, &prompt, 0x00_FF_FF_FF);

    let cx = screen.width as i32 / 2;
    let cy = screen.height as i32 / 2;
    draw_circle(screen, cx, cy, 50, 3, 0x00_FF_FF_FF);
    draw_circle(screen, cx, cy, 55, 3, 0x00_00_00_00);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn pt(x: f32, y: f32, speed: f32) -> StrokeSample {
        StrokeSample::Point(StrokePoint {
            pos: Point::new(x, y),
            color: PenColor::Red,
            speed,
            width: 5,
        })
    }

    #[test]
    fn segments_skip_gaps() {
        let strokes = [pt(10.0, 10.0, 0.0), pt(20.0, 20.0, 14.1), StrokeSample::Gap, pt(30.0, 30.0, 0.0)];
        let segs = stroke_segments(&strokes);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].0, Point::new(10.0, 10.0));
        assert_eq!(segs[0].1.pos, Point::new(20.0, 20.0));
    }

    #[test]
    fn segments_drop_glitch_speed() {
        let strokes = [pt(0.0, 0.0, 0.0), pt(300.0, 300.0, 424.0), pt(305.0, 305.0, 7.0)];
        let segs = stroke_segments(&strokes);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].1.pos, Point::new(305.0, 305.0));
    }

    #[test]
    fn primitives_clip_at_frame_edges() {
        let mut fb = FrameBuffer::blank(40, 40);
        draw_thick_line(&mut fb, -10, -10, 50, 50, 7, 0x00_FF_00_00);
        draw_circle(&mut fb, 0, 0, 30, 3, 0x00_00_FF_00);
        draw_disc(&mut fb, 39, 39, 5, 0x00_00_00_FF);
        // no panic, and something landed inside the frame
        assert!(fb.pixels.iter().any(|&p| p != 0));
    }

    #[test]
    fn thick_line_covers_its_width() {
        let mut fb = FrameBuffer::blank(40, 40);
        draw_thick_line(&mut fb, 5, 20, 35, 20, 5, 0x00_FF_FF_FF);
        // two rows above and below the spine are painted
        assert_eq!(fb.pixels[18 * 40 + 20], 0x00_FF_FF_FF);
        assert_eq!(fb.pixels[22 * 40 + 20], 0x00_FF_FF_FF);
        assert_eq!(fb.pixels[15 * 40 + 20], 0);
    }
}
