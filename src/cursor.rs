// Turns marker detections into the two semantic cursors the tool state
// machine consumes. "Absent" is a first-class outcome here: a missing or
// low-confidence blob gives `pos: None`, never a made-up (0,0).

use crate::store::StrokePoint;
use crate::types::{ColorRange, FrameBuffer, PenColor, Point};
use crate::vision;

/// Minimum blob radius (pixels) before a detection counts as a marker.
/// Smaller blobs are specks of background that happen to match the range.
pub const MIN_MARKER_RADIUS: f32 = 30.0;

/// One frame's view of one tracked marker. Built fresh every tick and
/// tagged with the style that would apply if this sample were persisted.
#[derive(Clone, Copy, Debug)]
pub struct Cursor {
    pub pos: Option<Point>,
    pub color: PenColor,
    pub width: u32,
    /// Distance from the stroke list's last entry when that entry is a
    /// present point; zero otherwise. Resets after every gap.
    pub speed: f32,
}

impl Cursor {
    pub fn absent(color: PenColor, width: u32) -> Self {
        Self { pos: None, color, width, speed: 0.0 }
    }

    /// The persisted form of this cursor. Only valid when present.
    pub fn stroke_point(&self) -> Option<StrokePoint> {
        self.pos.map(|pos| StrokePoint {
            pos,
            color: self.color,
            speed: self.speed,
            width: self.width,
        })
    }
}

/// Resolve one marker against the frame. `last` is the annotation store's
/// trailing stroke position, used to measure per-frame speed.
pub fn resolve(
    frame: &FrameBuffer,
    range: &ColorRange,
    last: Option<Point>,
    color: PenColor,
    width: u32,
) -> Cursor {
    match vision::locate_marker(frame, range) {
        Some(blob) if blob.radius > MIN_MARKER_RADIUS => {
            let speed = last.map_or(0.0, |prev| blob.center.dist(prev));
            Cursor { pos: Some(blob.center), color, width, speed }
        }
        _ => Cursor::absent(color, width),
    }
}
