// The annotation store: everything the user has drawn so far.
//
// The stroke list is append-only and index-stable. A detection miss appends
// an explicit `Gap` so the renderer never joins points across it, and the
// eraser overwrites entries with `Gap` instead of removing them, which keeps
// pairwise iteration honest. Shapes commit as whole structs so a rectangle
// or ellipse can never be half-present.

use crate::types::{PenColor, Point};

/// One persisted freehand sample, tagged with the style that was current
/// when it was appended. Restyle is never retroactive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokePoint {
    pub pos: Point,
    pub color: PenColor,
    /// Distance from the previous stroke entry at append time; the renderer
    /// uses it to drop segments from false-positive detections.
    pub speed: f32,
    pub width: u32,
}

/// A stroke list entry: either a real sample or a break in the polyline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StrokeSample {
    Point(StrokePoint),
    Gap,
}

/// A committed rectangle: styled anchor corner plus the opposite corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RectShape {
    pub anchor: StrokePoint,
    pub corner: Point,
}

/// A committed ellipse: styled center plus radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EllipseShape {
    pub anchor: StrokePoint,
    pub radius: f32,
}

#[derive(Default)]
pub struct AnnotationStore {
    pub strokes: Vec<StrokeSample>,
    pub rects: Vec<RectShape>,
    pub ellipses: Vec<EllipseShape>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_point(&mut self, p: StrokePoint) {
        self.strokes.push(StrokeSample::Point(p));
    }

    pub fn append_gap(&mut self) {
        self.strokes.push(StrokeSample::Gap);
    }

    /// Position of the last stroke entry, if that entry is a real point.
    /// A trailing `Gap` yields `None`, so the next sample's speed restarts
    /// at zero after every break.
    pub fn last_point(&self) -> Option<Point> {
        match self.strokes.last() {
            Some(StrokeSample::Point(p)) => Some(p.pos),
            _ => None,
        }
    }

    /// Overwrite with `Gap` every stroke point inside the closed square
    /// window [cx-w, cx+w] x [cy-w, cy+w]. Both edges are inside the window.
    pub fn erase_within(&mut self, center: Point, half_width: f32) {
        for entry in &mut self.strokes {
            if let StrokeSample::Point(p) = entry {
                if (p.pos.x - center.x).abs() <= half_width
                    && (p.pos.y - center.y).abs() <= half_width
                {
                    *entry = StrokeSample::Gap;
                }
            }
        }
    }

    /// Drop all three geometry lists. Tool and style are untouched; that is
    /// the caller's state, not the store's.
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.rects.clear();
        self.ellipses.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty() && self.rects.is_empty() && self.ellipses.is_empty()
    }
}
