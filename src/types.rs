// Shared value types: the pixel buffer we render into, 2-D positions,
// HSV color samples, and the fixed pen palette.

/// One frame's worth of pixels, packed 0x00RRGGBB for minifb.
#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl FrameBuffer {
    pub fn blank(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }
}

/// A position on the frame. Marker centroids come out of the blob pass as
/// sub-pixel values, so this stays in f32 until the renderer rounds it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn dist(&self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// An HSV sample in the 8-bit OpenCV convention: hue 0..=179 (degrees / 2),
/// saturation and value 0..=255.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

/// Inclusive lower/upper HSV bounds learned during calibration.
/// A marker pixel matches when every channel sits inside its band.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorRange {
    pub lower: Hsv,
    pub upper: Hsv,
}

impl ColorRange {
    pub fn contains(&self, px: Hsv) -> bool {
        px.h >= self.lower.h
            && px.h <= self.upper.h
            && px.s >= self.lower.s
            && px.s <= self.upper.s
            && px.v >= self.lower.v
            && px.v <= self.upper.v
    }
}

/// The fixed drawing palette. Grey is reserved for the eraser indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PenColor {
    Black,
    Red,
    Green,
    Blue,
    Grey,
}

impl PenColor {
    /// Packed 0x00RRGGBB value for the framebuffer.
    pub fn rgb(self) -> u32 {
        match self {
            PenColor::Black => 0x00_00_00_00,
            PenColor::Red => 0x00_FF_00_00,
            PenColor::Green => 0x00_00_FF_00,
            PenColor::Blue => 0x00_00_00_FF,
            PenColor::Grey => 0x00_BE_BE_BE,
        }
    }
}
