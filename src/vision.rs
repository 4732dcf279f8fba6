// Color-blob marker detection. Given the HSV range learned in calibration,
// this pass thresholds the frame, finds the largest connected blob, and
// reports its centroid plus a size estimate the cursor layer uses as a
// confidence gate. Also samples the frame center for calibration itself.

use crate::types::{ColorRange, FrameBuffer, Hsv, Point};

/// Side of the averaging box used when sampling the calibration target.
/// Averaging stands in for a blur: one noisy pixel must not decide the range.
const CENTER_SAMPLE_BOX: usize = 15;

/// Convert one packed 0x00RRGGBB pixel to 8-bit HSV (hue 0..=179).
pub fn rgb_to_hsv(px: u32) -> Hsv {
    let r = ((px >> 16) & 0xFF) as f32;
    let g = ((px >> 8) & 0xFF) as f32;
    let b = (px & 0xFF) as f32;

    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = v - min;

    let s = if v == 0.0 { 0.0 } else { 255.0 * delta / v };

    let h_deg = if delta == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / delta
    } else if v == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h_deg = if h_deg < 0.0 { h_deg + 360.0 } else { h_deg };

    Hsv {
        h: ((h_deg / 2.0).round() as u16 % 180) as u8,
        s: s.round() as u8,
        v: v.round() as u8,
    }
}

/// A detected marker blob: centroid of the largest in-range component and
/// half its larger bounding-box extent (a stand-in for the enclosing-circle
/// radius of the blob).
#[derive(Clone, Copy, Debug)]
pub struct Blob {
    pub center: Point,
    pub radius: f32,
}

/// Find the largest connected region of pixels inside `range`.
/// Returns `None` when nothing in the frame matches at all; the caller
/// applies the minimum-radius confidence gate on top.
pub fn locate_marker(frame: &FrameBuffer, range: &ColorRange) -> Option<Blob> {
    let w = frame.width;
    let h = frame.height;

    // Threshold pass: one bool per pixel.
    let mut mask = vec![false; w * h];
    for (i, px) in frame.pixels.iter().enumerate() {
        mask[i] = range.contains(rgb_to_hsv(*px));
    }

    // Flood-fill each component (4-connected) and keep the biggest.
    let mut visited = vec![false; w * h];
    let mut stack: Vec<usize> = Vec::new();
    let mut best: Option<(usize, f64, f64, usize, usize, usize, usize)> = None;

    for start in 0..w * h {
        if !mask[start] || visited[start] {
            continue;
        }
        let mut count = 0usize;
        let (mut sum_x, mut sum_y) = (0f64, 0f64);
        let (mut min_x, mut max_x) = (w, 0usize);
        let (mut min_y, mut max_y) = (h, 0usize);

        visited[start] = true;
        stack.push(start);
        while let Some(idx) = stack.pop() {
            let x = idx % w;
            let y = idx / w;
            count += 1;
            sum_x += x as f64;
            sum_y += y as f64;
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);

            let mut push = |n: usize| {
                if mask[n] && !visited[n] {
                    visited[n] = true;
                    stack.push(n);
                }
            };
            if x > 0 {
                push(idx - 1);
            }
            if x + 1 < w {
                push(idx + 1);
            }
            if y > 0 {
                push(idx - w);
            }
            if y + 1 < h {
                push(idx + w);
            }
        }

        if best.is_none_or(|b| count > b.0) {
            best = Some((count, sum_x, sum_y, min_x, max_x, min_y, max_y));
        }
    }

    best.map(|(count, sum_x, sum_y, min_x, max_x, min_y, max_y)| {
        let bw = (max_x - min_x + 1) as f32;
        let bh = (max_y - min_y + 1) as f32;
        Blob {
            center: Point::new(
                (sum_x / count as f64) as f32,
                (sum_y / count as f64) as f32,
            ),
            radius: 0.5 * bw.max(bh),
        }
    })
}

/// Average a small box at the frame's geometric center and convert to HSV.
/// This is the raw sample calibration widens into a `ColorRange`.
pub fn sample_center_color(frame: &FrameBuffer) -> Hsv {
    let cx = frame.width / 2;
    let cy = frame.height / 2;
    let r = CENTER_SAMPLE_BOX / 2;

    let (mut sr, mut sg, mut sb) = (0u64, 0u64, 0u64);
    let mut n = 0u64;
    for y in cy.saturating_sub(r)..=(cy + r).min(frame.height - 1) {
        for x in cx.saturating_sub(r)..=(cx + r).min(frame.width - 1) {
            let px = frame.pixels[y * frame.width + x];
            sr += ((px >> 16) & 0xFF) as u64;
            sg += ((px >> 8) & 0xFF) as u64;
            sb += (px & 0xFF) as u64;
            n += 1;
        }
    }
    let avg = (((sr / n) as u32) << 16) | (((sg / n) as u32) << 8) | (sb / n) as u32;
    rgb_to_hsv(avg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FrameBuffer;

    fn frame_with_square(w: usize, h: usize, x0: usize, y0: usize, side: usize, px: u32) -> FrameBuffer {
        let mut f = FrameBuffer::blank(w, h);
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                f.pixels[y * w + x] = px;
            }
        }
        f
    }

    fn green_range() -> ColorRange {
        ColorRange {
            lower: Hsv { h: 50, s: 50, v: 50 },
            upper: Hsv { h: 70, s: 255, v: 255 },
        }
    }

    #[test]
    fn hsv_of_primaries() {
        assert_eq!(rgb_to_hsv(0x00_FF_00_00), Hsv { h: 0, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv(0x00_00_FF_00), Hsv { h: 60, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv(0x00_00_00_FF), Hsv { h: 120, s: 255, v: 255 });
        // grey: no saturation, hue collapses to 0
        assert_eq!(rgb_to_hsv(0x00_80_80_80), Hsv { h: 0, s: 0, v: 128 });
    }

    #[test]
    fn locate_finds_square_centroid() {
        let f = frame_with_square(100, 80, 30, 20, 11, 0x00_00_FF_00);
        let blob = locate_marker(&f, &green_range()).unwrap();
        assert!((blob.center.x - 35.0).abs() < 0.01);
        assert!((blob.center.y - 25.0).abs() < 0.01);
        assert!((blob.radius - 5.5).abs() < 0.01);
    }

    #[test]
    fn locate_prefers_largest_blob() {
        let mut f = frame_with_square(100, 80, 10, 10, 5, 0x00_00_FF_00);
        for y in 40..60 {
            for x in 60..80 {
                f.pixels[y * 100 + x] = 0x00_00_FF_00;
            }
        }
        let blob = locate_marker(&f, &green_range()).unwrap();
        assert!((blob.center.x - 69.5).abs() < 0.01);
        assert!((blob.center.y - 49.5).abs() < 0.01);
    }

    #[test]
    fn locate_misses_on_empty_frame() {
        let f = FrameBuffer::blank(64, 64);
        assert!(locate_marker(&f, &green_range()).is_none());
    }

    #[test]
    fn center_sample_averages_solid_color() {
        let mut f = FrameBuffer::blank(101, 101);
        for px in &mut f.pixels {
            *px = 0x00_00_00_FF;
        }
        assert_eq!(sample_center_color(&f), Hsv { h: 120, s: 255, v: 255 });
    }
}
