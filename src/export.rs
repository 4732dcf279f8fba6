// Still-image export for the Save control. The snapshot is the camera frame
// with the persisted geometry composited on top (no chrome, no cursors);
// each save in a session gets the next numbered file name.

use image::RgbImage;

use crate::error::Error;
use crate::types::FrameBuffer;

/// Unpack the 0x00RRGGBB buffer into an RGB image for encoding.
fn rgb_image_from(frame: &FrameBuffer) -> RgbImage {
    let mut img = RgbImage::new(frame.width as u32, frame.height as u32);
    for (i, px) in frame.pixels.iter().enumerate() {
        let x = (i % frame.width) as u32;
        let y = (i / frame.width) as u32;
        img.put_pixel(
            x,
            y,
            image::Rgb([((px >> 16) & 0xFF) as u8, ((px >> 8) & 0xFF) as u8, (px & 0xFF) as u8]),
        );
    }
    img
}

/// Write `frame` as `Drawing{counter}.png` in the working directory.
pub fn save_png(frame: &FrameBuffer, counter: u32) -> Result<String, Error> {
    let path = format!("Drawing{counter}.png");
    rgb_image_from(frame).save(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpack_preserves_channels() {
        let mut fb = FrameBuffer::blank(2, 1);
        fb.pixels[0] = 0x00_12_34_56;
        fb.pixels[1] = 0x00_FF_00_80;
        let img = rgb_image_from(&fb);
        assert_eq!(img.get_pixel(0, 0).0, [0x12, 0x34, 0x56]);
        assert_eq!(img.get_pixel(1, 0).0, [0xFF, 0x00, 0x80]);
    }
}
