// Opens the default camera and converts frames into the window's pixel
// layout. Frames are mirrored left-to-right while decoding so that moving
// a marker to your left moves the cursor left on screen.

use crate::error::Error;
use crate::types::FrameBuffer;

use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};

pub struct CameraCapture {
    cam: Camera,
    width: u32,
    height: u32,
}

impl CameraCapture {
    /// Open camera `index` near the requested resolution and start streaming.
    /// The driver may pick a slightly different size; `resolution()` reports
    /// what it actually delivers.
    pub fn new(index: u32, width: u32, height: u32) -> Result<Self, Error> {
        let idx = CameraIndex::Index(index);

        let fmt = CameraFormat::new(
            Resolution::new(width, height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            30,
        );
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        let mut cam = Camera::new(idx, req)
            .map_err(|e| Error::CameraInit(format!("Create camera: {e}")))?;
        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("Open stream: {e}")))?;

        let actual = cam.resolution();
        log::info!("camera open at {}x{}", actual.width(), actual.height());

        Ok(Self { cam, width: actual.width(), height: actual.height() })
    }

    /// Block for the next frame, decode it to RGB, and pack it as mirrored
    /// 0x00RRGGBB pixels ready for both the blob pass and the window.
    pub fn next_frame(&mut self) -> Result<FrameBuffer, Error> {
        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::CameraFrame(format!("Fetch frame: {e}")))?;
        let rgb_img = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("Decode RGB: {e}")))?;

        let (w, h) = rgb_img.dimensions();
        let (w, h) = (w as usize, h as usize);
        let raw = rgb_img.as_raw();
        let mut out = vec![0u32; w * h];

        for y in 0..h {
            let row = y * w;
            for x in 0..w {
                let src = (row + x) * 3;
                let r = raw[src] as u32;
                let g = raw[src + 1] as u32;
                let b = raw[src + 2] as u32;
                // mirror: rightmost source pixel lands leftmost on screen
                out[row + (w - 1 - x)] = (r << 16) | (g << 8) | b;
            }
        }

        Ok(FrameBuffer { width: w, height: h, pixels: out })
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
