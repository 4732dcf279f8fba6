// One error type for the whole binary. Every variant states *where*
// things went wrong; detection misses are not errors (they flow through
// the cursor layer as "absent") so nothing here covers them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Window init error: {0}")]
    WindowInit(String),

    #[error("Window update error: {0}")]
    WindowUpdate(String),

    #[error("Camera init error: {0}")]
    CameraInit(String),

    #[error("Camera frame error: {0}")]
    CameraFrame(String),

    #[error("Image write error: {0}")]
    ImageWrite(#[from] image::ImageError),
}
