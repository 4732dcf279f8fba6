// Air Canvas: draw in mid-air with two colored markers.
// What you SEE:
// • Live camera is always the base image, mirrored like a real mirror.
// • First a two-step calibration: hold each marker in the ring until the
//   countdown runs out.
// • Then the first marker draws and the second one presses the on-screen
//   buttons (tools, colors, thickness, save, clear). ESC quits.

mod calibrate;
mod camera;
mod controls;
mod cursor;
mod error;
mod export;
mod render;
mod store;
mod tools;
mod types;
mod vision;

use std::time::{Duration, Instant};

use camera::CameraCapture;
use error::Error;
use render::Drawer;
use tools::Session;

fn main() -> Result<(), Error> {
    env_logger::init();

    /* --- Camera + window setup ---
       Visual: window opens with the live camera feed. */
    let mut cam = CameraCapture::new(0, 640, 480)?;
    let (w, h) = cam.resolution();
    let mut drawer = Drawer::new("Air Canvas", w as usize, h as usize)?;

    /* --- Everything that outlives a frame lives in the session. */
    let mut session = Session::new(Instant::now());
    let mut save_counter = 0u32;

    let mut last_fps_time = Instant::now();
    let mut frames_this_second = 0u32;

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        let now = Instant::now();

        /* 1) Grab a fresh mirrored frame (what the camera sees right now). */
        let frame = cam.next_frame()?;

        /* 2) One atomic tick: resolve cursors, run the active tool,
           dispatch the pointer against the controls. */
        session.tick(now, &frame);

        /* 3) Save was pressed: snapshot = clean camera frame + geometry,
           no chrome, no cursor rings. */
        if session.take_export_request() {
            let mut snapshot = frame.clone();
            render::compose_geometry(&mut snapshot, &session.store);
            let path = export::save_png(&snapshot, save_counter)?;
            save_counter += 1;
            log::info!("saved canvas to {path}");
        }

        /* 4) Composite the live view on top of the frame and present it. */
        let mut screen = frame;
        render::compose(&mut screen, &session, now);
        drawer.present(&screen)?;

        /* 5) FPS counter, once per second. */
        frames_this_second += 1;
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            log::debug!("FPS: {:.1}", frames_this_second as f32 / secs);
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    Ok(())
}
