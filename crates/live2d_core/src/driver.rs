//! Background frame driver
//!
//! Hosts with a vsync callback (`GLSurfaceView`) call
//! [`SurfaceHandler::on_draw_frame`] themselves. Headless and desktop hosts
//! have no such schedule, so the driver moves the view onto its own thread and
//! ticks it at a fixed rate until stopped.
//!
//! ```ignore
//! let router = view.router();
//! let driver = FrameDriver::spawn(view, 60)?;
//! router.handle_named("setScale", MethodArgs::new().with("scale", 2.0))?;
//! let mut view = driver.stop().expect("render thread panicked");
//! view.dispose();
//! ```

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use live2d_platform::SurfaceHandler;

use crate::renderer::ModelRenderer;
use crate::view::Live2DView;

/// Runs a view's render loop on a dedicated thread
pub struct FrameDriver<R: ModelRenderer + Send + 'static> {
    stop_flag: Arc<AtomicBool>,
    frames: Arc<AtomicU64>,
    thread_handle: Option<JoinHandle<Live2DView<R>>>,
}

impl<R: ModelRenderer + Send + 'static> FrameDriver<R> {
    /// Move `view` to a new render thread ticking at `fps`
    pub fn spawn(mut view: Live2DView<R>, fps: u32) -> io::Result<Self> {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let frames = Arc::new(AtomicU64::new(0));
        let frame_duration = Duration::from_micros(1_000_000 / u64::from(fps.max(1)));

        let thread_stop = Arc::clone(&stop_flag);
        let thread_frames = Arc::clone(&frames);
        let thread_handle = thread::Builder::new()
            .name(format!("live2d-render-{}", view.id()))
            .spawn(move || {
                tracing::debug!("Render thread started for view {}", view.id());
                while !thread_stop.load(Ordering::Relaxed) {
                    let start = Instant::now();
                    view.on_draw_frame();
                    thread_frames.fetch_add(1, Ordering::Relaxed);

                    let elapsed = start.elapsed();
                    if elapsed < frame_duration {
                        thread::sleep(frame_duration - elapsed);
                    }
                }
                tracing::debug!("Render thread stopped for view {}", view.id());
                view
            })?;

        Ok(Self {
            stop_flag,
            frames,
            thread_handle: Some(thread_handle),
        })
    }

    /// Frames drawn so far
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Block until at least `count` frames have run or `timeout` passes
    pub fn wait_for_frames(&self, count: u64, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.frames() < count {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
        true
    }

    /// Stop ticking and hand the view back to the caller
    ///
    /// Returns `None` if the render thread panicked.
    pub fn stop(mut self) -> Option<Live2DView<R>> {
        self.stop_flag.store(true, Ordering::Relaxed);
        let handle = self.thread_handle.take()?;
        match handle.join() {
            Ok(view) => Some(view),
            Err(_) => {
                tracing::error!("Render thread panicked");
                None
            }
        }
    }
}

impl<R: ModelRenderer + Send + 'static> Drop for FrameDriver<R> {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread_handle.take() {
            // Dropping the returned view disposes it
            if handle.join().is_err() {
                tracing::error!("Render thread panicked");
            }
        }
    }
}
