//! Surface lifecycle events and the handler that consumes them

use crate::surface::SurfaceSize;

/// Control flow after handling an event
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ControlFlow {
    /// Keep delivering events
    #[default]
    Continue,
    /// Stop delivering events (the view was torn down)
    Exit,
}

/// Events delivered by the host's embedded surface
///
/// All variants are delivered on the render thread, in the order the host
/// produces them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SurfaceEvent {
    /// The GL surface was created (or recreated after context loss)
    Created,
    /// The surface was resized
    Changed(SurfaceSize),
    /// Frame tick - time to render
    ///
    /// On Android this is `GLSurfaceView.Renderer.onDrawFrame` in
    /// continuous render mode, paced by vsync.
    DrawFrame,
    /// The surface is going away; no further frames will be requested
    Destroyed,
}

/// Consumer of surface events
///
/// Implemented by the render-thread side of a view. The provided
/// [`SurfaceHandler::handle_event`] dispatches an event to the matching
/// callback so platform glue can forward events without matching on them.
pub trait SurfaceHandler {
    /// One-time GL state setup for a fresh surface
    fn on_surface_created(&mut self);

    /// Viewport change
    fn on_surface_changed(&mut self, size: SurfaceSize);

    /// Render one frame
    fn on_draw_frame(&mut self);

    /// Surface teardown
    ///
    /// Returns the control flow for the caller's event pump.
    fn on_surface_destroyed(&mut self) -> ControlFlow {
        ControlFlow::Exit
    }

    /// Dispatch a single event
    fn handle_event(&mut self, event: SurfaceEvent) -> ControlFlow {
        match event {
            SurfaceEvent::Created => self.on_surface_created(),
            SurfaceEvent::Changed(size) => self.on_surface_changed(size),
            SurfaceEvent::DrawFrame => self.on_draw_frame(),
            SurfaceEvent::Destroyed => return self.on_surface_destroyed(),
        }
        ControlFlow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
        last_size: Option<SurfaceSize>,
    }

    impl SurfaceHandler for Recorder {
        fn on_surface_created(&mut self) {
            self.calls.push("created");
        }

        fn on_surface_changed(&mut self, size: SurfaceSize) {
            self.calls.push("changed");
            self.last_size = Some(size);
        }

        fn on_draw_frame(&mut self) {
            self.calls.push("frame");
        }
    }

    #[test]
    fn test_control_flow_default() {
        assert_eq!(ControlFlow::default(), ControlFlow::Continue);
    }

    #[test]
    fn test_handle_event_dispatches_in_order() {
        let mut recorder = Recorder::default();
        let size = SurfaceSize::new(640, 480);

        assert_eq!(
            recorder.handle_event(SurfaceEvent::Created),
            ControlFlow::Continue
        );
        recorder.handle_event(SurfaceEvent::Changed(size));
        recorder.handle_event(SurfaceEvent::DrawFrame);
        assert_eq!(
            recorder.handle_event(SurfaceEvent::Destroyed),
            ControlFlow::Exit
        );

        assert_eq!(recorder.calls, vec!["created", "changed", "frame"]);
        assert_eq!(recorder.last_size, Some(size));
    }
}
