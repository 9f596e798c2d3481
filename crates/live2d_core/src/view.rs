//! One embedded Live2D view
//!
//! A view is split along its two execution contexts:
//!
//! - [`Live2DView`] lives on the render thread. It owns the renderer, the
//!   view state and the lifecycle, and receives the surface callbacks.
//! - [`CommandRouter`] (via [`Live2DView::router`]) is a cheap cloneable
//!   handle for control-plane and input threads.
//!
//! ```ignore
//! let mut view = Live2DView::new(1, &config, scope, renderer, EventSink::new());
//! view.start()?;
//! registry.register(view.id(), view.router());
//!
//! // host callbacks on the GL thread
//! view.handle_event(SurfaceEvent::Changed(SurfaceSize::new(1080, 1920)));
//! view.handle_event(SurfaceEvent::DrawFrame);
//!
//! view.dispose();
//! ```

use std::sync::Arc;

use live2d_platform::{SurfaceHandler, SurfaceSize};

use crate::config::BridgeConfig;
use crate::error::Result;
use crate::events::{EventSink, ViewEvent};
use crate::framework::FrameworkScope;
use crate::lifecycle::{LifecycleManager, Phase};
use crate::queue::CommandQueue;
use crate::render_loop::{RenderLoop, TickStats};
use crate::renderer::ModelRenderer;
use crate::router::CommandRouter;
use crate::state::ViewState;
use crate::transform::Mat4;

/// Host-assigned view identifier
pub type ViewId = i64;

/// Render-thread side of one view
pub struct Live2DView<R: ModelRenderer> {
    id: ViewId,
    lifecycle: LifecycleManager,
    render_loop: RenderLoop<R>,
    router: CommandRouter,
}

impl<R: ModelRenderer> Live2DView<R> {
    /// Create an unstarted view
    pub fn new(
        id: ViewId,
        config: &BridgeConfig,
        scope: Arc<FrameworkScope>,
        renderer: R,
        events: EventSink,
    ) -> Self {
        let queue = Arc::new(CommandQueue::new(config.queue_capacity));
        let lifecycle = LifecycleManager::new(scope, Arc::clone(&queue));
        let render_loop = RenderLoop::new(
            renderer,
            Arc::clone(&queue),
            lifecycle.phase_cell(),
            events,
            config,
        );
        let router = CommandRouter::new(queue, lifecycle.phase_cell());
        tracing::debug!("Created view {}", id);
        Self {
            id,
            lifecycle,
            render_loop,
            router,
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    /// Control-plane handle for this view
    pub fn router(&self) -> CommandRouter {
        self.router.clone()
    }

    pub fn phase(&self) -> Phase {
        self.lifecycle.phase()
    }

    pub fn state(&self) -> &ViewState {
        self.render_loop.state()
    }

    pub fn transform(&self) -> Mat4 {
        self.render_loop.transform()
    }

    pub fn renderer(&self) -> &R {
        self.render_loop.renderer()
    }

    pub fn frames(&self) -> u64 {
        self.render_loop.frames()
    }

    /// Start the framework and open the view for commands
    pub fn start(&mut self) -> Result<()> {
        self.lifecycle.start()
    }

    /// Run one frame and report what it did
    pub fn tick(&mut self) -> TickStats {
        self.render_loop.tick()
    }

    /// Tear the view down; returns false if it was already disposed
    pub fn dispose(&mut self) -> bool {
        let render_loop = &mut self.render_loop;
        match self.lifecycle.dispose(|| render_loop.release_resources()) {
            Some(discarded_commands) => {
                self.render_loop
                    .events()
                    .emit(ViewEvent::Disposed { discarded_commands });
                true
            }
            None => false,
        }
    }
}

impl<R: ModelRenderer> SurfaceHandler for Live2DView<R> {
    fn on_surface_created(&mut self) {
        self.render_loop.surface_created();
    }

    fn on_surface_changed(&mut self, size: SurfaceSize) {
        self.render_loop.surface_changed(size);
    }

    fn on_draw_frame(&mut self) {
        self.render_loop.tick();
    }
}

impl<R: ModelRenderer> Drop for Live2DView<R> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use crate::mock::{MockFramework, RecordingRenderer};
    use crate::value::MethodArgs;
    use live2d_platform::{ControlFlow, SurfaceEvent, TouchAction, TouchEvent};
    use std::sync::Mutex;

    fn view(framework: &Arc<MockFramework>) -> Live2DView<RecordingRenderer> {
        Live2DView::new(
            7,
            &BridgeConfig::default(),
            FrameworkScope::new(framework.clone()),
            RecordingRenderer::new(),
            EventSink::new(),
        )
    }

    #[test]
    fn test_end_to_end_scale_scenario() {
        let framework = Arc::new(MockFramework::default());
        let mut view = view(&framework);
        view.start().unwrap();
        view.handle_event(SurfaceEvent::Created);
        view.handle_event(SurfaceEvent::Changed(SurfaceSize::new(1000, 500)));

        let router = view.router();
        router
            .handle_named(
                "loadModel",
                MethodArgs::new().with("modelPath", "models/hiyori/hiyori.model3.json"),
            )
            .unwrap();
        router
            .handle_named("setScale", MethodArgs::new().with("scale", 2.0))
            .unwrap();

        assert_eq!(view.handle_event(SurfaceEvent::DrawFrame), ControlFlow::Continue);
        assert_eq!(view.state().scale, 2.0);
        let m = view.transform();
        assert!((m.cols[0][0] - 1.0).abs() < 1e-6);
        assert!((m.cols[1][1] - 2.0).abs() < 1e-6);
        assert_eq!(view.renderer().draws.len(), 1);
        assert_eq!(
            view.renderer().calls[..2],
            ["prepare_surface".to_string(), "viewport 1000x500".to_string()]
        );
    }

    #[test]
    fn test_dispose_twice_and_drop() {
        let framework = Arc::new(MockFramework::default());
        let mut view = view(&framework);
        view.start().unwrap();
        assert!(view.dispose());
        assert!(!view.dispose());
        drop(view);
        assert_eq!(framework.startups(), 1);
        assert_eq!(framework.disposals(), 1);
    }

    #[test]
    fn test_dispose_before_start() {
        let framework = Arc::new(MockFramework::default());
        let mut view = view(&framework);
        assert!(view.dispose());
        assert_eq!(view.phase(), Phase::Disposed);
        assert_eq!(view.renderer().closed, 1);
        assert!(view.start().is_err());
        assert_eq!(framework.startups(), 0);
    }

    #[test]
    fn test_disposed_event_counts_discarded() {
        let framework = Arc::new(MockFramework::default());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let events = Arc::clone(&events);
            EventSink::with_listener(move |e| events.lock().unwrap().push(e.clone()))
        };
        let mut view = Live2DView::new(
            1,
            &BridgeConfig::default(),
            FrameworkScope::new(framework),
            RecordingRenderer::new(),
            sink,
        );
        view.start().unwrap();
        let router = view.router();
        router
            .handle_named("setScale", MethodArgs::new().with("scale", 3.0))
            .unwrap();
        router
            .handle_named("setExpression", MethodArgs::new().with("expression", "f01"))
            .unwrap();
        view.dispose();

        assert_eq!(
            events.lock().unwrap().last(),
            Some(&ViewEvent::Disposed {
                discarded_commands: 2
            })
        );
        assert_eq!(
            router.handle_named("setScale", MethodArgs::new().with("scale", 1.0)),
            Err(BridgeError::NotReady(Phase::Disposed))
        );
    }

    #[test]
    fn test_two_views_share_one_framework_start() {
        let framework = Arc::new(MockFramework::default());
        let scope = FrameworkScope::new(framework.clone());
        let mut a = Live2DView::new(
            1,
            &BridgeConfig::default(),
            Arc::clone(&scope),
            RecordingRenderer::new(),
            EventSink::new(),
        );
        let mut b = Live2DView::new(
            2,
            &BridgeConfig::default(),
            Arc::clone(&scope),
            RecordingRenderer::new(),
            EventSink::new(),
        );
        a.start().unwrap();
        b.start().unwrap();
        assert_eq!(framework.startups(), 1);

        a.dispose();
        assert_eq!(framework.disposals(), 0);
        b.dispose();
        assert_eq!(framework.disposals(), 1);
    }

    #[test]
    fn test_touch_drag_moves_model() {
        let framework = Arc::new(MockFramework::default());
        let mut view = view(&framework);
        view.start().unwrap();
        view.on_surface_changed(SurfaceSize::new(200, 400));

        let router = view.router();
        router
            .on_touch(TouchEvent::new(TouchAction::Down, 100.0, 200.0))
            .unwrap();
        router
            .on_touch(TouchEvent::new(TouchAction::Move, 200.0, 0.0))
            .unwrap();
        view.on_draw_frame();
        assert_eq!(view.state().position, (1.0, 1.0));
    }
}
