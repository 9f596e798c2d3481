//! Per-frame command application and drawing
//!
//! Each tick runs entirely on the render thread:
//!
//! 1. drain at most `max_commands_per_tick` commands
//! 2. apply them to [`ViewState`] in FIFO order
//! 3. forward the latest motion/expression request, if a model is loaded
//! 4. recompute the view matrix
//! 5. clear, then update and draw the model (if any)
//!
//! Nothing here is shared with the control plane except the queue.

use std::sync::Arc;

use live2d_platform::SurfaceSize;

use crate::command::{Command, ModelPath};
use crate::config::BridgeConfig;
use crate::events::{EventSink, ViewEvent};
use crate::lifecycle::{Phase, PhaseCell};
use crate::queue::{CommandQueue, Envelope};
use crate::renderer::ModelRenderer;
use crate::state::{LoadedModel, MotionRequest, ViewState};
use crate::transform::{self, Mat4};

/// What one tick did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Commands applied this tick
    pub applied: usize,
    /// Commands left in the queue for later ticks
    pub deferred: usize,
    /// Whether a model was drawn successfully
    pub drew: bool,
}

/// Render-thread owner of the view state and the renderer
pub struct RenderLoop<R: ModelRenderer> {
    renderer: R,
    state: ViewState,
    transform: Mat4,
    queue: Arc<CommandQueue>,
    phase: Arc<PhaseCell>,
    events: EventSink,
    max_commands_per_tick: usize,
    canvas_width_threshold: f32,
    clear_color: [f32; 4],
    frames: u64,
    closed: bool,
}

impl<R: ModelRenderer> RenderLoop<R> {
    pub fn new(
        renderer: R,
        queue: Arc<CommandQueue>,
        phase: Arc<PhaseCell>,
        events: EventSink,
        config: &BridgeConfig,
    ) -> Self {
        Self {
            renderer,
            state: ViewState::default(),
            transform: Mat4::IDENTITY,
            queue,
            phase,
            events,
            max_commands_per_tick: config.max_commands_per_tick.max(1),
            canvas_width_threshold: config.canvas_width_threshold,
            clear_color: config.clear_color,
            frames: 0,
            closed: false,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Matrix used by the most recent draw
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn events(&self) -> &EventSink {
        &self.events
    }

    /// Ticks completed so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn surface_created(&mut self) {
        if self.closed {
            return;
        }
        tracing::debug!("Surface created");
        self.renderer.prepare_surface();
    }

    pub fn surface_changed(&mut self, size: SurfaceSize) {
        if self.closed {
            return;
        }
        tracing::debug!("Surface changed: {}x{}", size.width, size.height);
        self.state.surface = size;
        self.renderer.set_viewport(size.width, size.height);
    }

    /// Run one frame
    pub fn tick(&mut self) -> TickStats {
        let mut stats = TickStats::default();
        match self.phase.get() {
            Phase::Disposed => return stats,
            Phase::Uninitialized => {
                // Nothing can be queued yet; keep the surface clean
                self.renderer.clear(self.clear_color);
                self.frames += 1;
                return stats;
            }
            Phase::Started => {}
        }

        let batch = self.queue.drain(self.max_commands_per_tick);
        stats.applied = batch.len();
        for envelope in batch {
            self.apply(envelope);
        }
        stats.deferred = self.queue.len();
        if stats.deferred > 0 {
            tracing::debug!("Deferring {} commands to the next frame", stats.deferred);
        }

        self.flush_animation_requests();

        self.transform = transform::view_matrix(
            transform::aspect_correction(
                self.state.surface,
                self.state.canvas_width(),
                self.canvas_width_threshold,
            ),
            self.state.scale,
            self.state.position,
        );

        self.renderer.clear(self.clear_color);
        if let Some(model) = self.state.model_handle() {
            self.renderer.update(model);
            match self.renderer.draw(model, &self.transform) {
                Ok(()) => stats.drew = true,
                Err(e) => self.events.emit(ViewEvent::RenderFault {
                    message: e.to_string(),
                }),
            }
        }
        self.frames += 1;
        stats
    }

    fn apply(&mut self, envelope: Envelope) {
        let Envelope { sequence, command } = envelope;
        tracing::trace!("Applying #{} {}", sequence, command.name());
        match command {
            Command::LoadModel { path } => self.load_model(sequence, path),
            Command::SetScale { factor } => self.state.scale = factor,
            Command::SetPosition { x, y } => self.state.position = (x, y),
            Command::StartMotion {
                group,
                index,
                priority,
            } => {
                self.state.pending_motion = Some(MotionRequest {
                    group,
                    index,
                    priority,
                })
            }
            Command::SetExpression { id } => self.state.pending_expression = Some(id),
            Command::Drag { x, y } => self.apply_drag(x, y),
        }
        self.state.last_applied = sequence;
    }

    /// Replace the model; the old one is released before the new load starts
    fn load_model(&mut self, sequence: u64, path: ModelPath) {
        if let Some(old) = self.state.model.take() {
            tracing::debug!("Releasing model {}", old.path);
            self.renderer.release(old.handle);
        }
        let full = path.full();
        match self.renderer.load_assets(&path.dir, &path.file) {
            Ok(handle) => {
                let canvas = self.renderer.canvas_size(handle).unwrap_or((0.0, 0.0));
                self.state.model = Some(LoadedModel {
                    handle,
                    path: full.clone(),
                    canvas,
                });
                self.state.last_load_error = None;
                self.events.emit(ViewEvent::ModelLoaded {
                    sequence,
                    path: full,
                });
            }
            Err(e) => {
                let message = e.to_string();
                self.state.last_load_error = Some(message.clone());
                self.events.emit(ViewEvent::LoadFailed {
                    sequence,
                    path: full,
                    message,
                });
            }
        }
    }

    /// Touch drags arrive in surface pixels; the view works in `-1..1`
    fn apply_drag(&mut self, x: f32, y: f32) {
        let surface = self.state.surface;
        if surface.is_empty() {
            tracing::debug!("Ignoring drag before the surface has a size");
            return;
        }
        self.state.position = (
            x / surface.width as f32 * 2.0 - 1.0,
            1.0 - y / surface.height as f32 * 2.0,
        );
    }

    /// Forward pending triggers to the runtime
    ///
    /// Requests wait (latest wins) until a model is loaded.
    fn flush_animation_requests(&mut self) {
        let Some(model) = self.state.model_handle() else {
            if self.state.pending_motion.is_some() || self.state.pending_expression.is_some() {
                tracing::trace!("Holding animation requests until a model loads");
            }
            return;
        };
        if let Some(motion) = self.state.pending_motion.take() {
            if let Err(e) =
                self.renderer
                    .start_motion(model, &motion.group, motion.index, motion.priority)
            {
                self.events.emit(ViewEvent::AnimationRejected {
                    request: format!("motion {}[{}]", motion.group, motion.index),
                    message: e.to_string(),
                });
            }
        }
        if let Some(id) = self.state.pending_expression.take() {
            if let Err(e) = self.renderer.set_expression(model, &id) {
                self.events.emit(ViewEvent::AnimationRejected {
                    request: format!("expression {}", id),
                    message: e.to_string(),
                });
            }
        }
    }

    /// Free the model and the renderer; later calls do nothing
    pub fn release_resources(&mut self) {
        if self.closed {
            return;
        }
        if let Some(model) = self.state.model.take() {
            tracing::debug!("Releasing model {}", model.path);
            self.renderer.release(model.handle);
        }
        self.state.pending_motion = None;
        self.state.pending_expression = None;
        self.renderer.close();
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::MotionPriority;
    use crate::framework::FrameworkScope;
    use crate::lifecycle::LifecycleManager;
    use crate::mock::{MockFramework, RecordingRenderer};
    use std::sync::Mutex;

    struct Harness {
        render_loop: RenderLoop<RecordingRenderer>,
        queue: Arc<CommandQueue>,
        lifecycle: LifecycleManager,
        events: Arc<Mutex<Vec<ViewEvent>>>,
    }

    impl Harness {
        fn new(config: BridgeConfig) -> Self {
            let queue = Arc::new(CommandQueue::new(config.queue_capacity));
            let mut lifecycle = LifecycleManager::new(
                FrameworkScope::new(Arc::new(MockFramework::default())),
                queue.clone(),
            );
            lifecycle.start().unwrap();
            let events = Arc::new(Mutex::new(Vec::new()));
            let sink = {
                let events = Arc::clone(&events);
                EventSink::with_listener(move |e| events.lock().unwrap().push(e.clone()))
            };
            let mut render_loop = RenderLoop::new(
                RecordingRenderer::new(),
                queue.clone(),
                lifecycle.phase_cell(),
                sink,
                &config,
            );
            render_loop.surface_changed(SurfaceSize::new(1000, 500));
            Self {
                render_loop,
                queue,
                lifecycle,
                events,
            }
        }

        fn push(&self, command: Command) {
            self.queue.push(command).unwrap();
        }

        fn load(&self, path: &str) {
            self.push(Command::LoadModel {
                path: ModelPath::parse(path).unwrap(),
            });
        }
    }

    #[test]
    fn test_scale_applied_before_draw() {
        let mut h = Harness::new(BridgeConfig::default());
        h.load("models/hiyori/hiyori.model3.json");
        h.push(Command::SetScale { factor: 2.0 });
        let stats = h.render_loop.tick();

        assert_eq!(stats.applied, 2);
        assert!(stats.drew);
        assert_eq!(h.render_loop.state().scale, 2.0);
        // Landscape 1000x500: aspect (0.5, 1.0) times uniform 2.0
        let drawn = h.render_loop.renderer().draws[0];
        assert!((drawn.cols[0][0] - 1.0).abs() < 1e-6);
        assert!((drawn.cols[1][1] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_last_position_wins_within_tick() {
        let mut h = Harness::new(BridgeConfig::default());
        h.push(Command::SetPosition { x: 1.0, y: 1.0 });
        h.push(Command::SetPosition { x: 2.0, y: 2.0 });
        h.render_loop.tick();
        assert_eq!(h.render_loop.state().position, (2.0, 2.0));
    }

    #[test]
    fn test_load_splits_path_for_renderer() {
        let mut h = Harness::new(BridgeConfig::default());
        h.load("models/hiyori/hiyori.model3.json");
        h.render_loop.tick();
        assert!(h
            .render_loop
            .renderer()
            .calls
            .contains(&"load models/hiyori/|hiyori.model3.json".to_string()));
        assert_eq!(
            h.render_loop.state().model.as_ref().unwrap().path,
            "models/hiyori/hiyori.model3.json"
        );
    }

    #[test]
    fn test_reload_releases_old_model_first() {
        let mut h = Harness::new(BridgeConfig::default());
        h.load("a/one.model3.json");
        h.load("b/two.model3.json");
        h.render_loop.tick();

        let calls = &h.render_loop.renderer().calls;
        let release = calls
            .iter()
            .position(|c| c == "release a/one.model3.json")
            .unwrap();
        let second_load = calls
            .iter()
            .position(|c| c == "load b/|two.model3.json")
            .unwrap();
        assert!(release < second_load);
        assert_eq!(h.render_loop.renderer().models.len(), 1);
    }

    #[test]
    fn test_failed_load_leaves_no_model_and_reports_once() {
        let mut h = Harness::new(BridgeConfig::default());
        h.load("good/ok.model3.json");
        h.render_loop.tick();
        h.render_loop
            .renderer_mut()
            .fail_loads
            .insert("bad/broken.model3.json".into());
        h.load("bad/broken.model3.json");
        h.render_loop.tick();
        h.render_loop.tick();

        let state = h.render_loop.state();
        assert!(state.model.is_none());
        assert!(state.last_load_error.as_ref().unwrap().contains("broken"));
        let failures = h
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, ViewEvent::LoadFailed { .. }))
            .count();
        assert_eq!(failures, 1);
        // No retry: exactly one attempt at the broken path
        let attempts = h
            .render_loop
            .renderer()
            .calls
            .iter()
            .filter(|c| c.contains("broken"))
            .count();
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_no_model_means_clear_only() {
        let mut h = Harness::new(BridgeConfig::default());
        let stats = h.render_loop.tick();
        assert!(!stats.drew);
        assert_eq!(h.render_loop.renderer().clears, 1);
        assert!(h.render_loop.renderer().draws.is_empty());
    }

    #[test]
    fn test_bounded_drain_still_draws() {
        let mut h = Harness::new(
            BridgeConfig::default()
                .queue_capacity(16)
                .max_commands_per_tick(4),
        );
        h.load("m/m.model3.json");
        for i in 0..9 {
            h.push(Command::SetScale { factor: i as f32 });
        }
        let first = h.render_loop.tick();
        assert_eq!(first.applied, 4);
        assert_eq!(first.deferred, 6);
        assert!(first.drew);

        h.render_loop.tick();
        let last = h.render_loop.tick();
        assert_eq!(last.deferred, 0);
        assert_eq!(h.render_loop.state().scale, 8.0);
        assert_eq!(h.render_loop.renderer().draws.len(), 3);
    }

    #[test]
    fn test_motion_and_expression_latest_wins() {
        let mut h = Harness::new(BridgeConfig::default());
        h.load("m/m.model3.json");
        h.push(Command::StartMotion {
            group: "Idle".into(),
            index: 0,
            priority: MotionPriority::Idle,
        });
        h.push(Command::StartMotion {
            group: "TapBody".into(),
            index: 2,
            priority: MotionPriority::Force,
        });
        h.push(Command::SetExpression { id: "f01".into() });
        h.push(Command::SetExpression { id: "f02".into() });
        h.render_loop.tick();

        let calls = &h.render_loop.renderer().calls;
        assert!(calls.contains(&"motion TapBody[2] p3".to_string()));
        assert!(!calls.iter().any(|c| c.starts_with("motion Idle")));
        assert!(calls.contains(&"expression f02".to_string()));
        assert!(!calls.contains(&"expression f01".to_string()));
        assert!(h.render_loop.state().pending_motion.is_none());
    }

    #[test]
    fn test_animation_requests_wait_for_model() {
        let mut h = Harness::new(BridgeConfig::default());
        h.push(Command::SetExpression { id: "f01".into() });
        h.render_loop.tick();
        assert_eq!(
            h.render_loop.state().pending_expression.as_deref(),
            Some("f01")
        );

        h.load("m/m.model3.json");
        h.render_loop.tick();
        assert!(h
            .render_loop
            .renderer()
            .calls
            .contains(&"expression f01".to_string()));
        assert!(h.render_loop.state().pending_expression.is_none());
    }

    #[test]
    fn test_rejected_motion_is_reported() {
        let mut h = Harness::new(BridgeConfig::default());
        h.render_loop.renderer_mut().motion_groups = Some(["Idle".to_string()].into());
        h.load("m/m.model3.json");
        h.push(Command::StartMotion {
            group: "Dance".into(),
            index: 0,
            priority: MotionPriority::Normal,
        });
        h.render_loop.tick();
        assert!(h
            .events
            .lock()
            .unwrap()
            .iter()
            .any(|e| matches!(e, ViewEvent::AnimationRejected { .. })));
    }

    #[test]
    fn test_render_fault_does_not_stop_loop() {
        let mut h = Harness::new(BridgeConfig::default());
        h.load("m/m.model3.json");
        h.render_loop.renderer_mut().fail_draws = true;
        let stats = h.render_loop.tick();
        assert!(!stats.drew);

        h.render_loop.renderer_mut().fail_draws = false;
        h.push(Command::SetScale { factor: 3.0 });
        let stats = h.render_loop.tick();
        assert!(stats.drew);
        assert_eq!(h.render_loop.frames(), 2);
        assert!(h
            .events
            .lock()
            .unwrap()
            .iter()
            .any(|e| matches!(e, ViewEvent::RenderFault { .. })));
    }

    #[test]
    fn test_drag_maps_pixels_to_view_space() {
        let mut h = Harness::new(BridgeConfig::default());
        h.push(Command::Drag { x: 750.0, y: 125.0 });
        h.render_loop.tick();
        assert_eq!(h.render_loop.state().position, (0.5, 0.5));
    }

    #[test]
    fn test_dispose_discards_pending_and_releases() {
        let mut h = Harness::new(BridgeConfig::default());
        h.load("m/m.model3.json");
        h.render_loop.tick();
        h.push(Command::SetScale { factor: 9.0 });

        let render_loop = &mut h.render_loop;
        let discarded = h.lifecycle.dispose(|| render_loop.release_resources());
        assert_eq!(discarded, Some(1));

        let stats = h.render_loop.tick();
        assert_eq!(stats, TickStats::default());
        assert_eq!(h.render_loop.state().scale, 1.0);
        assert_eq!(h.render_loop.renderer().closed, 1);
        assert!(h.render_loop.renderer().models.is_empty());

        h.render_loop.release_resources();
        assert_eq!(h.render_loop.renderer().closed, 1);
    }

    #[test]
    fn test_last_applied_tracks_sequence() {
        let mut h = Harness::new(BridgeConfig::default());
        let ack = h.queue.push(Command::SetScale { factor: 1.5 }).unwrap();
        h.render_loop.tick();
        assert_eq!(h.render_loop.state().last_applied, ack.sequence);
    }
}
