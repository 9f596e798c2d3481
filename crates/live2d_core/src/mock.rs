//! Test doubles for the model runtime

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use slotmap::SlotMap;

use crate::command::MotionPriority;
use crate::renderer::{ModelHandle, ModelRenderer, RenderFramework, RendererError};
use crate::transform::Mat4;

#[derive(Default)]
pub struct MockFramework {
    startups: AtomicUsize,
    initializations: AtomicUsize,
    disposals: AtomicUsize,
    fail_with: Option<String>,
    fail_initialize_with: Option<String>,
}

impl MockFramework {
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn failing_initialize(message: &str) -> Self {
        Self {
            fail_initialize_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn startups(&self) -> usize {
        self.startups.load(Ordering::SeqCst)
    }

    pub fn initializations(&self) -> usize {
        self.initializations.load(Ordering::SeqCst)
    }

    pub fn disposals(&self) -> usize {
        self.disposals.load(Ordering::SeqCst)
    }
}

impl RenderFramework for MockFramework {
    fn startup(&self) -> Result<(), RendererError> {
        self.startups.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(msg) => Err(RendererError::Framework(msg.clone())),
            None => Ok(()),
        }
    }

    fn initialize(&self) -> Result<(), RendererError> {
        self.initializations.fetch_add(1, Ordering::SeqCst);
        match &self.fail_initialize_with {
            Some(msg) => Err(RendererError::Framework(msg.clone())),
            None => Ok(()),
        }
    }

    fn dispose(&self) {
        self.disposals.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct MockModel {
    pub path: String,
}

/// Renderer that records every call
#[derive(Default)]
pub struct RecordingRenderer {
    pub models: SlotMap<ModelHandle, MockModel>,
    pub calls: Vec<String>,
    pub draws: Vec<Mat4>,
    pub clears: usize,
    pub released: Vec<String>,
    pub closed: usize,
    pub canvas: (f32, f32),
    pub fail_loads: HashSet<String>,
    pub fail_draws: bool,
    pub panic_on_clear: bool,
    pub motion_groups: Option<HashSet<String>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self {
            canvas: (2.0, 2.0),
            ..Default::default()
        }
    }
}

impl ModelRenderer for RecordingRenderer {
    fn prepare_surface(&mut self) {
        self.calls.push("prepare_surface".into());
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.calls.push(format!("viewport {}x{}", width, height));
    }

    fn clear(&mut self, _color: [f32; 4]) {
        assert!(!self.panic_on_clear, "clear with a lost context");
        self.clears += 1;
    }

    fn load_assets(&mut self, dir: &str, file: &str) -> Result<ModelHandle, RendererError> {
        let path = format!("{}{}", dir, file);
        self.calls.push(format!("load {}|{}", dir, file));
        if self.fail_loads.contains(&path) {
            return Err(RendererError::Load(format!("cannot parse {}", file)));
        }
        Ok(self.models.insert(MockModel { path }))
    }

    fn canvas_size(&self, model: ModelHandle) -> Option<(f32, f32)> {
        self.models.get(model).map(|_| self.canvas)
    }

    fn release(&mut self, model: ModelHandle) {
        if let Some(m) = self.models.remove(model) {
            self.calls.push(format!("release {}", m.path));
            self.released.push(m.path);
        }
    }

    fn update(&mut self, _model: ModelHandle) {}

    fn draw(&mut self, model: ModelHandle, transform: &Mat4) -> Result<(), RendererError> {
        if !self.models.contains_key(model) {
            return Err(RendererError::UnknownModel);
        }
        if self.fail_draws {
            return Err(RendererError::Draw("lost context".into()));
        }
        self.draws.push(*transform);
        Ok(())
    }

    fn start_motion(
        &mut self,
        _model: ModelHandle,
        group: &str,
        index: u32,
        priority: MotionPriority,
    ) -> Result<(), RendererError> {
        if let Some(groups) = &self.motion_groups {
            if !groups.contains(group) {
                return Err(RendererError::Animation(format!("no motion group {}", group)));
            }
        }
        self.calls
            .push(format!("motion {}[{}] p{}", group, index, priority.level()));
        Ok(())
    }

    fn set_expression(&mut self, _model: ModelHandle, id: &str) -> Result<(), RendererError> {
        self.calls.push(format!("expression {}", id));
        Ok(())
    }

    fn close(&mut self) {
        self.closed += 1;
    }
}
