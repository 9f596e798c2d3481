//! Headless model runtime
//!
//! Stands in for the vendor SDK when there is no GPU surface: models are
//! "loaded" by reading their settings file, motions and expressions are
//! checked against the names it declares, and draws are counted.

use std::path::{Path, PathBuf};

use live2d_core::{Mat4, ModelHandle, ModelRenderer, MotionPriority, RenderFramework, RendererError};
use slotmap::SlotMap;

use crate::model::ModelSettings;

/// Process-wide lifecycle that only logs
#[derive(Debug, Default)]
pub struct HeadlessFramework;

impl RenderFramework for HeadlessFramework {
    fn startup(&self) -> Result<(), RendererError> {
        tracing::debug!("Headless framework startup");
        Ok(())
    }

    fn initialize(&self) -> Result<(), RendererError> {
        tracing::debug!("Headless framework initialized");
        Ok(())
    }

    fn dispose(&self) {
        tracing::debug!("Headless framework disposed");
    }
}

struct HeadlessModel {
    path: PathBuf,
    settings: ModelSettings,
    frames: u64,
}

/// Renderer that resolves model paths against an asset root
pub struct HeadlessRenderer {
    root: PathBuf,
    models: SlotMap<ModelHandle, HeadlessModel>,
    draws: u64,
    last_transform: Option<Mat4>,
    triggered: Vec<String>,
}

impl HeadlessRenderer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            models: SlotMap::with_key(),
            draws: 0,
            last_transform: None,
            triggered: Vec::new(),
        }
    }

    pub fn draws(&self) -> u64 {
        self.draws
    }

    pub fn last_transform(&self) -> Option<&Mat4> {
        self.last_transform.as_ref()
    }

    /// Motions and expressions the runtime accepted, in order
    pub fn triggered(&self) -> &[String] {
        &self.triggered
    }

    fn model(&self, handle: ModelHandle) -> Result<&HeadlessModel, RendererError> {
        self.models.get(handle).ok_or(RendererError::UnknownModel)
    }
}

impl ModelRenderer for HeadlessRenderer {
    fn clear(&mut self, _color: [f32; 4]) {}

    fn load_assets(&mut self, dir: &str, file: &str) -> Result<ModelHandle, RendererError> {
        let path = self.root.join(dir).join(file);
        let settings =
            ModelSettings::load(&path).map_err(|e| RendererError::Load(format!("{:#}", e)))?;
        let moc = path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(&settings.file_references.moc);
        if !moc.is_file() {
            return Err(RendererError::Load(format!(
                "moc file {} not found",
                moc.display()
            )));
        }
        tracing::info!("Loaded model {}", path.display());
        Ok(self.models.insert(HeadlessModel {
            path,
            settings,
            frames: 0,
        }))
    }

    fn canvas_size(&self, model: ModelHandle) -> Option<(f32, f32)> {
        self.models.get(model).map(|m| m.settings.canvas_size())
    }

    fn release(&mut self, model: ModelHandle) {
        if let Some(m) = self.models.remove(model) {
            tracing::debug!("Released {} after {} frames", m.path.display(), m.frames);
        }
    }

    fn update(&mut self, model: ModelHandle) {
        if let Some(m) = self.models.get_mut(model) {
            m.frames += 1;
        }
    }

    fn draw(&mut self, model: ModelHandle, transform: &Mat4) -> Result<(), RendererError> {
        self.model(model)?;
        self.draws += 1;
        self.last_transform = Some(*transform);
        Ok(())
    }

    fn start_motion(
        &mut self,
        model: ModelHandle,
        group: &str,
        index: u32,
        priority: MotionPriority,
    ) -> Result<(), RendererError> {
        let count = self
            .model(model)?
            .settings
            .motion_count(group)
            .ok_or_else(|| RendererError::Animation(format!("no motion group {}", group)))?;
        if index as usize >= count {
            return Err(RendererError::Animation(format!(
                "motion {}[{}] out of range ({} motions)",
                group, index, count
            )));
        }
        self.triggered
            .push(format!("motion {}[{}] p{}", group, index, priority.level()));
        Ok(())
    }

    fn set_expression(&mut self, model: ModelHandle, id: &str) -> Result<(), RendererError> {
        if !self.model(model)?.settings.has_expression(id) {
            return Err(RendererError::Animation(format!("no expression {}", id)));
        }
        self.triggered.push(format!("expression {}", id));
        Ok(())
    }

    fn close(&mut self) {
        self.models.clear();
    }
}
