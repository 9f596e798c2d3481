//! Model settings (`.model3.json`) handling
//!
//! Only the parts the bridge cares about are decoded: the file references a
//! model needs to load and the names its motions and expressions can be
//! triggered by. Unknown keys are ignored.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Decoded `.model3.json`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelSettings {
    #[serde(default)]
    pub version: Option<u32>,
    pub file_references: FileReferences,
    #[serde(default)]
    pub layout: Option<Layout>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileReferences {
    pub moc: String,
    #[serde(default)]
    pub textures: Vec<String>,
    #[serde(default)]
    pub physics: Option<String>,
    #[serde(default)]
    pub pose: Option<String>,
    #[serde(default)]
    pub expressions: Vec<ExpressionRef>,
    #[serde(default)]
    pub motions: BTreeMap<String, Vec<MotionRef>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExpressionRef {
    pub name: String,
    pub file: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MotionRef {
    pub file: String,
}

/// Optional placement hints
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Layout {
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
}

/// Canvas size assumed when the settings carry no layout
pub const DEFAULT_CANVAS: (f32, f32) = (2.0, 2.0);

impl ModelSettings {
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Invalid model settings")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Canvas size in model units
    pub fn canvas_size(&self) -> (f32, f32) {
        let layout = self.layout.as_ref();
        (
            layout.and_then(|l| l.width).unwrap_or(DEFAULT_CANVAS.0),
            layout.and_then(|l| l.height).unwrap_or(DEFAULT_CANVAS.1),
        )
    }

    pub fn motion_count(&self, group: &str) -> Option<usize> {
        self.file_references.motions.get(group).map(Vec::len)
    }

    pub fn has_expression(&self, name: &str) -> bool {
        self.file_references
            .expressions
            .iter()
            .any(|e| e.name == name)
    }

    /// Every referenced file, resolved against `base`
    pub fn referenced_files(&self, base: &Path) -> Vec<(&'static str, PathBuf)> {
        let refs = &self.file_references;
        let mut files = vec![("moc", base.join(&refs.moc))];
        files.extend(refs.textures.iter().map(|t| ("texture", base.join(t))));
        files.extend(refs.physics.iter().map(|p| ("physics", base.join(p))));
        files.extend(refs.pose.iter().map(|p| ("pose", base.join(p))));
        files.extend(
            refs.expressions
                .iter()
                .map(|e| ("expression", base.join(&e.file))),
        );
        files.extend(
            refs.motions
                .values()
                .flatten()
                .map(|m| ("motion", base.join(&m.file))),
        );
        files
    }
}
