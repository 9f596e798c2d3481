//! Replay command - drive a headless view from a script
//!
//! A script is JSON lines. Each line is one step:
//!
//! ```text
//! {"method": "loadModel", "args": {"modelPath": "hiyori/hiyori.model3.json"}}
//! {"method": "setScale", "args": {"scale": 2.0}}
//! {"frames": 3}
//! {"touch": {"action": 2, "x": 540.0, "y": 960.0}}
//! {"surface": {"width": 1920, "height": 1080}}
//! ```
//!
//! Method calls go through the plugin channel exactly as host calls would,
//! so they are only applied on the next frame. Blank lines and lines
//! starting with `#` are skipped.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use live2d_core::{
    Ack, BridgeConfig, EventSink, FrameworkScope, Live2DView, Live2dPlugin, MethodArgs, MethodCall,
    MethodResult, ViewEvent, ViewSummary,
};
use live2d_platform::{SurfaceHandler, SurfaceSize, TouchEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::headless::{HeadlessFramework, HeadlessRenderer};

/// Id of the single replayed view
const REPLAY_VIEW: i64 = 1;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Step {
    Call {
        method: String,
        #[serde(default)]
        args: Value,
    },
    Frames {
        frames: u32,
    },
    Touch {
        touch: TouchStep,
    },
    Surface {
        surface: SurfaceSize,
    },
}

/// Raw Android touch callback values
#[derive(Debug, Deserialize)]
struct TouchStep {
    action: i32,
    x: f32,
    y: f32,
}

/// Settings for one replay run
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    /// Directory model paths are resolved against
    pub asset_root: PathBuf,
    pub surface: SurfaceSize,
    /// Frames to run after the last step
    pub trailing_frames: u32,
    pub config: BridgeConfig,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            surface: SurfaceSize::new(1080, 1920),
            trailing_frames: 1,
            config: BridgeConfig::default(),
        }
    }
}

/// What one step did
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub line: usize,
    pub step: String,
    pub result: Value,
}

/// Everything a replay produced
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub steps: Vec<StepOutcome>,
    pub events: Vec<ViewEvent>,
    pub summary: ViewSummary,
    pub frames: u64,
    pub draws: u64,
    /// Matrix of the last successful draw, column-major
    pub last_transform: Option<[f32; 16]>,
    pub triggered: Vec<String>,
}

impl ReplayReport {
    /// Method calls that did not succeed
    pub fn failed_calls(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.result.get("success") == Some(&Value::Bool(false)))
            .count()
    }
}

/// Run a script against a fresh headless view
pub fn run(script: &str, options: &ReplayOptions) -> Result<ReplayReport> {
    options.config.validate()?;

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let events = Arc::clone(&events);
        EventSink::with_listener(move |event: &ViewEvent| {
            events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event.clone())
        })
    };

    let scope = FrameworkScope::new(Arc::new(HeadlessFramework::default()));
    let renderer = HeadlessRenderer::new(&options.asset_root);
    let mut view = Live2DView::new(REPLAY_VIEW, &options.config, scope, renderer, sink);
    view.start()?;
    view.on_surface_created();
    view.on_surface_changed(options.surface);

    let plugin = Live2dPlugin::new();
    plugin.registry().register(view.id(), view.router());

    let mut steps = Vec::new();
    for (index, raw) in script.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let step: Step = serde_json::from_str(text)
            .with_context(|| format!("Line {}: not a replay step", line))?;
        steps.push(run_step(line, step, &plugin, &mut view)?);
    }

    for _ in 0..options.trailing_frames {
        view.tick();
    }

    let summary = view.state().summary();
    let frames = view.frames();
    let draws = view.renderer().draws();
    let last_transform = view.renderer().last_transform().map(|m| m.to_cols_array());
    let triggered = view.renderer().triggered().to_vec();

    plugin.registry().unregister(view.id());
    view.dispose();

    let events = std::mem::take(&mut *events.lock().unwrap_or_else(PoisonError::into_inner));
    Ok(ReplayReport {
        steps,
        events,
        summary,
        frames,
        draws,
        last_transform,
        triggered,
    })
}

fn run_step(
    line: usize,
    step: Step,
    plugin: &Live2dPlugin,
    view: &mut Live2DView<HeadlessRenderer>,
) -> Result<StepOutcome> {
    let outcome = match step {
        Step::Call { method, args } => {
            let result = match MethodArgs::from_value(args) {
                Ok(args) => plugin.handle_method_call(&MethodCall::new(method.as_str(), args)),
                Err(e) => MethodResult::from(Err::<Ack, _>(e)),
            };
            tracing::debug!("Line {}: {} -> {:?}", line, method, result);
            StepOutcome {
                line,
                step: method,
                result: serde_json::from_str(&result.to_json())?,
            }
        }
        Step::Frames { frames } => {
            let mut applied = 0;
            for _ in 0..frames {
                applied += view.tick().applied;
            }
            StepOutcome {
                line,
                step: "frames".into(),
                result: serde_json::json!({ "frames": frames, "applied": applied }),
            }
        }
        Step::Touch { touch } => {
            let event = TouchEvent::from_android(touch.action, touch.x, touch.y)
                .with_context(|| format!("Line {}: bad touch event", line))?;
            let result = match view.router().on_touch(event) {
                Ok(consumed) => serde_json::json!({ "consumed": consumed }),
                Err(e) => serde_json::json!({ "success": false, "errorType": e.code() }),
            };
            StepOutcome {
                line,
                step: "touch".into(),
                result,
            }
        }
        Step::Surface { surface } => {
            view.on_surface_changed(surface);
            StepOutcome {
                line,
                step: "surface".into(),
                result: serde_json::json!({ "width": surface.width, "height": surface.height }),
            }
        }
    };
    Ok(outcome)
}
