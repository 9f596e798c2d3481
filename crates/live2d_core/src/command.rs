//! View commands and their construction from control-plane calls

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::value::{MethodArgs, MethodCall};

/// Method names understood on the host channels
pub mod methods {
    pub const INIT_LIVE2D: &str = "initLive2d";
    pub const LOAD_MODEL: &str = "loadModel";
    pub const SET_SCALE: &str = "setScale";
    pub const SET_POSITION: &str = "setPosition";
    pub const START_MOTION: &str = "startMotion";
    pub const SET_EXPRESSION: &str = "setExpression";
}

/// Motion playback priority, as understood by the model runtime
///
/// A higher priority interrupts a lower one that is already playing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionPriority {
    /// Lowest; default when the caller gives none
    #[default]
    None = 0,
    Idle = 1,
    Normal = 2,
    Force = 3,
}

impl MotionPriority {
    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            0 => Some(MotionPriority::None),
            1 => Some(MotionPriority::Idle),
            2 => Some(MotionPriority::Normal),
            3 => Some(MotionPriority::Force),
            _ => None,
        }
    }

    pub fn level(self) -> i32 {
        self as i32
    }
}

/// A model settings path split for the runtime's asset loader
///
/// The loader takes a base directory (with trailing separator) and a file
/// name relative to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPath {
    pub dir: String,
    pub file: String,
}

impl ModelPath {
    /// Split at the last `/`
    ///
    /// A path without any separator is a bare file name in the current
    /// asset root, so `dir` is empty.
    pub fn parse(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(BridgeError::invalid("modelPath", "must not be empty"));
        }
        let (dir, file) = match path.rfind('/') {
            Some(idx) => path.split_at(idx + 1),
            None => ("", path),
        };
        if file.is_empty() {
            return Err(BridgeError::invalid(
                "modelPath",
                format!("'{}' names a directory, not a model file", path),
            ));
        }
        Ok(Self {
            dir: dir.to_string(),
            file: file.to_string(),
        })
    }

    /// The path as given by the caller
    pub fn full(&self) -> String {
        format!("{}{}", self.dir, self.file)
    }
}

/// A pending view mutation
///
/// Created on the control plane (or input thread) and consumed exactly once
/// by the render loop.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replace the current model
    LoadModel { path: ModelPath },
    /// Uniform model scale
    SetScale { factor: f32 },
    /// Model translation in view coordinates
    SetPosition { x: f32, y: f32 },
    /// Trigger a motion from a motion group
    StartMotion {
        group: String,
        index: u32,
        priority: MotionPriority,
    },
    /// Apply a named expression
    SetExpression { id: String },
    /// Touch drag in surface pixels, converted on the render thread
    Drag { x: f32, y: f32 },
}

impl Command {
    /// Validate a control-plane call into a command
    ///
    /// Unknown method names fail with `NotImplemented` before any argument
    /// is looked at. `initLive2d` is not a view command and is handled by
    /// the plugin channel itself.
    pub fn from_call(call: &MethodCall) -> Result<Self> {
        let args = &call.args;
        match call.method.as_str() {
            methods::LOAD_MODEL => {
                let path = args.required_non_empty_str("modelPath")?;
                Ok(Command::LoadModel {
                    path: ModelPath::parse(path)?,
                })
            }
            methods::SET_SCALE => Ok(Command::SetScale {
                factor: args.required_f64("scale")? as f32,
            }),
            methods::SET_POSITION => Ok(Command::SetPosition {
                x: args.required_f64("x")? as f32,
                y: args.required_f64("y")? as f32,
            }),
            methods::START_MOTION => parse_start_motion(args),
            methods::SET_EXPRESSION => Ok(Command::SetExpression {
                id: args.required_non_empty_str("expression")?.to_string(),
            }),
            other => Err(BridgeError::NotImplemented(other.to_string())),
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::LoadModel { .. } => methods::LOAD_MODEL,
            Command::SetScale { .. } => methods::SET_SCALE,
            Command::SetPosition { .. } => methods::SET_POSITION,
            Command::StartMotion { .. } => methods::START_MOTION,
            Command::SetExpression { .. } => methods::SET_EXPRESSION,
            Command::Drag { .. } => "drag",
        }
    }
}

fn parse_start_motion(args: &MethodArgs) -> Result<Command> {
    let group = args.required_non_empty_str("group")?.to_string();
    let index = args.required_i64("index")?;
    let index = u32::try_from(index)
        .map_err(|_| BridgeError::invalid("index", format!("{} is not a valid motion index", index)))?;
    let priority = match args.optional_i64("priority")? {
        None => MotionPriority::default(),
        Some(level) => MotionPriority::from_level(level).ok_or_else(|| {
            BridgeError::invalid("priority", format!("{} is not in 0..=3", level))
        })?,
    };
    Ok(Command::StartMotion {
        group,
        index,
        priority,
    })
}
