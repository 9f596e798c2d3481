//! Touch input produced on the UI input thread

use crate::error::{PlatformError, Result};

/// Masked Android `MotionEvent` action codes
const ACTION_MASK: i32 = 0xff;
const ACTION_DOWN: i32 = 0;
const ACTION_UP: i32 = 1;
const ACTION_MOVE: i32 = 2;
const ACTION_CANCEL: i32 = 3;
const ACTION_POINTER_DOWN: i32 = 5;
const ACTION_POINTER_UP: i32 = 6;

/// Touch phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TouchAction {
    /// A touch started
    Down,
    /// A touch moved
    Move,
    /// A touch ended
    Up,
    /// A touch was cancelled (e.g., by a system gesture)
    Cancel,
}

impl TouchAction {
    /// Decode an Android `MotionEvent.getAction()` value
    ///
    /// Secondary pointer down/up are folded into `Down`/`Up`.
    pub fn from_android(action: i32) -> Result<Self> {
        match action & ACTION_MASK {
            ACTION_DOWN | ACTION_POINTER_DOWN => Ok(TouchAction::Down),
            ACTION_UP | ACTION_POINTER_UP => Ok(TouchAction::Up),
            ACTION_MOVE => Ok(TouchAction::Move),
            ACTION_CANCEL => Ok(TouchAction::Cancel),
            other => Err(PlatformError::UnknownTouchAction(other)),
        }
    }
}

/// A single-pointer touch event in surface pixel coordinates
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchEvent {
    /// Touch phase
    pub action: TouchAction,
    /// X position in surface pixels
    pub x: f32,
    /// Y position in surface pixels, growing downwards
    pub y: f32,
}

impl TouchEvent {
    pub fn new(action: TouchAction, x: f32, y: f32) -> Self {
        Self { action, x, y }
    }

    /// Decode a raw Android touch callback
    pub fn from_android(action: i32, x: f32, y: f32) -> Result<Self> {
        Ok(Self::new(TouchAction::from_android(action)?, x, y))
    }

    /// Get the position (returns None for Cancel)
    pub fn position(&self) -> Option<(f32, f32)> {
        match self.action {
            TouchAction::Cancel => None,
            _ => Some((self.x, self.y)),
        }
    }
}
