//! Live2D Bridge Android Platform
//!
//! Hosts Live2D views inside Android `GLSurfaceView`s embedded by the Flutter
//! plugin.
//!
//! - [`jni_bridge`] - JNI exports for view creation, surface callbacks,
//!   touch input and both method channels
//! - [`cubism`] - the model runtime adapter that calls the Kotlin Cubism
//!   wrapper
//! - [`channel`] - string-level method channel dispatch shared by both
//!
//! Only [`channel`] is built for other targets, so the dispatch logic can be
//! tested on the host.

pub mod channel;

#[cfg(target_os = "android")]
pub mod cubism;
#[cfg(target_os = "android")]
pub mod jni_bridge;

pub use channel::{config, configure, plugin};

/// Route `tracing` output to logcat
///
/// Safe to call more than once.
#[cfg(target_os = "android")]
pub fn init_logging() {
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Debug)
            .with_tag("Live2D"),
    );
}

/// Placeholder for non-Android builds; the host installs its own subscriber
#[cfg(not(target_os = "android"))]
pub fn init_logging() {}
