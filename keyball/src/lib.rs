#![cfg_attr(not(target_arch = "x86_64"), no_std)]

/// Logging shim
pub mod log;

/// Configuration and storage errors
pub mod error;

/// Traits the firmware implements for the pipeline
pub mod hw;

/// Sensor motion and its exchange between halves
pub mod motion;

/// Scroll quantization and snapping
pub mod scroll;

/// Pointer report and per model axis mapping
pub mod report;

/// Keys handled by the pipeline
pub mod keycode;

/// Settings, persisted and built in
pub mod config;

/// Automatic mouse layer
pub mod click_layer;

/// Trackball runtime: CPI, scroll mode and motion processing
pub mod keyball;

/// Status display text
pub mod status;

/// Click layer driven through a keyberon layout
pub mod layer;

/// Owned context wiring everything together
pub mod automouse;

#[cfg(test)]
mod testing;
