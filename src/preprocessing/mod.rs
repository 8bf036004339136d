//! Audio preprocessing modules
//!
//! Shared signal utilities used by the locator, profiler and renderer:
//! - Channel mixing (interleaved to mono)
//! - Level measurement and normalization (peak, RMS)
//! - Fade curves (linear, equal-power)

pub mod channel_mixer;
pub mod fade;
pub mod normalization;
