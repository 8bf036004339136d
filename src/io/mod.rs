//! Audio I/O modules
//!
//! The immutable sample buffer shared by every component, plus adapters for
//! decoding (Symphonia) and writing rendered output (hound).

pub mod decoder;
pub mod sample_buffer;
pub mod wav;
