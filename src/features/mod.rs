//! Feature extraction modules
//!
//! Fixed acoustic descriptors of a trimmed clip:
//! - Noise floor (quietest windows)
//! - Spectral centroid (FFT)
//! - Level and peak
//! - Onset density (energy flux)
//!
//! plus a fingerprint-keyed cache so each buffer is profiled once.

pub mod cache;
pub mod noise_floor;
pub mod onset_density;
pub mod profile;
pub mod spectral;

pub use cache::{CacheStats, ProfileCache};
pub use profile::{profile, FeatureProfile, ProfileConfig};
