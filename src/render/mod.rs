//! Rendering assemblies to audio
//!
//! - Sequential assemblies: level-matched parts joined by gaps or crossfades
//! - Layered assemblies: per-layer gains, then a sample-wise sum
//!
//! Both finish with output normalization (RMS to `target_level_db` by
//! default, or peak to `ceiling_db`), never exceeding `ceiling_db`.

pub mod mix;
pub mod splice;

use serde::{Deserialize, Serialize};

use crate::assembly::result::Assembly;
use crate::error::EngineError;
use crate::io::sample_buffer::SampleBuffer;
use crate::preprocessing::normalization::{normalize, NormalizationConfig, NormalizationMethod};
use crate::scoring::ScoringMode;

/// How consecutive parts are joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinMode {
    /// Silence of `gap_ms` (times the slot's gap scale) between parts
    #[default]
    Gap,
    /// Equal-power overlap of `crossfade_ms`
    Crossfade,
}

/// Renderer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Join style for sequential assemblies (default: Gap)
    pub join: JoinMode,

    /// Gap between parts in ms (default: 70.0)
    pub gap_ms: f32,

    /// Crossfade length in ms, clamped to half of either neighbour (default: 20.0)
    pub crossfade_ms: f32,

    /// Per-part and final RMS target in dBFS (default: -18.0)
    pub target_level_db: f32,

    /// Parts at or below this level are not level-matched (default: -80.0)
    pub silence_floor_db: f32,

    /// Output peak ceiling in dBFS (default: -1.0)
    pub ceiling_db: f32,

    /// Final output normalization (default: Rms)
    pub normalization: NormalizationMethod,

    /// Per-layer targets in dBFS for layered assemblies (default: empty)
    pub layer_levels_db: Vec<f32>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            join: JoinMode::Gap,
            gap_ms: 70.0,
            crossfade_ms: 20.0,
            target_level_db: -18.0,
            silence_floor_db: -80.0,
            ceiling_db: -1.0,
            normalization: NormalizationMethod::Rms,
            layer_levels_db: Vec::new(),
        }
    }
}

/// Render an assembly to a single buffer
///
/// # Arguments
///
/// * `assembly` - Assembly to render
/// * `config` - Renderer configuration
///
/// # Returns
///
/// The rendered buffer at the parts' sample rate and channel count
///
/// # Errors
///
/// Returns `EngineError::InvalidInput` if the assembly has no parts, the
/// parts disagree on sample rate or channel count, or every part is empty.
pub fn render(assembly: &Assembly, config: &RenderConfig) -> Result<SampleBuffer, EngineError> {
    let first = assembly
        .parts
        .first()
        .ok_or_else(|| EngineError::invalid_input("assembly has no parts"))?;
    let sample_rate = first.buffer.sample_rate();
    let channels = first.buffer.channels();

    if let Some(odd) = assembly
        .parts
        .iter()
        .find(|p| p.buffer.sample_rate() != sample_rate || p.buffer.channels() != channels)
    {
        return Err(EngineError::invalid_input(format!(
            "part '{}' ({}) is {} Hz/{} ch, expected {} Hz/{} ch",
            odd.slot,
            odd.source_id,
            odd.buffer.sample_rate(),
            odd.buffer.channels(),
            sample_rate,
            channels
        )));
    }

    let buffers: Vec<&SampleBuffer> = assembly.parts.iter().map(|p| &p.buffer).collect();
    let mut samples = match assembly.mode {
        ScoringMode::Sequential => {
            let gap_scales: Vec<f32> = assembly.parts.iter().map(|p| p.gap_scale).collect();
            splice::splice(&buffers, &gap_scales, channels as usize, sample_rate, config)
        }
        ScoringMode::Layered => mix::mix(&buffers, config),
    };

    let metadata = normalize(
        &mut samples,
        &NormalizationConfig {
            method: config.normalization,
            target_level_db: config.target_level_db,
            ceiling_db: config.ceiling_db,
        },
    )?;

    let rendered = SampleBuffer::new(samples, channels, sample_rate)?;
    log::debug!(
        "Rendered assembly #{} ({:?}, {} parts): {} ms, gain {:+.2} dB{}",
        assembly.rank,
        assembly.mode,
        assembly.parts.len(),
        rendered.duration_ms(),
        metadata.gain_db,
        if metadata.limited { " (limited)" } else { "" }
    );
    Ok(rendered)
}
