//! Example: Assemble several versions of a phrase from recorded takes
//!
//! Reads a JSON job describing every slot of the phrase and where each take
//! of it lives, then writes the ranked versions and a run manifest.
//!
//! ```text
//! cargo run --example assemble_phrase -- job.json
//! ```
//!
//! Job format:
//!
//! ```json
//! {
//!   "k": 3,
//!   "no_reuse": true,
//!   "output_dir": "out",
//!   "config": { "render": { "join": "crossfade" } },
//!   "slots": [
//!     { "name": "hello", "sources": [
//!       { "id": "take1-hello", "path": "take1.wav", "start_s": 0.42, "end_s": 0.81 }
//!     ] }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use stratum_splice::assembly::{Candidate, SourceId, UsedSet};
use stratum_splice::boundary::{extract_candidate, AcceptAll, SourceClip, TimeRange};
use stratum_splice::features::ProfileCache;
use stratum_splice::io::decoder::decode_file;
use stratum_splice::io::wav::{write_wav, WavFormat};
use stratum_splice::{build_versions, EngineConfig, SampleBuffer};

#[derive(Debug, Deserialize)]
struct Job {
    #[serde(default = "default_k")]
    k: usize,
    #[serde(default = "default_no_reuse")]
    no_reuse: bool,
    #[serde(default = "default_output_dir")]
    output_dir: PathBuf,
    #[serde(default)]
    config: EngineConfig,
    slots: Vec<SlotJob>,
}

#[derive(Debug, Deserialize)]
struct SlotJob {
    name: String,
    #[serde(default = "default_gap_scale")]
    gap_scale: f32,
    sources: Vec<SourceJob>,
}

#[derive(Debug, Deserialize)]
struct SourceJob {
    id: String,
    path: PathBuf,
    start_s: f64,
    end_s: f64,
}

fn default_k() -> usize {
    3
}

fn default_no_reuse() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

fn default_gap_scale() -> f32 {
    1.0
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let job_path = std::env::args()
        .nth(1)
        .ok_or("usage: assemble_phrase <job.json>")?;
    let job: Job = serde_json::from_str(&std::fs::read_to_string(&job_path)?)?;
    job.config.validate()?;

    // Decode each file once; several slots usually share a take
    let mut decoded: HashMap<PathBuf, SampleBuffer> = HashMap::new();
    for source in job.slots.iter().flat_map(|s| &s.sources) {
        if !decoded.contains_key(&source.path) {
            decoded.insert(source.path.clone(), decode_file(&source.path)?);
        }
    }

    let cache = ProfileCache::new(job.config.profile.clone());
    let mut slots = Vec::with_capacity(job.slots.len());
    for slot in &job.slots {
        let sources: Vec<SourceClip> = slot
            .sources
            .iter()
            .filter_map(|s| {
                decoded.get(&s.path).map(|buffer| SourceClip {
                    id: SourceId::new(s.id.clone()),
                    buffer: buffer.clone(),
                    range: TimeRange::new(s.start_s, s.end_s),
                })
            })
            .collect();

        let extraction = extract_candidate(
            &slot.name,
            &slot.name,
            &sources,
            &job.config.boundary,
            &job.config.retry,
            &AcceptAll,
            &cache,
        );
        for skipped in &extraction.skipped {
            eprintln!("  Skipped {} in '{}': {}", skipped.id, slot.name, skipped.error);
        }
        println!(
            "Slot '{}': {} usable take(s)",
            slot.name,
            extraction.candidate.len()
        );
        let candidate: Candidate = extraction.candidate.with_gap_scale(slot.gap_scale);
        slots.push(candidate);
    }

    let mut used = UsedSet::new();
    let mut output = build_versions(&slots, job.k, job.no_reuse, &mut used, &job.config)?;

    std::fs::create_dir_all(&job.output_dir)?;
    for (version, manifest) in output.versions.iter().zip(output.manifest.assemblies.iter_mut()) {
        let filename = format!("version_{:02}.wav", manifest.rank);
        write_wav(&version.audio, job.output_dir.join(&filename), WavFormat::Pcm16)?;
        manifest.filename = Some(filename.clone());

        println!(
            "#{} score {:.3} ({} ms): {}",
            manifest.rank,
            manifest.aggregate_score,
            manifest.duration_ms.unwrap_or(0),
            manifest
                .source_ids()
                .iter()
                .map(|id| id.as_str())
                .collect::<Vec<_>>()
                .join(" + ")
        );
        println!("  -> {}", filename);
    }

    if let Some(shortage) = output.shortage() {
        println!(
            "Only {} of {} requested versions were possible",
            shortage.found, shortage.requested
        );
    }

    output.manifest.write_to(job.output_dir.join("manifest.json"))?;
    println!("Cache: {:?}", cache.stats());

    Ok(())
}
