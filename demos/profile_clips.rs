//! Example: Profile audio files and compare them pairwise
//!
//! Prints the feature profile of every file given on the command line, then
//! the splice compatibility score of each pair (lower is better).
//!
//! ```text
//! cargo run --example profile_clips -- a.wav b.wav c.wav
//! ```

use std::path::PathBuf;

use stratum_splice::features::{ProfileCache, ProfileConfig};
use stratum_splice::io::decoder::decode_file;
use stratum_splice::{score, ScoreWeights};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let paths: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        return Err("usage: profile_clips <file>...".into());
    }

    let cache = ProfileCache::new(ProfileConfig::default());
    let mut profiles = Vec::with_capacity(paths.len());

    println!("Processing {} files...", paths.len());
    for (i, path) in paths.iter().enumerate() {
        println!("[{}/{}] {}", i + 1, paths.len(), path.display());
        match decode_file(path) {
            Ok(buffer) => {
                let profile = cache.get_or_profile(&buffer);
                println!("  Duration: {} ms", profile.duration_ms);
                println!("  Level: {:.1} dBFS (peak {:.1})", profile.level_db, profile.peak_db);
                println!("  Noise floor: {:.1} dBFS", profile.noise_floor_db);
                println!("  Spectral centroid: {:.0} Hz", profile.spectral_centroid_hz);
                println!("  Onset density: {:.2} /s", profile.onset_density_hz);
                profiles.push((path, profile));
            }
            Err(e) => eprintln!("  Error: {}", e),
        }
    }

    let weights = ScoreWeights::splice();
    if profiles.len() > 1 {
        println!("\nPairwise scores:");
    }
    for (i, (a_path, a)) in profiles.iter().enumerate() {
        for (b_path, b) in &profiles[i + 1..] {
            println!(
                "  {:.3}  {} <-> {}",
                score(a, b, &weights),
                a_path.display(),
                b_path.display()
            );
        }
    }

    Ok(())
}
