//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use log::info;

use crate::cli::EffectArgs;
use crate::config::Settings;
use crate::converter::{lofi_output_path, LofiConverter};
use crate::dsp::{process, Preset, ProcessingResult};
use crate::engine::to_compressed;
use crate::error::Result;
use crate::source::YtDlpProvider;

/// Apply the effect to a local file.
pub fn convert(
    settings: &Settings,
    input: &Path,
    output: Option<&Path>,
    mp3: bool,
    effect: &EffectArgs,
) -> Result<()> {
    let params = effect.to_params();
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| lofi_output_path(input));
    info!("Converting {} with preset '{}'", input.display(), effect.preset);

    let result = process(input, &output, &params)?;
    match &result {
        ProcessingResult::Processed { path } => println!("Wrote {}", path.display()),
        ProcessingResult::Passthrough { path, reason } => {
            println!("Processing failed ({}); copied input to {}", reason, path.display())
        }
    }

    if mp3 {
        let preview = to_compressed(result.path(), settings);
        println!("Preview: {}", preview.display());
    }

    Ok(())
}

/// Download a link and run the full conversion.
pub fn fetch(settings: &Settings, link: &str, json: bool, effect: &EffectArgs) -> Result<()> {
    let converter = LofiConverter::new(settings.clone(), YtDlpProvider::new(settings))?;
    let conversion = converter.convert_link(link, &effect.to_params())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&conversion)?);
        return Ok(());
    }

    println!("{} - {}", conversion.metadata.title, conversion.metadata.artist);
    println!("  Request:  {}", conversion.id);
    println!("  Original: {}", conversion.source_preview.display());
    println!("  Lofi:     {}", conversion.lofi_preview.display());
    if conversion.passthrough {
        println!("  Note: processing failed, lofi file is the unprocessed source");
    }

    Ok(())
}

/// Check a link and print its metadata.
pub fn validate(settings: &Settings, link: &str) -> Result<()> {
    let provider = YtDlpProvider::new(settings);
    let converter = LofiConverter::new(settings.clone(), provider)?;
    let metadata = converter.validate(link)?;

    println!("Title:    {}", metadata.title);
    println!("Artist:   {}", metadata.artist);
    println!("Duration: {:.0}s", metadata.duration_secs);
    println!("Views:    {}", metadata.view_count);
    if let Some(thumbnail) = &metadata.thumbnail_url {
        println!("Thumb:    {}", thumbnail);
    }

    Ok(())
}

/// Print every preset bundle.
pub fn list_presets() -> Result<()> {
    println!(
        "{:<8} {:>9} {:>8} {:>6} {:>6} {:>8} {:>6}",
        "preset", "room_size", "damping", "wet", "dry", "delay_ms", "slow"
    );
    for preset in Preset::ALL {
        let p = preset.parameters();
        println!(
            "{:<8} {:>9.2} {:>8.2} {:>6.2} {:>6.2} {:>8} {:>6.2}",
            preset.name(),
            p.room_size,
            p.damping,
            p.wet_level,
            p.dry_level,
            p.delay_ms,
            p.slow_factor
        );
    }
    Ok(())
}
