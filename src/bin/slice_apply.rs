//! Config-driven slice-by-slice filtering: axis and filter come from a JSON
//! config file.

use slicewise::config::{load_config, FilterConfig};
use slicewise::filters::{AddSlices, BoxMean, Identity, MedianFilter, RescaleIntensity};
use slicewise::volume::io::{load_volume, save_volume};
use slicewise::{PixelFormat, SliceProcessor, Volume};
use std::env;
use std::path::Path;
use std::process;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;

    let volume = load_volume(&config.input).map_err(|e| e.to_string())?;

    let mut processor = SliceProcessor::new(PixelFormat::U8, PixelFormat::U8);
    let inputs: Vec<&Volume> = match &config.filter {
        FilterConfig::Identity => {
            processor
                .bind_filter(Box::new(Identity::new(PixelFormat::U8)))
                .map_err(|e| e.to_string())?;
            vec![&volume]
        }
        FilterConfig::BoxMean { radius } => {
            processor
                .bind_filter(Box::new(BoxMean::new(*radius)))
                .map_err(|e| e.to_string())?;
            vec![&volume]
        }
        FilterConfig::Median { radius } => {
            processor
                .bind_filter(Box::new(MedianFilter::new(*radius)))
                .map_err(|e| e.to_string())?;
            vec![&volume]
        }
        FilterConfig::AddRescale { out_min, out_max } => {
            processor
                .bind_entry(Box::new(AddSlices::new()))
                .map_err(|e| e.to_string())?;
            processor
                .bind_exit(Box::new(RescaleIntensity::new(*out_min, *out_max)))
                .map_err(|e| e.to_string())?;
            vec![&volume, &volume]
        }
    };
    if let Some(axis) = config.slicing.axis {
        processor.set_axis(axis);
    }

    let result = processor.execute(&inputs).map_err(|e| e.to_string())?;
    save_volume(&result, &config.output).map_err(|e| e.to_string())?;

    let axis = config
        .slicing
        .axis
        .unwrap_or_else(|| volume.ndim().saturating_sub(1));
    println!(
        "applied {:?} along axis {axis} to {} -> {}",
        config.filter,
        config.input.display(),
        config.output.display()
    );
    Ok(())
}

fn usage() -> String {
    "Usage: slice_apply <config.json>".to_string()
}
