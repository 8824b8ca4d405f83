// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands that do not need the scanning screen
//!
//! - Listing capture devices
//! - Decoding a single image file

use code_scanner::app::frame_processor::{QrRecognizer, SymbolRecognizer};
use code_scanner::app::select_result;
use code_scanner::backends::camera::enumeration::enumerate_cameras;
use code_scanner::backends::camera::types::CameraFrame;
use code_scanner::config::Config;
use std::path::Path;
use tracing::info;

/// List all available capture devices
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let cameras = enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        println!("      Path: {}", camera.path);
        if let Some(info) = &camera.device_info {
            println!("      Driver: {}", info.driver);
            if !info.bus.is_empty() {
                println!("      Bus: {}", info.bus);
            }
        }
    }

    Ok(())
}

/// Run the recognizer over an image file and print the selected result
pub fn decode_image(path: &Path, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let image = image::open(path)
        .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?
        .to_rgba8();
    let frame = CameraFrame::from_rgba_image(&image);
    info!(
        path = %path.display(),
        width = frame.width,
        height = frame.height,
        "Decoding image"
    );

    let recognizer = QrRecognizer::with_max_dimension(config.max_dimension);
    let objects = recognizer.recognize(&frame);

    match select_result(&objects) {
        Some(text) => {
            println!("{}", text);
            Ok(())
        }
        None if objects.is_empty() => Err("No code found".into()),
        None => Err("Found a code but could not decode it".into()),
    }
}
