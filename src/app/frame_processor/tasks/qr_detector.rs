// SPDX-License-Identifier: GPL-3.0-only

//! QR code recognition
//!
//! This module implements QR code recognition using the rqrr crate.
//! Frames are reduced to a luma plane (downscaled when larger than the
//! configured maximum), searched for QR grids, and every located grid is
//! reported with its bounds and, when decoding succeeds, its content.

use crate::app::frame_processor::SymbolRecognizer;
use crate::app::frame_processor::types::{
    FrameRegion, MachineReadableCode, MetadataObject, SymbolFormat,
};
use crate::backends::camera::types::CameraFrame;
use crate::constants::recognition;
use tracing::{debug, trace};

/// QR code recognizer
///
/// Optimized for real-time processing with frame downscaling.
pub struct QrRecognizer {
    /// Maximum dimension for processing (frames are downscaled to this)
    max_dimension: u32,
}

impl Default for QrRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl QrRecognizer {
    pub fn new() -> Self {
        Self {
            max_dimension: recognition::DEFAULT_MAX_DIMENSION,
        }
    }

    /// Create a QR recognizer with custom max dimension
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }
}

impl SymbolRecognizer for QrRecognizer {
    fn supported_formats(&self) -> &[SymbolFormat] {
        &[SymbolFormat::Qr]
    }

    fn recognize(&self, frame: &CameraFrame) -> Vec<MetadataObject> {
        detect_sync(frame, self.max_dimension)
    }
}

/// Synchronous QR detection (callers run it on a blocking thread)
fn detect_sync(frame: &CameraFrame, max_dimension: u32) -> Vec<MetadataObject> {
    let start = std::time::Instant::now();

    let width = frame.width;
    let height = frame.height;
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let LumaPlane {
        luma,
        width: proc_width,
        height: proc_height,
        scale,
    } = prepare_luma(frame, max_dimension);

    trace!(
        proc_width,
        proc_height,
        scale,
        conversion_ms = start.elapsed().as_millis(),
        "Prepared luma plane for recognition"
    );

    let row = proc_width as usize;
    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(proc_width as usize, proc_height as usize, |x, y| {
            luma.get(y * row + x).copied().unwrap_or(255)
        });
    let grids = prepared.detect_grids();

    let mut objects = Vec::with_capacity(grids.len());
    for grid in grids {
        let min_x = grid.bounds.iter().map(|p| p.x).min().unwrap_or(0).max(0) as f32;
        let max_x = grid.bounds.iter().map(|p| p.x).max().unwrap_or(0).max(0) as f32;
        let min_y = grid.bounds.iter().map(|p| p.y).min().unwrap_or(0).max(0) as f32;
        let max_y = grid.bounds.iter().map(|p| p.y).max().unwrap_or(0).max(0) as f32;

        // Scale back to original frame coordinates
        let bounds = FrameRegion::from_pixels(
            (min_x * scale) as u32,
            (min_y * scale) as u32,
            ((max_x - min_x) * scale) as u32,
            ((max_y - min_y) * scale) as u32,
            width,
            height,
        );

        let string_value = match grid.decode() {
            Ok((_meta, content)) => {
                debug!(
                    content = %content,
                    x = bounds.x,
                    y = bounds.y,
                    "Decoded QR code"
                );
                Some(content)
            }
            Err(e) => {
                debug!(error = %e, "Located QR grid but failed to decode it");
                None
            }
        };

        objects.push(MetadataObject::MachineReadableCode(MachineReadableCode {
            format: SymbolFormat::Qr,
            bounds,
            string_value,
        }));
    }

    if !objects.is_empty() {
        debug!(
            count = objects.len(),
            total_ms = start.elapsed().as_millis(),
            "QR recognition found codes"
        );
    }

    objects
}

/// Luma plane handed to rqrr
struct LumaPlane {
    luma: Vec<u8>,
    width: u32,
    height: u32,
    /// Frame pixels per plane pixel
    scale: f32,
}

/// Reduce a frame to luma, downscaled so neither side exceeds `max_dimension`
fn prepare_luma(frame: &CameraFrame, max_dimension: u32) -> LumaPlane {
    let (width, height) = (frame.width, frame.height);
    if width <= max_dimension && height <= max_dimension {
        return LumaPlane {
            luma: luma_without_stride(frame),
            width,
            height,
            scale: 1.0,
        };
    }

    let scale = (width as f32 / max_dimension as f32).max(height as f32 / max_dimension as f32);
    let new_width = ((width as f32 / scale) as u32).clamp(1, max_dimension);
    let new_height = ((height as f32 / scale) as u32).clamp(1, max_dimension);
    LumaPlane {
        luma: downscale_luma(frame, new_width, new_height),
        width: new_width,
        height: new_height,
        scale,
    }
}

fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

/// Copy the luma plane without stride padding
fn luma_without_stride(frame: &CameraFrame) -> Vec<u8> {
    let mut result = Vec::with_capacity(pixel_count(frame.width, frame.height));

    for y in 0..frame.height {
        for x in 0..frame.width {
            result.push(frame.luma_at(x, y));
        }
    }

    result
}

/// Downscale the luma plane using bilinear interpolation
fn downscale_luma(frame: &CameraFrame, dst_width: u32, dst_height: u32) -> Vec<u8> {
    let src_width = frame.width;
    let src_height = frame.height;

    let mut result = Vec::with_capacity(pixel_count(dst_width, dst_height));

    let x_ratio = src_width as f32 / dst_width as f32;
    let y_ratio = src_height as f32 / dst_height as f32;

    for y in 0..dst_height {
        for x in 0..dst_width {
            let src_x = x as f32 * x_ratio;
            let src_y = y as f32 * y_ratio;

            let x0 = src_x as u32;
            let y0 = src_y as u32;
            let x1 = (x0 + 1).min(src_width - 1);
            let y1 = (y0 + 1).min(src_height - 1);

            let x_frac = src_x - x0 as f32;
            let y_frac = src_y - y0 as f32;

            let p00 = frame.luma_at(x0, y0) as f32;
            let p01 = frame.luma_at(x1, y0) as f32;
            let p10 = frame.luma_at(x0, y1) as f32;
            let p11 = frame.luma_at(x1, y1) as f32;

            let value = p00 * (1.0 - x_frac) * (1.0 - y_frac)
                + p01 * x_frac * (1.0 - y_frac)
                + p10 * (1.0 - x_frac) * y_frac
                + p11 * x_frac * y_frac;

            result.push(value as u8);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::PixelFormat;
    use std::sync::Arc;

    fn rgba_frame(width: u32, height: u32, stride: u32, data: Vec<u8>) -> CameraFrame {
        CameraFrame {
            width,
            height,
            data: Arc::from(data.as_slice()),
            format: PixelFormat::RGBA,
            stride,
            captured_at: std::time::Instant::now(),
        }
    }

    #[test]
    fn test_luma_without_stride() {
        // 2x2 RGBA frame with extra stride padding
        let data: Vec<u8> = vec![
            255, 255, 255, 255, // White
            0, 0, 0, 255, // Black
            9, 9, // stride padding
            0, 0, 0, 255, // Black
            255, 255, 255, 255, // White
            9, 9, // stride padding
        ];

        let frame = rgba_frame(2, 2, 10, data);
        let result = luma_without_stride(&frame);
        assert_eq!(result, vec![255, 0, 0, 255]);
    }

    #[test]
    fn test_downscale_luma() {
        // 4x2 gradient in luma
        let mut data = Vec::new();
        for _ in 0..2 {
            for v in [0u8, 85, 170, 255] {
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }

        let frame = rgba_frame(4, 2, 16, data);
        let result = downscale_luma(&frame, 2, 1);
        assert_eq!(result.len(), 2);

        // First pixel samples around (0,0), second around (2,0)
        assert!(result[0] < 100);
        assert!(result[1] > 150);
    }

    #[test]
    fn test_blank_frame_has_no_codes() {
        let frame = rgba_frame(64, 48, 64 * 4, vec![255; 64 * 48 * 4]);
        assert!(QrRecognizer::new().recognize(&frame).is_empty());
    }

    /// "text" rendered as a QR symbol with a quiet zone, `module_px` pixels per module
    fn qr_frame(text: &str, module_px: u32) -> CameraFrame {
        let code = qrcode::QrCode::new(text.as_bytes()).unwrap();
        let luma = code
            .render::<image::Luma<u8>>()
            .quiet_zone(true)
            .module_dimensions(module_px, module_px)
            .build();
        CameraFrame::from_rgba_image(&image::DynamicImage::ImageLuma8(luma).to_rgba8())
    }

    fn assert_decodes_hello(objects: &[MetadataObject]) {
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].format(), Some(SymbolFormat::Qr));
        assert_eq!(objects[0].decoded_string(), Some("HELLO"));

        let bounds = objects[0].bounds();
        assert!(bounds.x > 0.0 && bounds.y > 0.0, "{:?}", bounds);
        assert!(bounds.width > 0.5 && bounds.height > 0.5, "{:?}", bounds);
        assert!(bounds.x + bounds.width <= 1.0, "{:?}", bounds);
        assert!(bounds.y + bounds.height <= 1.0, "{:?}", bounds);
    }

    #[test]
    fn test_decodes_qr_at_native_size() {
        let frame = qr_frame("HELLO", 4);
        assert!(frame.width <= recognition::DEFAULT_MAX_DIMENSION);

        assert_decodes_hello(&QrRecognizer::new().recognize(&frame));
    }

    #[test]
    fn test_decodes_qr_after_downscaling() {
        // 29 modules including the quiet zone, 30 px each
        let frame = qr_frame("HELLO", 30);
        assert_eq!((frame.width, frame.height), (870, 870));

        let plane = prepare_luma(&frame, 640);
        assert_eq!((plane.width, plane.height), (640, 640));

        assert_decodes_hello(&QrRecognizer::with_max_dimension(640).recognize(&frame));
    }

    #[test]
    fn test_large_frame_is_downscaled_before_search() {
        let frame = rgba_frame(1280, 8, 1280 * 4, vec![255; 1280 * 8 * 4]);

        let plane = prepare_luma(&frame, 320);
        assert_eq!((plane.width, plane.height), (320, 2));
        assert_eq!(plane.luma.len(), 320 * 2);
        assert_eq!(plane.scale, 4.0);

        assert!(QrRecognizer::with_max_dimension(320).recognize(&frame).is_empty());
    }

    #[test]
    fn test_small_frame_keeps_its_size() {
        let frame = rgba_frame(64, 48, 64 * 4, vec![255; 64 * 48 * 4]);
        let plane = prepare_luma(&frame, 640);
        assert_eq!((plane.width, plane.height, plane.scale), (64, 48, 1.0));
        assert_eq!(plane.luma.len(), 64 * 48);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_pixel_count_does_not_wrap() {
        assert_eq!(pixel_count(65_536, 65_536), 1usize << 32);
        assert_eq!(pixel_count(u32::MAX, 2), u32::MAX as usize * 2);
    }

    #[test]
    fn test_only_qr_is_supported() {
        assert_eq!(QrRecognizer::new().supported_formats(), &[SymbolFormat::Qr]);
    }

    #[test]
    fn test_empty_frame_is_ignored() {
        let frame = rgba_frame(0, 0, 0, Vec::new());
        assert!(QrRecognizer::new().recognize(&frame).is_empty());
    }
}
