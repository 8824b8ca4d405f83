// SPDX-License-Identifier: MPL-2.0

//! Core types for frame processing results
//!
//! These types represent the output of recognition and are what the
//! metadata output hands to its delegate.

use serde::{Deserialize, Serialize};

/// A rectangular region within a frame
///
/// Coordinates are normalized (0.0 to 1.0) relative to the frame dimensions.
/// This allows easy transformation to screen coordinates regardless of
/// the actual frame size or display scaling.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameRegion {
    /// Left edge (0.0 = left of frame, 1.0 = right of frame)
    pub x: f32,
    /// Top edge (0.0 = top of frame, 1.0 = bottom of frame)
    pub y: f32,
    /// Width as fraction of frame width
    pub width: f32,
    /// Height as fraction of frame height
    pub height: f32,
}

impl FrameRegion {
    /// Create a frame region from pixel coordinates
    pub fn from_pixels(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        Self {
            x: x as f32 / frame_width as f32,
            y: y as f32 / frame_height as f32,
            width: width as f32 / frame_width as f32,
            height: height as f32 / frame_height as f32,
        }
    }
}

/// 2D symbol formats the metadata output can watch for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolFormat {
    Aztec,
    Qr,
    DataMatrix,
    Pdf417,
}

impl SymbolFormat {
    /// Formats watched when nothing is configured
    pub const DEFAULT: [SymbolFormat; 2] = [SymbolFormat::Aztec, SymbolFormat::Qr];

    pub fn display_name(&self) -> &'static str {
        match self {
            SymbolFormat::Aztec => "Aztec",
            SymbolFormat::Qr => "QR",
            SymbolFormat::DataMatrix => "Data Matrix",
            SymbolFormat::Pdf417 => "PDF417",
        }
    }
}

impl std::fmt::Display for SymbolFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A recognized symbol carrying (when decodable) a string payload
#[derive(Debug, Clone, PartialEq)]
pub struct MachineReadableCode {
    pub format: SymbolFormat,
    /// Bounding box in normalized frame coordinates
    pub bounds: FrameRegion,
    /// Decoded payload; `None` when the symbol was located but not decoded
    pub string_value: Option<String>,
}

/// One object reported by the recognizer for a frame
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataObject {
    /// A barcode-like symbol
    MachineReadableCode(MachineReadableCode),
    /// Anything else a recognizer may report (faces, bodies, ...)
    Other { kind: String, bounds: FrameRegion },
}

impl MetadataObject {
    /// Convenience constructor for a decoded code
    pub fn code(format: SymbolFormat, bounds: FrameRegion, value: impl Into<String>) -> Self {
        MetadataObject::MachineReadableCode(MachineReadableCode {
            format,
            bounds,
            string_value: Some(value.into()),
        })
    }

    /// The decoded string, if this is a code with a non-empty payload
    pub fn decoded_string(&self) -> Option<&str> {
        match self {
            MetadataObject::MachineReadableCode(code) => code
                .string_value
                .as_deref()
                .filter(|value| !value.is_empty()),
            MetadataObject::Other { .. } => None,
        }
    }

    /// Symbol format, for code objects
    pub fn format(&self) -> Option<SymbolFormat> {
        match self {
            MetadataObject::MachineReadableCode(code) => Some(code.format),
            MetadataObject::Other { .. } => None,
        }
    }

    pub fn bounds(&self) -> &FrameRegion {
        match self {
            MetadataObject::MachineReadableCode(code) => &code.bounds,
            MetadataObject::Other { bounds, .. } => bounds,
        }
    }
}
