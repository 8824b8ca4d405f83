// SPDX-License-Identifier: GPL-3.0-only

//! Recognizer implementations

pub mod qr_detector;

pub use qr_detector::QrRecognizer;
