//! Data model for frames, scan regions, and detection results
//!
//! This module defines the core types shared by the capture backends, the
//! change detector, and the snapshot writer:
//!
//! - [`Rgb`] / [`FrameBuffer`] - pixel samples and row-major frame storage
//! - [`ScreenGeometry`] / [`ScanRegion`] - display dimensions and the
//!   centered, clamped rectangle actually analyzed each cycle
//! - [`DetectionParams`] - the tunable sensitivity model
//! - [`DiagnosticReport`] / [`Detection`] - comparison outcomes

use serde::{Deserialize, Serialize};

use crate::error::{CaptureError, CaptureResult};

/// A single opaque pixel sample (no alpha; the capture source is always
/// treated as fully opaque)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Rgb {
    /// Creates a pixel sample from channel values
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{},{})", self.r, self.g, self.b)
    }
}

/// A row-major pixel buffer of fixed dimensions
///
/// Invariant: `pixels.len() == width * height`, enforced at construction.
/// Two buffers are only comparable when their dimensions match; a mismatch
/// is a hard comparison failure, never a silent truncation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width:  u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl FrameBuffer {
    /// Wraps a pixel vector, validating the length invariant
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Rgb>) -> CaptureResult<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(CaptureError::InvalidParameter {
                parameter: "pixels".to_string(),
                reason:    format!(
                    "expected {expected} samples for {width}x{height}, got {}",
                    pixels.len()
                ),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Creates a buffer filled with a single color
    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    /// Buffer width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Buffer height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` pair
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of pixel samples (`width * height`)
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Whether the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Flat row-major sample slice
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Sample at `(x, y)`, or `None` when out of bounds
    pub fn get(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    /// Overwrites the sample at `(x, y)`; out-of-bounds writes are ignored
    pub fn set(&mut self, x: u32, y: u32, color: Rgb) {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize] = color;
        }
    }
}

/// Pixel dimensions of the captured display output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenGeometry {
    /// Display width in pixels
    pub width:  u32,
    /// Display height in pixels
    pub height: u32,
}

impl ScreenGeometry {
    /// Creates a geometry from display dimensions
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for ScreenGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// The rectangle analyzed each cycle, re-centered on the display center
/// at capture time
///
/// Not persisted anywhere: recomputed per capture call from the current
/// screen geometry and the caller-supplied region dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRegion {
    /// Leftmost column included in the scan
    pub left:   u32,
    /// Topmost row included in the scan
    pub top:    u32,
    /// Region width in pixels
    pub width:  u32,
    /// Region height in pixels
    pub height: u32,
}

impl ScanRegion {
    /// Computes the centered scan rectangle, clamped into display bounds
    ///
    /// Requested dimensions larger than the display are clamped to the
    /// display first, then `left`/`top` are clamped into
    /// `[0, screen - region]` so the region never reads out of bounds even
    /// when centered near an edge. Oversized requests therefore clamp to
    /// origin 0 without raising an error.
    pub fn centered(geometry: ScreenGeometry, width: u32, height: u32) -> Self {
        let width = width.min(geometry.width);
        let height = height.min(geometry.height);

        let left = (geometry.width / 2).saturating_sub(width / 2);
        let top = (geometry.height / 2).saturating_sub(height / 2);

        Self {
            left:   left.min(geometry.width - width),
            top:    top.min(geometry.height - height),
            width,
            height,
        }
    }

    /// One past the rightmost included column
    pub fn right(&self) -> u32 {
        self.left + self.width
    }

    /// One past the bottommost included row
    pub fn bottom(&self) -> u32 {
        self.top + self.height
    }
}

/// Tunable sensitivity model for change classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionParams {
    /// Sensitivity percentage (0-100), converted to an absolute per-channel
    /// byte threshold
    pub sensitivity:     f64,
    /// Minimum changed-pixel count that counts as a trigger (inclusive)
    pub pixel_threshold: u32,
}

impl DetectionParams {
    /// Creates detection parameters
    pub fn new(sensitivity: f64, pixel_threshold: u32) -> Self {
        Self {
            sensitivity,
            pixel_threshold,
        }
    }

    /// Absolute per-channel byte threshold derived from the sensitivity
    /// percentage
    ///
    /// A pixel counts as changed when any single channel's absolute
    /// difference *strictly exceeds* this value.
    pub fn channel_threshold(&self) -> i32 {
        (self.sensitivity * 0.01 * 255.0).round() as i32
    }
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            sensitivity:     40.0,
            pixel_threshold: 15,
        }
    }
}

/// The single most-different pixel observed during a comparison
///
/// "Most different" follows sequential max-tracking: the pixel that most
/// recently raised any per-channel maximum. Ties between pixels or channels
/// sharing the same maximum resolve last-writer-wins, not first-index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotPixel {
    /// Column within the scan region
    pub x:         u32,
    /// Row within the scan region
    pub y:         u32,
    /// Color in the reference frame
    pub reference: Rgb,
    /// Color in the compared frame
    pub current:   Rgb,
}

/// Diagnostic data produced fresh on every comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    /// Number of pixels classified as changed
    pub changed_pixels:  u32,
    /// The trigger threshold the count was held against
    pub pixel_threshold: u32,
    /// Maximum red-channel difference observed
    pub max_diff_r:      u8,
    /// Maximum green-channel difference observed
    pub max_diff_g:      u8,
    /// Maximum blue-channel difference observed
    pub max_diff_b:      u8,
    /// The last pixel that updated any per-channel maximum, if any channel
    /// differed at all
    pub hottest:         Option<HotPixel>,
}

impl std::fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Changed pixels: {} (threshold: {})",
            self.changed_pixels, self.pixel_threshold
        )?;
        write!(
            f,
            "Max channel differences - R: {}, G: {}, B: {}",
            self.max_diff_r, self.max_diff_g, self.max_diff_b
        )?;
        if let Some(hot) = &self.hottest {
            writeln!(f)?;
            writeln!(f, "Sample pixel at ({},{}):", hot.x, hot.y)?;
            writeln!(f, "  Reference RGB: {}", hot.reference)?;
            writeln!(f, "  Current RGB: {}", hot.current)?;
            write!(
                f,
                "  Differences: R={}, G={}, B={}",
                hot.current.r as i32 - hot.reference.r as i32,
                hot.current.g as i32 - hot.reference.g as i32,
                hot.current.b as i32 - hot.reference.b as i32
            )?;
        }
        Ok(())
    }
}

/// Outcome of a single comparison cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    /// Whether enough pixels changed to warrant caller action
    pub triggered: bool,
    /// Supporting diagnostic data
    pub report:    DiagnosticReport,
}
