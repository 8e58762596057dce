//! Mock frame source for testing and development
//!
//! [`MockFrameSource`] stands in for the DXGI backend without requiring a
//! display: tests script a queue of full-screen BGRA planes and the mock
//! serves them through the same [`extract_region`] path the real backend
//! uses, so region math and channel reordering are exercised identically.
//!
//! An empty queue reproduces the "no new frame within the timeout" case
//! (`Ok(None)`), and [`MockFrameSource::with_error`] injects a one-shot
//! failure for error-path testing.

use std::collections::VecDeque;
use std::time::Duration;

use super::constants::SOURCE_BYTES_PER_PIXEL;
use super::extract::extract_region;
use super::FrameSource;
use crate::error::{CaptureError, CaptureResult};
use crate::model::{Rgb, ScanRegion, ScreenGeometry};

/// Scripted frame source backed by in-memory BGRA planes
#[derive(Debug)]
pub struct MockFrameSource {
    geometry:    ScreenGeometry,
    frames:      VecDeque<Vec<u8>>,
    row_padding: usize,
    error:       Option<CaptureError>,
    grabs:       usize,
}

impl MockFrameSource {
    /// Creates a source for a display of the given dimensions, with no
    /// frames queued
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            geometry:    ScreenGeometry::new(width, height),
            frames:      VecDeque::new(),
            row_padding: 0,
            error:       None,
            grabs:       0,
        }
    }

    /// Adds extra bytes to each row's pitch, simulating driver-chosen
    /// padding
    pub fn with_row_padding(mut self, bytes: usize) -> Self {
        self.row_padding = bytes;
        self
    }

    /// Injects an error returned by the next `grab_region` call (one-shot)
    pub fn with_error(mut self, error: CaptureError) -> Self {
        self.error = Some(error);
        self
    }

    /// Queues a full-screen frame of a single color
    pub fn push_solid(&mut self, color: Rgb) {
        let plane = self.solid_plane(color);
        self.frames.push_back(plane);
    }

    /// Queues a solid frame with `count` pixels of `dot` painted rightwards
    /// from the screen center, where a centered scan region of at least
    /// `2 * count` width will see all of them
    pub fn push_solid_with_center_dots(&mut self, base: Rgb, dot: Rgb, count: u32) {
        let mut plane = self.solid_plane(base);
        let pitch = self.row_pitch();
        let cx = self.geometry.width / 2;
        let cy = self.geometry.height / 2;
        for i in 0..count {
            let x = (cx + i).min(self.geometry.width - 1);
            let offset = cy as usize * pitch + x as usize * SOURCE_BYTES_PER_PIXEL;
            plane[offset] = dot.b;
            plane[offset + 1] = dot.g;
            plane[offset + 2] = dot.r;
        }
        self.frames.push_back(plane);
    }

    /// Queues a raw BGRA plane; must be `row_pitch * height` bytes
    pub fn push_plane(&mut self, plane: Vec<u8>) {
        debug_assert_eq!(plane.len(), self.row_pitch() * self.geometry.height as usize);
        self.frames.push_back(plane);
    }

    /// Number of `grab_region` calls served so far
    pub fn grabs(&self) -> usize {
        self.grabs
    }

    /// Frames still queued
    pub fn queued(&self) -> usize {
        self.frames.len()
    }

    fn row_pitch(&self) -> usize {
        self.geometry.width as usize * SOURCE_BYTES_PER_PIXEL + self.row_padding
    }

    fn solid_plane(&self, color: Rgb) -> Vec<u8> {
        let pitch = self.row_pitch();
        let mut plane = vec![0u8; pitch * self.geometry.height as usize];
        for y in 0..self.geometry.height as usize {
            for x in 0..self.geometry.width as usize {
                let i = y * pitch + x * SOURCE_BYTES_PER_PIXEL;
                plane[i] = color.b;
                plane[i + 1] = color.g;
                plane[i + 2] = color.r;
                plane[i + 3] = 0xFF;
            }
        }
        plane
    }
}

impl FrameSource for MockFrameSource {
    fn geometry(&self) -> ScreenGeometry {
        self.geometry
    }

    fn grab_region(
        &mut self,
        width: u32,
        height: u32,
        _timeout: Duration,
    ) -> CaptureResult<Option<crate::model::FrameBuffer>> {
        self.grabs += 1;

        if let Some(error) = self.error.take() {
            return Err(error);
        }

        let Some(plane) = self.frames.pop_front() else {
            // Nothing queued: behaves like an acquisition timeout
            return Ok(None);
        };

        let region = ScanRegion::centered(self.geometry, width, height);
        extract_region(&plane, self.row_pitch(), &region).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_queue_is_no_new_frame() {
        let mut source = MockFrameSource::new(64, 64);
        let result = source
            .grab_region(8, 8, Duration::from_millis(500))
            .unwrap();
        assert!(result.is_none());
        assert_eq!(source.grabs(), 1);
    }

    #[test]
    fn test_solid_frame_extracts_requested_region() {
        let mut source = MockFrameSource::new(64, 64);
        source.push_solid(Rgb::new(12, 34, 56));

        let frame = source
            .grab_region(8, 6, Duration::from_millis(500))
            .unwrap()
            .unwrap();
        assert_eq!(frame.dimensions(), (8, 6));
        assert!(frame.pixels().iter().all(|p| *p == Rgb::new(12, 34, 56)));
        assert_eq!(source.queued(), 0);
    }

    #[test]
    fn test_center_dots_land_in_scan_region() {
        let mut source = MockFrameSource::new(64, 64);
        source.push_solid_with_center_dots(Rgb::new(0, 0, 0), Rgb::new(255, 0, 0), 3);

        let frame = source
            .grab_region(8, 8, Duration::from_millis(500))
            .unwrap()
            .unwrap();
        let red = frame
            .pixels()
            .iter()
            .filter(|p| **p == Rgb::new(255, 0, 0))
            .count();
        assert_eq!(red, 3);
    }

    #[test]
    fn test_row_padding_does_not_skew_pixels() {
        let mut source = MockFrameSource::new(32, 32).with_row_padding(24);
        source.push_solid(Rgb::new(9, 8, 7));

        let frame = source
            .grab_region(4, 4, Duration::from_millis(500))
            .unwrap()
            .unwrap();
        assert!(frame.pixels().iter().all(|p| *p == Rgb::new(9, 8, 7)));
    }

    #[test]
    fn test_injected_error_fires_once() {
        let mut source = MockFrameSource::new(16, 16)
            .with_error(CaptureError::DuplicationAlreadyInUse);
        source.push_solid(Rgb::new(1, 1, 1));

        let err = source
            .grab_region(4, 4, Duration::from_millis(500))
            .unwrap_err();
        assert!(err.is_retryable());

        // The queued frame is served on the next call
        assert!(
            source
                .grab_region(4, 4, Duration::from_millis(500))
                .unwrap()
                .is_some()
        );
    }
}
