//! Reference-frame storage and per-pixel change classification
//!
//! The [`ChangeDetector`] exclusively owns the reference frame. Its state
//! machine is deliberately small: `Uninitialized -> HasReference`, then a
//! self-loop on every successful comparison. The reference is only ever
//! replaced wholesale by an explicit [`ChangeDetector::set_reference`],
//! never updated in place and never replaced automatically.
//!
//! # Classification model
//!
//! The sensitivity percentage maps to an absolute per-channel byte
//! threshold. A pixel counts as changed when *any single channel's*
//! absolute difference strictly exceeds that threshold - an OR across
//! channels rather than a combined color-distance metric, favoring
//! sensitivity to any-channel spikes.

use crate::error::CompareError;
use crate::model::{Detection, DetectionParams, DiagnosticReport, FrameBuffer, HotPixel};

/// Holds the reference frame and compares newly extracted frames against it
#[derive(Debug, Default)]
pub struct ChangeDetector {
    reference: Option<FrameBuffer>,
}

impl ChangeDetector {
    /// Creates a detector with no reference frame
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditionally replaces the stored reference frame
    pub fn set_reference(&mut self, frame: FrameBuffer) {
        self.reference = Some(frame);
    }

    /// Whether a reference frame has been captured
    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// Dimensions of the stored reference, if any
    pub fn reference_dimensions(&self) -> Option<(u32, u32)> {
        self.reference.as_ref().map(FrameBuffer::dimensions)
    }

    /// Compares `frame` against the stored reference
    ///
    /// Returns the trigger decision (changed-pixel count >= the inclusive
    /// `pixel_threshold`) together with a fresh [`DiagnosticReport`].
    ///
    /// # Errors
    ///
    /// - [`CompareError::NoReference`] if no reference has been set
    /// - [`CompareError::SizeMismatch`] if dimensions differ from the
    ///   reference
    pub fn compare(
        &self,
        frame: &FrameBuffer,
        params: &DetectionParams,
    ) -> Result<Detection, CompareError> {
        let reference = self.reference.as_ref().ok_or(CompareError::NoReference)?;

        if frame.dimensions() != reference.dimensions() {
            let (expected_width, expected_height) = reference.dimensions();
            let (actual_width, actual_height) = frame.dimensions();
            return Err(CompareError::SizeMismatch {
                expected_width,
                expected_height,
                actual_width,
                actual_height,
            });
        }

        let threshold = params.channel_threshold();
        let mut changed: u32 = 0;
        let mut max_r: i32 = 0;
        let mut max_g: i32 = 0;
        let mut max_b: i32 = 0;
        // Shared index, overwritten whenever any channel's maximum rises.
        // Last writer wins among channels/pixels sharing a maximum.
        let mut hot_index: Option<usize> = None;

        for (i, (cur, refp)) in frame.pixels().iter().zip(reference.pixels()).enumerate() {
            let diff_r = (cur.r as i32 - refp.r as i32).abs();
            let diff_g = (cur.g as i32 - refp.g as i32).abs();
            let diff_b = (cur.b as i32 - refp.b as i32).abs();

            if diff_r > max_r {
                max_r = diff_r;
                hot_index = Some(i);
            }
            if diff_g > max_g {
                max_g = diff_g;
                hot_index = Some(i);
            }
            if diff_b > max_b {
                max_b = diff_b;
                hot_index = Some(i);
            }

            if diff_r > threshold || diff_g > threshold || diff_b > threshold {
                changed += 1;
            }
        }

        let hottest = hot_index.map(|i| {
            let width = frame.width();
            HotPixel {
                x:         i as u32 % width,
                y:         i as u32 / width,
                reference: reference.pixels()[i],
                current:   frame.pixels()[i],
            }
        });

        let report = DiagnosticReport {
            changed_pixels: changed,
            pixel_threshold: params.pixel_threshold,
            max_diff_r: max_r as u8,
            max_diff_g: max_g as u8,
            max_diff_b: max_b as u8,
            hottest,
        };

        Ok(Detection {
            triggered: changed >= params.pixel_threshold,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rgb;

    fn detector_with(reference: FrameBuffer) -> ChangeDetector {
        let mut detector = ChangeDetector::new();
        detector.set_reference(reference);
        detector
    }

    #[test]
    fn test_compare_before_reference_fails() {
        let detector = ChangeDetector::new();
        let frame = FrameBuffer::filled(2, 2, Rgb::new(0, 0, 0));
        let err = detector.compare(&frame, &DetectionParams::default());
        assert_eq!(err.unwrap_err(), CompareError::NoReference);
    }

    #[test]
    fn test_identical_frames_never_trigger() {
        let frame = FrameBuffer::filled(8, 8, Rgb::new(120, 45, 200));
        let detector = detector_with(frame.clone());

        for threshold in [1, 5, 1000] {
            let detection = detector
                .compare(&frame, &DetectionParams::new(0.0, threshold))
                .unwrap();
            assert!(!detection.triggered, "threshold {threshold}");
            assert_eq!(detection.report.changed_pixels, 0);
        }
        let detection = detector
            .compare(&frame, &DetectionParams::default())
            .unwrap();
        assert_eq!(detection.report.max_diff_r, 0);
        assert!(detection.report.hottest.is_none());
    }

    #[test]
    fn test_size_mismatch_is_hard_error() {
        let detector = detector_with(FrameBuffer::filled(8, 8, Rgb::new(0, 0, 0)));
        let frame = FrameBuffer::filled(4, 8, Rgb::new(0, 0, 0));
        assert_eq!(
            detector
                .compare(&frame, &DetectionParams::default())
                .unwrap_err(),
            CompareError::SizeMismatch {
                expected_width:  8,
                expected_height: 8,
                actual_width:    4,
                actual_height:   8,
            }
        );
    }

    #[test]
    fn test_any_channel_or_semantics() {
        let reference = FrameBuffer::filled(2, 1, Rgb::new(100, 100, 100));
        let detector = detector_with(reference);

        // Only the green channel moved, by 60; 20% sensitivity -> threshold 51
        let mut frame = FrameBuffer::filled(2, 1, Rgb::new(100, 100, 100));
        frame.set(1, 0, Rgb::new(100, 160, 100));

        let detection = detector
            .compare(&frame, &DetectionParams::new(20.0, 1))
            .unwrap();
        assert!(detection.triggered);
        assert_eq!(detection.report.changed_pixels, 1);
        assert_eq!(detection.report.max_diff_g, 60);
        assert_eq!(detection.report.max_diff_r, 0);
    }

    #[test]
    fn test_diff_equal_to_threshold_is_not_changed() {
        // 20% of 255 = 51; a diff of exactly 51 must NOT count (strict >)
        let reference = FrameBuffer::filled(1, 1, Rgb::new(0, 0, 0));
        let detector = detector_with(reference);

        let at = FrameBuffer::filled(1, 1, Rgb::new(51, 0, 0));
        let detection = detector.compare(&at, &DetectionParams::new(20.0, 1)).unwrap();
        assert_eq!(detection.report.changed_pixels, 0);
        assert!(!detection.triggered);

        let above = FrameBuffer::filled(1, 1, Rgb::new(52, 0, 0));
        let detection = detector
            .compare(&above, &DetectionParams::new(20.0, 1))
            .unwrap();
        assert_eq!(detection.report.changed_pixels, 1);
        assert!(detection.triggered);
    }

    #[test]
    fn test_trigger_boundary_is_inclusive() {
        let reference = FrameBuffer::filled(4, 1, Rgb::new(0, 0, 0));
        let detector = detector_with(reference);

        // Exactly 3 of 4 pixels changed
        let mut frame = FrameBuffer::filled(4, 1, Rgb::new(255, 255, 255));
        frame.set(3, 0, Rgb::new(0, 0, 0));

        let exactly = detector.compare(&frame, &DetectionParams::new(10.0, 3)).unwrap();
        assert_eq!(exactly.report.changed_pixels, 3);
        assert!(exactly.triggered);

        let above = detector.compare(&frame, &DetectionParams::new(10.0, 4)).unwrap();
        assert!(!above.triggered);
    }

    #[test]
    fn test_raising_sensitivity_never_increases_changed_count() {
        let reference = FrameBuffer::filled(16, 16, Rgb::new(128, 128, 128));
        let detector = detector_with(reference);

        // A gradient of differences across the frame
        let mut frame = FrameBuffer::filled(16, 16, Rgb::new(128, 128, 128));
        for y in 0..16u32 {
            for x in 0..16u32 {
                let delta = ((x + y * 16) % 256) as u8;
                frame.set(x, y, Rgb::new(128u8.wrapping_add(delta / 2), 128, 128));
            }
        }

        let mut previous = u32::MAX;
        for sensitivity in [0.0, 5.0, 10.0, 20.0, 40.0, 60.0, 80.0, 100.0] {
            let detection = detector
                .compare(&frame, &DetectionParams::new(sensitivity, 1))
                .unwrap();
            assert!(
                detection.report.changed_pixels <= previous,
                "sensitivity {sensitivity} increased the changed count"
            );
            previous = detection.report.changed_pixels;
        }
    }

    #[test]
    fn test_full_sensitivity_matches_nothing() {
        // Threshold 255 can never be strictly exceeded
        let reference = FrameBuffer::filled(2, 2, Rgb::new(0, 0, 0));
        let detector = detector_with(reference);
        let frame = FrameBuffer::filled(2, 2, Rgb::new(255, 255, 255));

        let detection = detector
            .compare(&frame, &DetectionParams::new(100.0, 1))
            .unwrap();
        assert_eq!(detection.report.changed_pixels, 0);
        assert_eq!(detection.report.max_diff_r, 255);
    }

    #[test]
    fn test_hot_pixel_coordinates_and_colors() {
        let reference = FrameBuffer::filled(4, 3, Rgb::new(10, 10, 10));
        let detector = detector_with(reference);

        let mut frame = FrameBuffer::filled(4, 3, Rgb::new(10, 10, 10));
        frame.set(2, 1, Rgb::new(10, 10, 200));

        let detection = detector
            .compare(&frame, &DetectionParams::new(40.0, 1))
            .unwrap();
        let hot = detection.report.hottest.unwrap();
        assert_eq!((hot.x, hot.y), (2, 1));
        assert_eq!(hot.reference, Rgb::new(10, 10, 10));
        assert_eq!(hot.current, Rgb::new(10, 10, 200));
        assert_eq!(detection.report.max_diff_b, 190);
    }

    #[test]
    fn test_hot_pixel_last_writer_wins() {
        // Two pixels with the same red delta: the first strictly raises the
        // maximum, the second equals it and must not steal the slot. A later
        // pixel raising a *different* channel does steal it.
        let reference = FrameBuffer::filled(4, 1, Rgb::new(0, 0, 0));
        let detector = detector_with(reference);

        let mut frame = FrameBuffer::filled(4, 1, Rgb::new(0, 0, 0));
        frame.set(0, 0, Rgb::new(100, 0, 0));
        frame.set(1, 0, Rgb::new(100, 0, 0)); // equal max, no update
        frame.set(3, 0, Rgb::new(0, 50, 0)); // green max rises here

        let detection = detector
            .compare(&frame, &DetectionParams::new(10.0, 1))
            .unwrap();
        let hot = detection.report.hottest.unwrap();
        assert_eq!((hot.x, hot.y), (3, 0));
        assert_eq!(detection.report.max_diff_r, 100);
        assert_eq!(detection.report.max_diff_g, 50);
    }

    #[test]
    fn test_reference_replacement_is_wholesale() {
        let mut detector = ChangeDetector::new();
        detector.set_reference(FrameBuffer::filled(2, 2, Rgb::new(0, 0, 0)));
        assert_eq!(detector.reference_dimensions(), Some((2, 2)));

        detector.set_reference(FrameBuffer::filled(6, 4, Rgb::new(1, 1, 1)));
        assert_eq!(detector.reference_dimensions(), Some((6, 4)));

        let frame = FrameBuffer::filled(6, 4, Rgb::new(1, 1, 1));
        let detection = detector
            .compare(&frame, &DetectionParams::default())
            .unwrap();
        assert_eq!(detection.report.changed_pixels, 0);
    }
}
