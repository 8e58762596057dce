//! Capture engine facade
//!
//! [`CaptureEngine`] composes a frame source, the change detector, the
//! snapshot writer, and a diagnostic sink into the two operations the
//! external control loop drives: capture a reference frame, then repeatedly
//! check for changes against it.
//!
//! The engine carries no hidden state beyond the single stored reference
//! frame and the snapshot filename counter: callers may invoke it
//! repeatedly with no internal retry policy or state drift. It is not
//! internally synchronized; the surrounding loop owns serialization.

use std::path::PathBuf;
use std::time::Duration;

use super::constants::ACQUIRE_TIMEOUT_MS;
use super::FrameSource;
use crate::detector::ChangeDetector;
use crate::diag::{DiagnosticSink, TracingSink};
use crate::error::CaptureResult;
use crate::model::{Detection, DetectionParams, ScreenGeometry};
use crate::snapshot::SnapshotWriter;

/// Screen-region change detection engine
///
/// Drives one capture-extract-compare cycle per call, sequentially, on the
/// caller's thread. The only blocking operation is the frame acquisition,
/// bounded by the configured timeout.
pub struct CaptureEngine<S> {
    source:    S,
    detector:  ChangeDetector,
    snapshots: SnapshotWriter,
    sink:      Box<dyn DiagnosticSink>,
    timeout:   Duration,
}

impl<S: FrameSource> CaptureEngine<S> {
    /// Creates an engine over `source` with default snapshot directory,
    /// tracing diagnostics, and the platform-recommended acquire timeout
    pub fn new(source: S) -> Self {
        Self {
            source,
            detector: ChangeDetector::new(),
            snapshots: SnapshotWriter::default(),
            sink: Box::new(TracingSink),
            timeout: Duration::from_millis(ACQUIRE_TIMEOUT_MS),
        }
    }

    /// Redirects snapshots into `dir`
    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshots = SnapshotWriter::new(dir);
        self
    }

    /// Replaces the diagnostic sink
    pub fn with_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Overrides the frame acquisition timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Pixel dimensions of the captured display
    pub fn geometry(&self) -> ScreenGeometry {
        self.source.geometry()
    }

    /// Whether a reference frame has been captured
    pub fn has_reference(&self) -> bool {
        self.detector.has_reference()
    }

    /// Captures a new reference frame for the centered `width` x `height`
    /// scan region
    ///
    /// Returns `Ok(false)` when no new frame arrived within the timeout (the
    /// previous reference, if any, is left untouched). On success the stored
    /// reference is replaced wholesale.
    ///
    /// With `save_snapshot`, the frame is also written as a bitmap; a write
    /// failure is reported on the diagnostic sink and does not fail the
    /// capture.
    pub fn capture_reference_frame(
        &mut self,
        width: u32,
        height: u32,
        save_snapshot: bool,
    ) -> CaptureResult<bool> {
        let Some(frame) = self.source.grab_region(width, height, self.timeout)? else {
            return Ok(false);
        };

        if save_snapshot {
            match self.snapshots.save_frame(&frame, "reference") {
                Ok(path) => self
                    .sink
                    .note(&format!("reference frame saved as {}", path.display())),
                Err(err) => self
                    .sink
                    .warn(&format!("failed to save reference frame: {err}")),
            }
        }

        self.detector.set_reference(frame);
        Ok(true)
    }

    /// Captures the scan region and compares it against the reference
    ///
    /// Returns `Ok(None)` when no new frame arrived within the timeout -
    /// nothing to report this cycle. Otherwise returns the trigger decision
    /// with its diagnostic report.
    ///
    /// With `debug`, progress lines go to the diagnostic sink. With
    /// `save_snapshot`, a triggered comparison also persists the frame and a
    /// companion diagnostic text file; write failures are reported on the
    /// sink and never alter the decision already computed.
    ///
    /// # Errors
    ///
    /// Capture failures propagate as-is. Comparing before any reference was
    /// captured, or with a region size different from the reference's, is a
    /// hard sequencing error.
    pub fn check_for_changes(
        &mut self,
        width: u32,
        height: u32,
        params: &DetectionParams,
        debug: bool,
        save_snapshot: bool,
    ) -> CaptureResult<Option<Detection>> {
        let Some(frame) = self.source.grab_region(width, height, self.timeout)? else {
            return Ok(None);
        };

        let detection = self.detector.compare(&frame, params)?;

        if debug {
            self.sink.note(&format!(
                "changes detected: {} pixels (threshold: {})",
                detection.report.changed_pixels, detection.report.pixel_threshold
            ));
            self.sink.note(&format!(
                "max differences - R: {}, G: {}, B: {}",
                detection.report.max_diff_r,
                detection.report.max_diff_g,
                detection.report.max_diff_b
            ));
            if detection.triggered {
                self.sink
                    .note(&format!("trigger reason:\n{}", detection.report));
            }
        }

        if detection.triggered && save_snapshot {
            match self.snapshots.save_trigger(&frame, &detection.report) {
                Ok((bmp, txt)) => {
                    if debug {
                        self.sink
                            .note(&format!("trigger frame saved as {}", bmp.display()));
                        self.sink
                            .note(&format!("trigger reason saved to {}", txt.display()));
                    }
                }
                Err(err) => self
                    .sink
                    .warn(&format!("failed to save trigger frame: {err}")),
            }
        }

        Ok(Some(detection))
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for CaptureEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureEngine")
            .field("source", &self.source)
            .field("detector", &self.detector)
            .field("snapshots", &self.snapshots)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
