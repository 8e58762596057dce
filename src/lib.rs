//! pixelwatch: screen-region change detection engine
//!
//! pixelwatch continuously samples a small screen-centered rectangle,
//! detects statistically significant pixel-color changes against a stored
//! reference image, and reports a boolean trigger decision with supporting
//! diagnostics. It is the perception layer of a larger automation loop;
//! input handling, configuration, and the polling/cooldown policy live in
//! the caller.
//!
//! # Pipeline
//!
//! capture session -> region extraction -> change detection -> optional
//! bitmap snapshot, driven one sequential cycle at a time:
//!
//! ```rust
//! use pixelwatch::{CaptureEngine, DetectionParams, MockFrameSource, Rgb};
//!
//! let mut source = MockFrameSource::new(1920, 1080);
//! source.push_solid(Rgb::new(30, 30, 30));
//! source.push_solid(Rgb::new(240, 240, 240));
//!
//! let mut engine = CaptureEngine::new(source);
//! assert!(engine.capture_reference_frame(8, 8, false).unwrap());
//!
//! let detection = engine
//!     .check_for_changes(8, 8, &DetectionParams::default(), false, false)
//!     .unwrap()
//!     .expect("a frame was queued");
//! assert!(detection.triggered);
//! ```
//!
//! On Windows, [`create_default_source`] opens a DXGI Desktop Duplication
//! session on the primary output. The engine holds no hidden state beyond
//! the stored reference frame and performs no internal retries; callers
//! drive it repeatedly and own all scheduling.

pub mod capture;
pub mod detector;
pub mod diag;
pub mod error;
pub mod model;
pub mod snapshot;

pub use capture::{CaptureEngine, FrameSource, MockFrameSource, create_default_source};
#[cfg(target_os = "windows")]
pub use capture::DxgiFrameSource;
pub use detector::ChangeDetector;
pub use diag::{DiagnosticSink, MemorySink, TracingSink};
pub use error::{CaptureError, CaptureResult, CompareError};
pub use model::{
    Detection, DetectionParams, DiagnosticReport, FrameBuffer, HotPixel, Rgb, ScanRegion,
    ScreenGeometry,
};
pub use snapshot::{SnapshotWriter, encode_bmp};
