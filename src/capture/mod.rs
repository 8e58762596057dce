//! Frame acquisition and the capture engine facade
//!
//! The capture system is built around one capability seam:
//!
//! - [`FrameSource`] - owns a capture session and serves centered,
//!   clamped scan-region extractions with timeout semantics
//! - [`CaptureEngine`] - composes a source with the change detector,
//!   snapshot writer, and diagnostic sink
//!
//! On Windows the real source is [`dxgi::DxgiFrameSource`] (Desktop
//! Duplication). Everywhere, [`mock::MockFrameSource`] serves scripted
//! frames through the identical extraction path for tests and development.

use std::time::Duration;

use crate::error::CaptureResult;
use crate::model::{FrameBuffer, ScreenGeometry};

pub mod constants;
#[cfg(target_os = "windows")]
pub mod dxgi;
pub mod engine;
pub mod extract;
pub mod mock;

pub use engine::CaptureEngine;
pub use mock::MockFrameSource;

#[cfg(target_os = "windows")]
pub use dxgi::DxgiFrameSource;

/// Capability: serve scan-region frames from a display capture session
///
/// Implementations own their platform session state and are not internally
/// synchronized; callers serialize access externally (the engine drives one
/// sequential cycle at a time).
pub trait FrameSource: std::fmt::Debug {
    /// Pixel dimensions of the captured display
    fn geometry(&self) -> ScreenGeometry;

    /// Waits up to `timeout` for a new frame and extracts the centered
    /// `width` x `height` scan region from it
    ///
    /// `Ok(None)` means no new frame arrived within the timeout - the
    /// screen has not changed since the last acquisition. That is an
    /// expected, transient condition, distinct from every real failure.
    fn grab_region(
        &mut self,
        width: u32,
        height: u32,
        timeout: Duration,
    ) -> CaptureResult<Option<FrameBuffer>>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn geometry(&self) -> ScreenGeometry {
        (**self).geometry()
    }

    fn grab_region(
        &mut self,
        width: u32,
        height: u32,
        timeout: Duration,
    ) -> CaptureResult<Option<FrameBuffer>> {
        (**self).grab_region(width, height, timeout)
    }
}

/// Creates the default frame source for the current platform
///
/// - **Windows**: DXGI Desktop Duplication on the primary output
/// - **Other platforms**: [`CaptureError::BackendNotAvailable`]
pub fn create_default_source() -> CaptureResult<Box<dyn FrameSource>> {
    #[cfg(target_os = "windows")]
    {
        Ok(Box::new(dxgi::DxgiFrameSource::new()?))
    }

    #[cfg(not(target_os = "windows"))]
    {
        Err(crate::error::CaptureError::BackendNotAvailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(not(target_os = "windows"))]
    use crate::error::CaptureError;

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn test_default_source_unavailable_off_windows() {
        let err = create_default_source().unwrap_err();
        assert!(matches!(err, CaptureError::BackendNotAvailable));
    }

    #[test]
    fn test_boxed_source_is_a_frame_source() {
        let mut boxed: Box<dyn FrameSource> = Box::new(MockFrameSource::new(32, 32));
        assert_eq!(boxed.geometry(), ScreenGeometry::new(32, 32));
        assert!(
            boxed
                .grab_region(4, 4, Duration::from_millis(1))
                .unwrap()
                .is_none()
        );
    }
}
