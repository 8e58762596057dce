//! Error types for capture and comparison operations
//!
//! The taxonomy mirrors how callers are expected to react:
//!
//! - **Fatal at init**: device/output/duplication creation failures. The
//!   caller should not proceed to its polling loop.
//! - **Busy/contended**: [`CaptureError::DuplicationAlreadyInUse`] is a
//!   distinct condition (another process holds the exclusive duplication
//!   lock) that is retryable after that process lets go.
//! - **Comparison preconditions**: [`CompareError`] values are sequencing
//!   bugs in the caller (comparing before a reference exists, or with
//!   mismatched dimensions) and are never silently ignored.
//! - **Transient "no new frame"** is *not* an error; frame sources report it
//!   as `Ok(None)`.
//!
//! Snapshot I/O failures are best-effort by contract and never escalate out
//! of the engine; they surface only on the diagnostic sink.

/// Result type alias for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Errors raised by capture sessions, extraction, and the engine facade
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// D3D11 device/context creation failed
    #[error("failed to create capture device: {reason}")]
    DeviceCreationFailed {
        /// Platform error detail
        reason: String,
    },

    /// Adapter or display output enumeration failed
    #[error("display output unavailable: {reason}")]
    OutputUnavailable {
        /// Platform error detail
        reason: String,
    },

    /// Another process already holds the exclusive duplication interface
    ///
    /// Unlike the other init failures this one is recoverable by retrying
    /// once the other process releases the output.
    #[error("desktop duplication is already in use by another process")]
    DuplicationAlreadyInUse,

    /// Creating the output duplication interface failed
    #[error("failed to duplicate display output: {reason}")]
    DuplicationFailed {
        /// Platform error detail
        reason: String,
    },

    /// Acquiring the next frame failed with a real error (not a timeout)
    #[error("failed to acquire next frame: {reason}")]
    AcquisitionFailed {
        /// Platform error detail
        reason: String,
    },

    /// Staging copy, map, or region read-out of an acquired frame failed
    #[error("failed to extract frame region: {reason}")]
    ExtractionFailed {
        /// What went wrong between acquisition and the pixel buffer
        reason: String,
    },

    /// No capture backend exists for the current platform
    #[error("no capture backend is available on this platform")]
    BackendNotAvailable,

    /// Invalid parameter provided
    #[error("invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: String,
        /// Reason why it's invalid
        reason: String,
    },

    /// Comparison precondition violated (no reference, size mismatch)
    #[error(transparent)]
    Compare(#[from] CompareError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CaptureError {
    /// Whether retrying the failed operation later can reasonably succeed
    ///
    /// Only the duplication-contention case qualifies: everything else is
    /// either fatal at initialization or a caller sequencing bug.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CaptureError::DuplicationAlreadyInUse)
    }
}

/// Errors raised by [`ChangeDetector::compare`](crate::detector::ChangeDetector::compare)
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CompareError {
    /// `compare` was called before any reference frame was captured
    #[error("no reference frame captured; capture a reference before comparing")]
    NoReference,

    /// Frame dimensions differ from the stored reference
    ///
    /// Never silently compares a truncated prefix.
    #[error(
        "frame size {actual_width}x{actual_height} does not match reference \
         {expected_width}x{expected_height}"
    )]
    SizeMismatch {
        /// Reference frame width
        expected_width:  u32,
        /// Reference frame height
        expected_height: u32,
        /// Incoming frame width
        actual_width:    u32,
        /// Incoming frame height
        actual_height:   u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplication_in_use_is_retryable() {
        assert!(CaptureError::DuplicationAlreadyInUse.is_retryable());
        assert!(
            !CaptureError::DeviceCreationFailed {
                reason: "x".to_string()
            }
            .is_retryable()
        );
        assert!(!CaptureError::BackendNotAvailable.is_retryable());
    }

    #[test]
    fn test_compare_error_wraps_into_capture_error() {
        let err: CaptureError = CompareError::NoReference.into();
        assert!(matches!(err, CaptureError::Compare(CompareError::NoReference)));
    }

    #[test]
    fn test_size_mismatch_message_names_both_sizes() {
        let err = CompareError::SizeMismatch {
            expected_width:  8,
            expected_height: 8,
            actual_width:    4,
            actual_height:   8,
        };
        let msg = err.to_string();
        assert!(msg.contains("4x8"));
        assert!(msg.contains("8x8"));
    }
}
