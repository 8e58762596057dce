//! Centralized constants for the capture path

/// Default wait for a new duplicated frame, in milliseconds
///
/// A timeout here is not a failure: it simply means nothing on screen
/// changed since the last acquisition. 500ms is the platform-recommended
/// value for desktop duplication and keeps a polling caller responsive
/// without busy-waiting.
pub const ACQUIRE_TIMEOUT_MS: u64 = 500;

/// Default directory diagnostic snapshots land in, created on demand
pub const SNAPSHOT_DIR: &str = "screenshots";

/// Byte stride of duplicated source pixels (B, G, R, A)
///
/// The alpha byte is discarded during extraction; the capture source is
/// always treated as fully opaque.
pub const SOURCE_BYTES_PER_PIXEL: usize = 4;
