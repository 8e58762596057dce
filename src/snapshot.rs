//! Diagnostic snapshot persistence
//!
//! Frames are serialized as uncompressed 24-bit-per-pixel bitmaps: a 14-byte
//! file header, a 40-byte `BITMAPINFOHEADER` declaring a *negative* height
//! (top-down row order), then raw BGR triples with each row padded to a
//! 4-byte boundary. No palette, no compression, no alpha. The format is
//! fixed and self-contained, so there are no versioning concerns.
//!
//! Filenames are `{prefix}_{yyyyMMdd_HHmmss}_{millis:03}_{counter:04}.{ext}`;
//! the per-writer monotonic counter keeps names unique even for multiple
//! snapshots within the same millisecond.
//!
//! Saving is best-effort by contract: callers on the trigger path log
//! failures and never let them alter an already-computed decision.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::capture::constants::SNAPSHOT_DIR;
use crate::model::{DiagnosticReport, FrameBuffer};

const FILE_HEADER_SIZE: usize = 14;
const INFO_HEADER_SIZE: usize = 40;
const PIXEL_DATA_OFFSET: u32 = (FILE_HEADER_SIZE + INFO_HEADER_SIZE) as u32;

/// Bytes per row after padding to a 4-byte boundary
fn row_size(width: u32) -> usize {
    ((width as usize * 3) + 3) & !3
}

/// Encodes a frame as an uncompressed top-down 24-bpp bitmap
pub fn encode_bmp(frame: &FrameBuffer) -> Vec<u8> {
    let width = frame.width();
    let height = frame.height();
    let row = row_size(width);
    let file_size = FILE_HEADER_SIZE + INFO_HEADER_SIZE + row * height as usize;

    let mut out = Vec::with_capacity(file_size);

    // File header (14 bytes): signature, total size, reserved, data offset
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&(file_size as u32).to_le_bytes());
    out.extend_from_slice(&[0u8; 4]);
    out.extend_from_slice(&PIXEL_DATA_OFFSET.to_le_bytes());

    // BITMAPINFOHEADER (40 bytes)
    out.extend_from_slice(&(INFO_HEADER_SIZE as u32).to_le_bytes());
    out.extend_from_slice(&(width as i32).to_le_bytes());
    // Negative height requests top-down row order
    out.extend_from_slice(&(-(height as i32)).to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // color planes
    out.extend_from_slice(&24u16.to_le_bytes()); // bits per pixel
    out.extend_from_slice(&0u32.to_le_bytes()); // compression: none
    out.extend_from_slice(&0u32.to_le_bytes()); // image size (0 ok uncompressed)
    out.extend_from_slice(&0u32.to_le_bytes()); // horizontal ppm
    out.extend_from_slice(&0u32.to_le_bytes()); // vertical ppm
    out.extend_from_slice(&0u32.to_le_bytes()); // palette colors
    out.extend_from_slice(&0u32.to_le_bytes()); // important colors

    // Pixel rows, BGR order, zero-padded to the row boundary
    let mut row_buf = vec![0u8; row];
    for y in 0..height {
        let mut pos = 0;
        for x in 0..width {
            let pixel = frame.get(x, y).unwrap_or_default();
            row_buf[pos] = pixel.b;
            row_buf[pos + 1] = pixel.g;
            row_buf[pos + 2] = pixel.r;
            pos += 3;
        }
        out.extend_from_slice(&row_buf);
    }

    out
}

/// Writes timestamped bitmap snapshots and companion diagnostic text files
///
/// The target directory is created on demand; a creation failure surfaces as
/// the `Err` of the save call and only suppresses saving, nothing else.
#[derive(Debug)]
pub struct SnapshotWriter {
    dir:     PathBuf,
    counter: u32,
}

impl SnapshotWriter {
    /// Creates a writer targeting `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir:     dir.into(),
            counter: 0,
        }
    }

    /// Directory snapshots are written into
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Generates the next timestamped, collision-resistant filename
    ///
    /// Bumps the monotonic per-writer counter, so names stay unique even
    /// when several snapshots land within the same millisecond.
    pub fn next_filename(&mut self, prefix: &str, extension: &str) -> String {
        let now = Local::now();
        self.counter += 1;
        format!(
            "{}_{}_{:03}_{:04}.{}",
            prefix,
            now.format("%Y%m%d_%H%M%S"),
            now.timestamp_subsec_millis(),
            self.counter,
            extension
        )
    }

    /// Saves a frame as a bitmap under the writer's directory
    pub fn save_frame(&mut self, frame: &FrameBuffer, prefix: &str) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let filename = self.next_filename(prefix, "bmp");
        let path = self.dir.join(filename);
        fs::write(&path, encode_bmp(frame))?;
        Ok(path)
    }

    /// Saves a trigger frame plus its companion diagnostic text file
    ///
    /// The companion shares the bitmap's stem with a `.txt` extension and
    /// carries the human-readable report and a timestamp.
    pub fn save_trigger(
        &mut self,
        frame: &FrameBuffer,
        report: &DiagnosticReport,
    ) -> io::Result<(PathBuf, PathBuf)> {
        let bmp_path = self.save_frame(frame, "trigger")?;
        let txt_path = bmp_path.with_extension("txt");
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        fs::write(
            &txt_path,
            format!("Trigger Reason: {report}\nTime: {timestamp}\n"),
        )?;
        Ok((bmp_path, txt_path))
    }
}

impl Default for SnapshotWriter {
    fn default() -> Self {
        Self::new(SNAPSHOT_DIR)
    }
}
