//! Region extraction from mapped BGRA pixel planes
//!
//! A duplicated frame arrives as a full-display plane of 4-byte BGRA pixels
//! whose rows are `row_pitch` bytes apart (the pitch is driver-chosen and
//! usually wider than `width * 4`). Extraction walks only the rows and
//! columns inside the scan rectangle, drops the alpha byte, and reorders to
//! R,G,B. It never resizes or scales: the output buffer's dimensions equal
//! the region's exactly.
//!
//! This code is platform-neutral on purpose - the DXGI backend calls it on
//! mapped staging memory, the mock source calls it on synthetic planes, and
//! the extraction invariants stay testable everywhere.

use super::constants::SOURCE_BYTES_PER_PIXEL;
use crate::error::{CaptureError, CaptureResult};
use crate::model::{FrameBuffer, Rgb, ScanRegion};

/// Copies the scan region out of a BGRA plane into a flat RGB buffer
///
/// `data` must cover at least the last byte the region touches, i.e.
/// `(region.bottom() - 1) * row_pitch + region.right() * 4` bytes.
///
/// # Errors
///
/// [`CaptureError::ExtractionFailed`] when the plane is too small for the
/// requested region, which would otherwise read out of bounds.
pub fn extract_region(data: &[u8], row_pitch: usize, region: &ScanRegion) -> CaptureResult<FrameBuffer> {
    if region.width == 0 || region.height == 0 {
        return FrameBuffer::from_pixels(region.width, region.height, Vec::new());
    }

    let last_row_start = (region.bottom() as usize - 1) * row_pitch;
    let required = last_row_start + region.right() as usize * SOURCE_BYTES_PER_PIXEL;
    if required > data.len() {
        return Err(CaptureError::ExtractionFailed {
            reason: format!(
                "mapped plane of {} bytes too small for region {}x{}+{}+{} (needs {required})",
                data.len(),
                region.width,
                region.height,
                region.left,
                region.top
            ),
        });
    }

    let mut pixels = Vec::with_capacity(region.width as usize * region.height as usize);
    for y in region.top..region.bottom() {
        let row = y as usize * row_pitch;
        for x in region.left..region.right() {
            let src = row + x as usize * SOURCE_BYTES_PER_PIXEL;
            // Source order is B, G, R, A; alpha is discarded
            pixels.push(Rgb {
                r: data[src + 2],
                g: data[src + 1],
                b: data[src],
            });
        }
    }

    FrameBuffer::from_pixels(region.width, region.height, pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScreenGeometry;

    /// Builds a BGRA plane where pixel (x, y) encodes its own coordinates:
    /// B = x, G = y, R = 0xAB, A = 0xFF
    fn coordinate_plane(width: u32, height: u32, row_pitch: usize) -> Vec<u8> {
        let mut data = vec![0u8; row_pitch * height as usize];
        for y in 0..height {
            for x in 0..width {
                let i = y as usize * row_pitch + x as usize * 4;
                data[i] = x as u8;
                data[i + 1] = y as u8;
                data[i + 2] = 0xAB;
                data[i + 3] = 0xFF;
            }
        }
        data
    }

    #[test]
    fn test_extract_returns_exact_sample_count() {
        let geometry = ScreenGeometry::new(64, 48);
        let plane = coordinate_plane(64, 48, 64 * 4);

        for (w, h) in [(1, 1), (8, 8), (63, 47), (64, 48)] {
            let region = ScanRegion::centered(geometry, w, h);
            let frame = extract_region(&plane, 64 * 4, &region).unwrap();
            assert_eq!(frame.len(), (w * h) as usize, "{w}x{h}");
            assert_eq!(frame.dimensions(), (w, h));
        }
    }

    #[test]
    fn test_extract_reorders_bgra_to_rgb() {
        let region = ScanRegion {
            left:   0,
            top:    0,
            width:  1,
            height: 1,
        };
        // One pixel: B=10, G=20, R=30, A=40
        let frame = extract_region(&[10, 20, 30, 40], 4, &region).unwrap();
        assert_eq!(frame.pixels()[0], Rgb::new(30, 20, 10));
    }

    #[test]
    fn test_extract_reads_centered_window() {
        let geometry = ScreenGeometry::new(16, 16);
        let plane = coordinate_plane(16, 16, 16 * 4);
        let region = ScanRegion::centered(geometry, 4, 4);
        assert_eq!((region.left, region.top), (6, 6));

        let frame = extract_region(&plane, 16 * 4, &region).unwrap();
        // Top-left of the extracted window is screen pixel (6, 6)
        assert_eq!(frame.get(0, 0), Some(Rgb::new(0xAB, 6, 6)));
        // Bottom-right is screen pixel (9, 9)
        assert_eq!(frame.get(3, 3), Some(Rgb::new(0xAB, 9, 9)));
    }

    #[test]
    fn test_extract_respects_row_pitch_padding() {
        // Pitch wider than width*4, as drivers commonly return
        let pitch = 16 * 4 + 32;
        let plane = coordinate_plane(16, 16, pitch);
        let region = ScanRegion {
            left:   10,
            top:    12,
            width:  4,
            height: 2,
        };

        let frame = extract_region(&plane, pitch, &region).unwrap();
        assert_eq!(frame.get(0, 0), Some(Rgb::new(0xAB, 12, 10)));
        assert_eq!(frame.get(3, 1), Some(Rgb::new(0xAB, 13, 13)));
    }

    #[test]
    fn test_extract_rejects_undersized_plane() {
        let region = ScanRegion {
            left:   0,
            top:    0,
            width:  4,
            height: 4,
        };
        let too_small = vec![0u8; 3 * 16]; // one row short
        let err = extract_region(&too_small, 16, &region).unwrap_err();
        assert!(matches!(err, CaptureError::ExtractionFailed { .. }));
    }

    #[test]
    fn test_extract_empty_region() {
        let frame = extract_region(&[], 0, &ScanRegion {
            left:   0,
            top:    0,
            width:  0,
            height: 0,
        })
        .unwrap();
        assert!(frame.is_empty());
    }
}
