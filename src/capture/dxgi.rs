//! DXGI Desktop Duplication frame source (Windows)
//!
//! This backend owns the D3D11 device/context and the duplication handle
//! for the primary output:
//!
//! 1. Create a hardware D3D11 device and immediate context
//! 2. Walk device -> DXGI adapter -> first output, read its geometry
//! 3. `IDXGIOutput1::DuplicateOutput` for the duplication interface
//! 4. Per cycle: `AcquireNextFrame` with timeout, full-frame copy into a
//!    CPU-readable staging texture, map, extract the scan region, unmap,
//!    release
//!
//! The full-frame staging copy is unavoidable - the duplicated surface is
//! not CPU-addressable - and dominates the per-cycle cost even though only
//! a small region is read afterwards.
//!
//! # Resource lifetimes
//!
//! Every successful acquisition must be released before the next one, and
//! every map must be unmapped, on all exit paths: a leaked frame lock
//! starves all future acquisitions. [`AcquiredFrame`] and [`MappedTexture`]
//! are drop guards enforcing exactly-once release.
//!
//! The session is invalid after any unrecoverable platform error; it is not
//! auto-recreated here. Recovery policy belongs to the caller.

use std::time::Duration;

use windows::Win32::Graphics::Direct3D::D3D_DRIVER_TYPE_HARDWARE;
use windows::Win32::Graphics::Direct3D11::{
    D3D11_BIND_FLAG, D3D11_CPU_ACCESS_READ, D3D11_CREATE_DEVICE_FLAG, D3D11_MAP_READ,
    D3D11_MAPPED_SUBRESOURCE, D3D11_RESOURCE_MISC_FLAG, D3D11_SDK_VERSION,
    D3D11_TEXTURE2D_DESC, D3D11_USAGE_STAGING, D3D11CreateDevice, ID3D11Device,
    ID3D11DeviceContext, ID3D11Texture2D,
};
use windows::Win32::Graphics::Dxgi::{
    DXGI_ERROR_NOT_CURRENTLY_AVAILABLE, DXGI_ERROR_WAIT_TIMEOUT, DXGI_OUTDUPL_FRAME_INFO,
    DXGI_OUTPUT_DESC, IDXGIDevice, IDXGIOutput1, IDXGIOutputDuplication, IDXGIResource,
};
use windows::core::Interface;

use super::FrameSource;
use super::extract::extract_region;
use crate::error::{CaptureError, CaptureResult};
use crate::model::{FrameBuffer, ScanRegion, ScreenGeometry};

/// Desktop Duplication capture session for the primary output
///
/// Owns the device, context, and duplication handles for the process
/// lifetime. Not internally synchronized; external serialization required.
#[derive(Debug)]
pub struct DxgiFrameSource {
    device:      ID3D11Device,
    context:     ID3D11DeviceContext,
    duplication: IDXGIOutputDuplication,
    geometry:    ScreenGeometry,
}

impl DxgiFrameSource {
    /// Initializes the capture session and reads the display geometry
    ///
    /// # Errors
    ///
    /// - [`CaptureError::DeviceCreationFailed`] - D3D11 device creation
    /// - [`CaptureError::OutputUnavailable`] - adapter/output enumeration
    /// - [`CaptureError::DuplicationAlreadyInUse`] - another process holds
    ///   the exclusive duplication interface (retryable)
    /// - [`CaptureError::DuplicationFailed`] - any other duplication failure
    pub fn new() -> CaptureResult<Self> {
        let mut device: Option<ID3D11Device> = None;
        let mut context: Option<ID3D11DeviceContext> = None;
        unsafe {
            D3D11CreateDevice(
                None,
                D3D_DRIVER_TYPE_HARDWARE,
                None,
                D3D11_CREATE_DEVICE_FLAG(0),
                None,
                D3D11_SDK_VERSION,
                Some(&mut device),
                None,
                Some(&mut context),
            )
        }
        .map_err(|err| CaptureError::DeviceCreationFailed {
            reason: err.message().to_string(),
        })?;
        let device = device.ok_or_else(|| CaptureError::DeviceCreationFailed {
            reason: "device creation returned no device".to_string(),
        })?;
        let context = context.ok_or_else(|| CaptureError::DeviceCreationFailed {
            reason: "device creation returned no immediate context".to_string(),
        })?;

        let dxgi_device: IDXGIDevice =
            device.cast().map_err(|err| CaptureError::OutputUnavailable {
                reason: format!("IDXGIDevice cast failed: {}", err.message()),
            })?;
        let adapter = unsafe { dxgi_device.GetAdapter() }.map_err(|err| {
            CaptureError::OutputUnavailable {
                reason: format!("adapter lookup failed: {}", err.message()),
            }
        })?;
        let output = unsafe { adapter.EnumOutputs(0) }.map_err(|err| {
            CaptureError::OutputUnavailable {
                reason: format!("no output at index 0: {}", err.message()),
            }
        })?;

        let mut desc = DXGI_OUTPUT_DESC::default();
        unsafe { output.GetDesc(&mut desc) }.map_err(|err| CaptureError::OutputUnavailable {
            reason: format!("output description unavailable: {}", err.message()),
        })?;
        let coords = desc.DesktopCoordinates;
        let geometry = ScreenGeometry::new(
            (coords.right - coords.left) as u32,
            (coords.bottom - coords.top) as u32,
        );

        let output1: IDXGIOutput1 =
            output.cast().map_err(|err| CaptureError::DuplicationFailed {
                reason: format!("IDXGIOutput1 cast failed: {}", err.message()),
            })?;
        let duplication = unsafe { output1.DuplicateOutput(&device) }.map_err(|err| {
            if err.code() == DXGI_ERROR_NOT_CURRENTLY_AVAILABLE {
                CaptureError::DuplicationAlreadyInUse
            } else {
                CaptureError::DuplicationFailed {
                    reason: err.message().to_string(),
                }
            }
        })?;

        tracing::info!(width = geometry.width, height = geometry.height, "desktop duplication initialized");

        Ok(Self {
            device,
            context,
            duplication,
            geometry,
        })
    }
}

impl FrameSource for DxgiFrameSource {
    fn geometry(&self) -> ScreenGeometry {
        self.geometry
    }

    fn grab_region(
        &mut self,
        width: u32,
        height: u32,
        timeout: Duration,
    ) -> CaptureResult<Option<FrameBuffer>> {
        let mut frame_info = DXGI_OUTDUPL_FRAME_INFO::default();
        let mut resource: Option<IDXGIResource> = None;
        let acquired = unsafe {
            self.duplication.AcquireNextFrame(
                timeout.as_millis() as u32,
                &mut frame_info,
                &mut resource,
            )
        };
        if let Err(err) = acquired {
            // A timeout means nothing changed on screen - not an error
            if err.code() == DXGI_ERROR_WAIT_TIMEOUT {
                return Ok(None);
            }
            return Err(CaptureError::AcquisitionFailed {
                reason: err.message().to_string(),
            });
        }

        // Held until return; releases the frame lock on every exit path
        let _frame_lock = AcquiredFrame {
            duplication: &self.duplication,
        };

        let resource = resource.ok_or_else(|| CaptureError::AcquisitionFailed {
            reason: "acquisition succeeded but returned no resource".to_string(),
        })?;
        let texture: ID3D11Texture2D =
            resource.cast().map_err(|err| CaptureError::ExtractionFailed {
                reason: format!("desktop resource is not a texture: {}", err.message()),
            })?;

        let mut desc = D3D11_TEXTURE2D_DESC::default();
        unsafe { texture.GetDesc(&mut desc) };

        // Staging copy: same format/size, CPU-readable, no GPU binding
        let staging_desc = D3D11_TEXTURE2D_DESC {
            Usage: D3D11_USAGE_STAGING,
            BindFlags: D3D11_BIND_FLAG(0),
            CPUAccessFlags: D3D11_CPU_ACCESS_READ,
            MiscFlags: D3D11_RESOURCE_MISC_FLAG(0),
            ..desc
        };
        let mut staging: Option<ID3D11Texture2D> = None;
        unsafe { self.device.CreateTexture2D(&staging_desc, None, Some(&mut staging)) }.map_err(
            |err| CaptureError::ExtractionFailed {
                reason: format!("staging texture creation failed: {}", err.message()),
            },
        )?;
        let staging = staging.ok_or_else(|| CaptureError::ExtractionFailed {
            reason: "staging texture creation returned nothing".to_string(),
        })?;

        unsafe { self.context.CopyResource(&staging, &texture) };

        let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
        unsafe { self.context.Map(&staging, 0, D3D11_MAP_READ, 0, Some(&mut mapped)) }.map_err(
            |err| CaptureError::ExtractionFailed {
                reason: format!("staging map failed: {}", err.message()),
            },
        )?;
        // Unmaps on every exit path below
        let mapping = MappedTexture {
            context: &self.context,
            texture: &staging,
            mapped,
        };

        let region = ScanRegion::centered(self.geometry, width, height);
        let frame = extract_region(
            mapping.bytes(desc.Height as usize),
            mapping.row_pitch(),
            &region,
        )?;

        Ok(Some(frame))
    }
}

impl std::fmt::Debug for DxgiFrameSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DxgiFrameSource")
            .field("geometry", &self.geometry)
            .finish_non_exhaustive()
    }
}

/// Drop guard pairing one successful `AcquireNextFrame` with exactly one
/// `ReleaseFrame`
struct AcquiredFrame<'a> {
    duplication: &'a IDXGIOutputDuplication,
}

impl Drop for AcquiredFrame<'_> {
    fn drop(&mut self) {
        if let Err(err) = unsafe { self.duplication.ReleaseFrame() } {
            tracing::debug!("frame release failed: {}", err.message());
        }
    }
}

/// Drop guard pairing one successful `Map` with exactly one `Unmap`
struct MappedTexture<'a> {
    context: &'a ID3D11DeviceContext,
    texture: &'a ID3D11Texture2D,
    mapped:  D3D11_MAPPED_SUBRESOURCE,
}

impl MappedTexture<'_> {
    fn row_pitch(&self) -> usize {
        self.mapped.RowPitch as usize
    }

    /// The mapped plane as a byte slice covering `height` rows
    fn bytes(&self, height: usize) -> &[u8] {
        // SAFETY: pData points at RowPitch * height readable bytes for the
        // lifetime of the mapping, which this guard holds until drop
        unsafe {
            std::slice::from_raw_parts(self.mapped.pData as *const u8, self.row_pitch() * height)
        }
    }
}

impl Drop for MappedTexture<'_> {
    fn drop(&mut self) {
        unsafe { self.context.Unmap(self.texture, 0) };
    }
}
