use crate::submit::GpuFault;

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        for f in preferred {
            if caps.formats.contains(&f) {
                return Some(f);
            }
        }
    }

    Some(caps.formats[0])
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Classifies a surface error for the frame submitter.
///
/// Lost and outdated surfaces are rebuilt, a timeout skips the frame, and
/// anything else is fatal.
pub(crate) fn map_surface_error(err: wgpu::SurfaceError) -> GpuFault {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => GpuFault::SurfaceOutOfDate,
        wgpu::SurfaceError::Timeout => GpuFault::Timeout,
        wgpu::SurfaceError::OutOfMemory => GpuFault::Unexpected("out of memory".into()),
        wgpu::SurfaceError::Other => GpuFault::Unexpected("surface error".into()),
    }
}
