//! Device acquisition. The float MRT layout needs more color-attachment bytes per sample
//! than wgpu's default limits allow, so hosts request the device through here.

use crate::error::{RsmError, RsmResult};
use crate::resources::{MAX_COLOR_BYTES_PER_SAMPLE, RSM_TARGET_COUNT};

/// Limits needed by the renderer on `adapter`, or `None` when the adapter cannot meet them.
pub fn required_limits(supported: &wgpu::Limits) -> Option<wgpu::Limits> {
    if supported.max_color_attachment_bytes_per_sample < MAX_COLOR_BYTES_PER_SAMPLE
        || supported.max_color_attachments < RSM_TARGET_COUNT
    {
        return None;
    }
    let mut limits = wgpu::Limits::default().using_resolution(supported.clone());
    limits.max_color_attachment_bytes_per_sample =
        limits.max_color_attachment_bytes_per_sample.max(MAX_COLOR_BYTES_PER_SAMPLE);
    limits.max_color_attachments = limits.max_color_attachments.max(RSM_TARGET_COUNT);
    Some(limits)
}

/// Check that an already created device can run the renderer.
pub fn check_limits(limits: &wgpu::Limits) -> RsmResult<()> {
    if limits.max_color_attachment_bytes_per_sample < MAX_COLOR_BYTES_PER_SAMPLE {
        return Err(RsmError::device(format!(
            "device allows {} color bytes per sample, the RSM pass writes {}",
            limits.max_color_attachment_bytes_per_sample, MAX_COLOR_BYTES_PER_SAMPLE
        )));
    }
    if limits.max_color_attachments < RSM_TARGET_COUNT {
        return Err(RsmError::device(format!(
            "device allows {} color attachments, the RSM pass writes {}",
            limits.max_color_attachments, RSM_TARGET_COUNT
        )));
    }
    Ok(())
}

/// Check that a square RSM of `resolution` texels fits the device's 2D texture limit.
pub fn check_rsm_resolution(limits: &wgpu::Limits, resolution: u32) -> RsmResult<()> {
    if resolution > limits.max_texture_dimension_2d {
        return Err(RsmError::Config(format!(
            "rsm_resolution {resolution} exceeds the device's {} texture limit",
            limits.max_texture_dimension_2d
        )));
    }
    Ok(())
}

/// Request a device with [`required_limits`] from `adapter`.
pub async fn request_device(adapter: &wgpu::Adapter) -> RsmResult<(wgpu::Device, wgpu::Queue)> {
    let info = adapter.get_info();
    let limits = required_limits(&adapter.limits()).ok_or_else(|| {
        RsmError::device(format!("adapter {} ({:?}) cannot hold the RSM float targets", info.name, info.backend))
    })?;
    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("rsm_device"),
                required_features: wgpu::Features::empty(),
                required_limits: limits,
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        )
        .await
        .map_err(RsmError::device)?;
    log::info!("device ready on {} ({:?})", info.name, info.backend);
    Ok((device, queue))
}

/// Headless adapter + device, for tools and tests. Falls back to a software adapter
/// when no hardware one is available.
pub async fn request_headless() -> RsmResult<(wgpu::Adapter, wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
    let adapter = match instance.request_adapter(&wgpu::RequestAdapterOptions::default()).await {
        Some(adapter) => adapter,
        None => {
            log::warn!("no hardware adapter, trying the fallback adapter");
            instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    force_fallback_adapter: true,
                    ..Default::default()
                })
                .await
                .ok_or_else(|| RsmError::device("no suitable GPU adapter"))?
        }
    };
    let (device, queue) = request_device(&adapter).await?;
    Ok((adapter, device, queue))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_are_raised() {
        let supported = wgpu::Limits { max_color_attachment_bytes_per_sample: 64, ..wgpu::Limits::default() };
        let limits = required_limits(&supported).unwrap();
        assert!(limits.max_color_attachment_bytes_per_sample >= MAX_COLOR_BYTES_PER_SAMPLE);
        check_limits(&limits).unwrap();
    }

    #[test]
    fn oversized_rsm_is_a_config_error() {
        let limits = wgpu::Limits::default();
        check_rsm_resolution(&limits, limits.max_texture_dimension_2d).unwrap();
        let err = check_rsm_resolution(&limits, limits.max_texture_dimension_2d + 1);
        assert!(matches!(err, Err(RsmError::Config(_))));
    }

    #[test]
    fn weak_adapter_is_rejected() {
        let supported = wgpu::Limits::downlevel_webgl2_defaults();
        assert!(required_limits(&supported).is_none());
        assert!(matches!(check_limits(&wgpu::Limits::default()), Err(RsmError::Device(_))));
    }
}
