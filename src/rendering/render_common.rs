use crate::viewport::ViewportSize;

/// Picks an sRGB surface format so the lit pass can write linear color.
pub fn surface_config(
    adapter: &wgpu::Adapter,
    surface: &wgpu::Surface,
    size: ViewportSize,
) -> anyhow::Result<wgpu::SurfaceConfiguration> {
    let surface_caps = surface.get_capabilities(adapter);
    let surface_format = surface_caps
        .formats
        .iter()
        .find(|f| f.is_srgb())
        .or_else(|| surface_caps.formats.first())
        .copied()
        .ok_or_else(|| anyhow::anyhow!("Surface is not supported by the adapter"))?;

    if !surface_format.is_srgb() {
        log::warn!(
            "No sRGB surface format available, colors will be too dark ({:?})",
            surface_format
        );
    }

    Ok(wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: surface_format,
        width: size.buffer_width,
        height: size.buffer_height,
        present_mode: wgpu::PresentMode::AutoVsync,
        alpha_mode: surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto),
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    })
}
