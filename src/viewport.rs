use crate::camera::Camera;

/// Output size after a resize. `width`/`height` are logical pixels, `buffer_*` the size of
/// the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSize {
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
    pub buffer_width: u32,
    pub buffer_height: u32,
}

impl ViewportSize {
    /// Stand-in used to configure the surface before the container has any area.
    pub const PLACEHOLDER: ViewportSize = ViewportSize {
        width: 1.0,
        height: 1.0,
        pixel_ratio: 1.0,
        buffer_width: 1,
        buffer_height: 1,
    };
}

/// Keeps the camera and the drawing surface in sync with the host container.
#[derive(Debug, Default)]
pub struct Viewport {
    size: Option<ViewportSize>,
}

impl Viewport {
    pub const MAX_PIXEL_RATIO: f32 = 2.0;

    pub fn size(&self) -> Option<ViewportSize> {
        self.size
    }

    /// Size to configure the drawing surface with. Falls back to a 1×1 placeholder until the
    /// container has had a nonzero size.
    pub fn surface_size(&self) -> ViewportSize {
        self.size.unwrap_or(ViewportSize::PLACEHOLDER)
    }

    /// Recomputes the camera aspect and output size. A zero-sized container is ignored and
    /// leaves the camera and the previous size untouched.
    pub fn resize(
        &mut self,
        width: f32,
        height: f32,
        device_pixel_ratio: f32,
        camera: &mut Camera,
    ) -> Option<ViewportSize> {
        if !(width > 0.0 && height > 0.0) {
            log::debug!("Ignoring resize to {}x{}", width, height);
            return None;
        }

        let pixel_ratio = if device_pixel_ratio > 0.0 {
            device_pixel_ratio.min(Self::MAX_PIXEL_RATIO)
        } else {
            1.0
        };

        let size = ViewportSize {
            width,
            height,
            pixel_ratio,
            buffer_width: ((width * pixel_ratio).round() as u32).max(1),
            buffer_height: ((height * pixel_ratio).round() as u32).max(1),
        };

        camera.aspect = width / height;
        self.size = Some(size);

        Some(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_updates_aspect_and_output_size() {
        let mut viewport = Viewport::default();
        let mut camera = Camera::default();

        viewport.resize(800.0, 600.0, 1.0, &mut camera).unwrap();
        let size = viewport.resize(400.0, 300.0, 1.0, &mut camera).unwrap();

        assert_eq!(camera.aspect, 400.0 / 300.0);
        assert_eq!((size.width, size.height), (400.0, 300.0));
        assert_eq!((size.buffer_width, size.buffer_height), (400, 300));
    }

    #[test]
    fn pixel_ratio_is_capped_at_two() {
        let mut viewport = Viewport::default();
        let mut camera = Camera::default();

        let size = viewport.resize(400.0, 300.0, 3.0, &mut camera).unwrap();

        assert_eq!(size.pixel_ratio, 2.0);
        assert_eq!((size.buffer_width, size.buffer_height), (800, 600));

        let size = viewport.resize(400.0, 300.0, 1.5, &mut camera).unwrap();
        assert_eq!(size.pixel_ratio, 1.5);
        assert_eq!((size.buffer_width, size.buffer_height), (600, 450));
    }

    #[test]
    fn zero_sized_container_is_ignored() {
        let mut viewport = Viewport::default();
        let mut camera = Camera::default();
        viewport.resize(800.0, 600.0, 1.0, &mut camera);

        assert_eq!(viewport.resize(0.0, 600.0, 1.0, &mut camera), None);
        assert_eq!(viewport.resize(800.0, 0.0, 1.0, &mut camera), None);

        assert_eq!(camera.aspect, 800.0 / 600.0);
        assert_eq!(viewport.size().unwrap().width, 800.0);
    }

    #[test]
    fn zero_sized_startup_uses_a_placeholder_until_resized() {
        let mut viewport = Viewport::default();
        let mut camera = Camera::default();
        let aspect = camera.aspect;

        assert_eq!(viewport.resize(0.0, 0.0, 2.0, &mut camera), None);
        assert_eq!(viewport.surface_size(), ViewportSize::PLACEHOLDER);
        assert_eq!(camera.aspect, aspect);

        let size = viewport.resize(640.0, 480.0, 1.0, &mut camera).unwrap();
        assert_eq!(viewport.surface_size(), size);
        assert_eq!((size.buffer_width, size.buffer_height), (640, 480));
    }
}
