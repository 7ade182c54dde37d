//! Render surface state
//!
//! Tracks the logical viewport, the clamped device pixel ratio and the
//! drawing-buffer size derived from them. The GPU swapchain is configured from
//! [`RenderSurface::drawing_buffer_size`].

/// Viewport as reported by the hosting window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Logical width in window coordinates
    pub width: u32,
    /// Logical height in window coordinates
    pub height: u32,
    pub device_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSurface {
    width: u32,
    height: u32,
    pixel_ratio: f64,
    max_pixel_ratio: f64,
    alpha: bool,
}

impl RenderSurface {
    pub fn new(viewport: Viewport, max_pixel_ratio: f64, alpha: bool) -> Self {
        let mut surface = Self {
            width: viewport.width,
            height: viewport.height,
            pixel_ratio: 1.0,
            max_pixel_ratio,
            alpha,
        };
        surface.set_pixel_ratio(viewport.device_pixel_ratio);
        surface
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Stores `min(ratio, max_pixel_ratio)`
    pub fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = ratio.min(self.max_pixel_ratio);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    pub fn alpha(&self) -> bool {
        self.alpha
    }

    /// Size of the backing store in physical pixels
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        (
            (self.width as f64 * self.pixel_ratio).floor() as u32,
            (self.height as f64 * self.pixel_ratio).floor() as u32,
        )
    }

    /// Drawing-buffer size scaled down uniformly so neither side exceeds
    /// `max_dimension`. Each side stays at least one pixel.
    pub fn drawing_buffer_size_within(&self, max_dimension: u32) -> (u32, u32) {
        let (width, height) = self.drawing_buffer_size();
        let longest = width.max(height);
        if longest <= max_dimension || max_dimension == 0 {
            return (width, height);
        }

        let shrink = |side: u32| {
            let scaled = side as u64 * max_dimension as u64 / longest as u64;
            (scaled as u32).max(1)
        };
        (shrink(width), shrink(height))
    }

    pub fn clear_color(&self) -> wgpu::Color {
        if self.alpha {
            wgpu::Color::TRANSPARENT
        } else {
            wgpu::Color::BLACK
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_ratio_is_clamped() {
        for (reported, expected) in [(0.0, 0.0), (0.5, 0.5), (1.0, 1.0), (1.5, 1.5), (2.0, 2.0), (3.0, 2.0), (4.25, 2.0)] {
            let surface = RenderSurface::new(Viewport::new(800, 600, reported), 2.0, true);
            assert_eq!(surface.pixel_ratio(), expected, "reported ratio {reported}");
        }
    }

    #[test]
    fn test_drawing_buffer_size_floors() {
        let surface = RenderSurface::new(Viewport::new(801, 601, 1.5), 2.0, true);
        assert_eq!(surface.drawing_buffer_size(), (1201, 901));
    }

    #[test]
    fn test_large_hidpi_buffer_fits_texture_limit() {
        let surface = RenderSurface::new(Viewport::new(2560, 1440, 2.0), 2.0, true);
        assert_eq!(surface.drawing_buffer_size(), (5120, 2880));

        let (width, height) = surface.drawing_buffer_size_within(4096);
        assert_eq!((width, height), (4096, 2304));
        assert_eq!(width as f64 / height as f64, 5120.0 / 2880.0);
    }

    #[test]
    fn test_buffer_within_limit_is_untouched() {
        let surface = RenderSurface::new(Viewport::new(1280, 720, 2.0), 2.0, false);
        assert_eq!(surface.drawing_buffer_size_within(4096), (2560, 1440));

        let tall = RenderSurface::new(Viewport::new(300, 5000, 1.0), 2.0, false);
        let (width, height) = tall.drawing_buffer_size_within(4096);
        assert_eq!(height, 4096);
        assert_eq!(width, 245);
    }

    #[test]
    fn test_clear_color_follows_alpha_flag() {
        let opaque = RenderSurface::new(Viewport::new(10, 10, 1.0), 2.0, false);
        assert_eq!(opaque.clear_color().a, 1.0);
        let transparent = RenderSurface::new(Viewport::new(10, 10, 1.0), 2.0, true);
        assert_eq!(transparent.clear_color().a, 0.0);
    }
}
