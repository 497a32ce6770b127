use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use super::{PixelSurface, Viewport};

/// Presents frames painted on a [`PixelSurface`] to the window through
/// `pixels`. The pixel buffer always matches the window's inner size.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    draw_order: Vec<usize>,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            draw_order: Vec::new(),
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Rebuilds the pixel buffer for the new window size. A minimized
    /// window reports zero and keeps the old buffer.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width.max(1), height.max(1), window);
        Pixels::new(width.max(1), height.max(1), surface)
    }

    /// Hands `paint` a surface over the frame buffer plus the reusable
    /// draw-order scratch, then presents the result.
    pub fn draw(
        &mut self,
        paint: impl FnOnce(&mut PixelSurface<'_>, &mut Vec<usize>),
    ) -> Result<(), Error> {
        if self.viewport.is_empty() {
            return Ok(());
        }
        let viewport = self.viewport;
        let mut surface = PixelSurface::new(self.pixels.frame_mut(), viewport);
        paint(&mut surface, &mut self.draw_order);
        self.pixels.render()
    }
}
