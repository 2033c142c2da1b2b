//! Compositor: paints a scene snapshot onto an off-screen raster.
//!
//! This module is the only place that touches [`tiny_skia`]. It receives
//! already-decoded images and draws them; it never fetches, waits, or mutates
//! scene state. Callers issue draws in layer order (background, grid, items
//! bottom to top) and every later draw lands on top of earlier ones.
//!
//! All drawing coordinates are board units. The surface is allocated at
//! `board × scale` pixels and a uniform scale transform maps one to the other.

#[cfg(test)]
#[path = "compositor_test.rs"]
mod compositor_test;

use canvas::background::{DEFAULT_INNER_RGB, DEFAULT_OUTER_RGB};
use canvas::scene::{Item, derive_height};
use canvas::viewport::Size;
use tiny_skia::{
    Color, ColorU8, FilterQuality, GradientStop, Paint, PathBuilder, Pixmap, PixmapPaint, Point, RadialGradient,
    Rect, SpreadMode, Stroke, Transform,
};
use tracing::warn;

use crate::export::ExportError;
use crate::loader::{DecodedImage, LoadError};

/// Grid line color: accent orange at 25% opacity.
const GRID_RGBA: [u8; 4] = [206, 114, 0, 64];

/// Grid line width in board units.
const GRID_LINE_WIDTH: f32 = 1.0;

/// Drop shadow under each frame: offset, blur extent, and peak opacity.
const SHADOW_OFFSET_Y: f32 = 10.0;
const SHADOW_BLUR: f32 = 20.0;
const SHADOW_ALPHA: f32 = 0.3;

/// Number of stacked rects approximating the blurred shadow edge.
const SHADOW_STEPS: u16 = 10;

/// Largest source image side the compositor will rasterize.
pub const MAX_SOURCE_SIDE: u32 = 16_384;

/// An off-screen surface plus the board-to-pixel transform.
pub struct Compositor {
    pixmap: Pixmap,
    base: Transform,
    board: Size,
    frame_border: f32,
}

impl Compositor {
    /// Allocate a transparent surface for a `board`-sized scene.
    ///
    /// # Errors
    ///
    /// Returns `EmptyBoard` when the board or scaled surface has no pixels and
    /// `SurfaceAllocation` when the surface cannot be allocated.
    pub fn new(board: Size, scale: f32, frame_border: f32) -> Result<Self, ExportError> {
        let (width, height) = surface_size(board, scale);
        if width == 0 || height == 0 {
            return Err(ExportError::EmptyBoard { width: board.width, height: board.height });
        }
        let pixmap = Pixmap::new(width, height).ok_or(ExportError::SurfaceAllocation { width, height })?;
        Ok(Self { pixmap, base: Transform::from_scale(scale, scale), board, frame_border })
    }

    /// Surface size in pixels.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Serialize the surface as PNG.
    ///
    /// # Errors
    ///
    /// Returns `Encode` if the encoder fails.
    pub fn encode_png(&self) -> Result<Vec<u8>, ExportError> {
        self.pixmap.encode_png().map_err(|e| ExportError::Encode(e.to_string()))
    }

    // =========================================================================
    // BACKGROUND
    // =========================================================================

    /// Fill with the default two-stop radial gradient centered on the board.
    pub fn draw_default_background(&mut self) {
        let (w, h) = self.board_f32();
        let center = Point::from_xy(w / 2.0, h / 2.0);
        let shader = RadialGradient::new(
            center,
            center,
            w.max(h),
            vec![
                GradientStop::new(0.0, rgb(DEFAULT_INNER_RGB)),
                GradientStop::new(1.0, rgb(DEFAULT_OUTER_RGB)),
            ],
            SpreadMode::Pad,
            Transform::identity(),
        );
        let Some(shader) = shader else {
            self.draw_fallback_background();
            return;
        };

        let mut paint = Paint::default();
        paint.shader = shader;
        self.fill_board(&paint);
    }

    /// Flat fill in the default palette, used when a background image fails.
    pub fn draw_fallback_background(&mut self) {
        let mut paint = Paint::default();
        paint.set_color(rgb(DEFAULT_INNER_RGB));
        self.fill_board(&paint);
    }

    /// Draw `image` cover-fit: scaled to fill the board, centered, overflow cropped.
    ///
    /// # Errors
    ///
    /// Returns `TooLarge` without drawing when the image cannot be rasterized.
    #[allow(clippy::cast_precision_loss)]
    pub fn draw_background_image(&mut self, image: &DecodedImage) -> Result<(), LoadError> {
        let source = to_pixmap(image)?;

        let (w, h) = self.board_f32();
        let (iw, ih) = (source.width() as f32, source.height() as f32);
        let ratio = (w / iw).max(h / ih);
        let shift_x = (w - iw * ratio) / 2.0;
        let shift_y = (h - ih * ratio) / 2.0;

        let transform = self.base.pre_translate(shift_x, shift_y).pre_scale(ratio, ratio);
        self.pixmap.draw_pixmap(0, 0, source.as_ref(), &image_paint(), transform, None);
        Ok(())
    }

    fn fill_board(&mut self, paint: &Paint<'_>) {
        let (w, h) = self.board_f32();
        if let Some(rect) = Rect::from_xywh(0.0, 0.0, w, h) {
            self.pixmap.fill_rect(rect, paint, self.base, None);
        }
    }

    // =========================================================================
    // GRID
    // =========================================================================

    /// Draw vertical and horizontal lines every `pitch` units across the board.
    pub fn draw_grid(&mut self, pitch: f64) {
        if !(pitch.is_finite() && pitch > 0.0) {
            return;
        }
        #[allow(clippy::cast_possible_truncation)]
        let pitch = pitch as f32;
        let (w, h) = self.board_f32();

        let mut pb = PathBuilder::new();
        let mut x = 0.0;
        while x < w {
            pb.move_to(x, 0.0);
            pb.line_to(x, h);
            x += pitch;
        }
        let mut y = 0.0;
        while y < h {
            pb.move_to(0.0, y);
            pb.line_to(w, y);
            y += pitch;
        }
        let Some(path) = pb.finish() else {
            return;
        };

        let mut paint = Paint::default();
        let [r, g, b, a] = GRID_RGBA;
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = true;
        let stroke = Stroke { width: GRID_LINE_WIDTH, ..Stroke::default() };
        self.pixmap.stroke_path(&path, &paint, &stroke, self.base, None);
    }

    // =========================================================================
    // ITEMS
    // =========================================================================

    /// Draw one framed, rotated photo.
    ///
    /// Height is derived from the decoded image, not from any stored value.
    /// The shadow belongs to the frame only; the photo is drawn without one.
    ///
    /// # Errors
    ///
    /// Returns `TooLarge` without drawing when the image cannot be rasterized.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn draw_item(&mut self, item: &Item, image: &DecodedImage) -> Result<(), LoadError> {
        let source = to_pixmap(image)?;
        let w = item.width as f32;
        let h = derive_height(item.width, image.aspect_ratio()) as f32;
        if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
            warn!(item = %item.id, "item has no drawable area");
            return Ok(());
        }

        let center_x = item.x as f32 + w / 2.0;
        let center_y = item.y as f32 + h / 2.0;
        let transform = self
            .base
            .pre_translate(center_x, center_y)
            .pre_concat(Transform::from_rotate(item.rotation as f32));

        self.draw_frame_shadow(w, h, transform);

        let mut frame = Paint::default();
        frame.set_color(Color::WHITE);
        frame.anti_alias = true;
        if let Some(rect) = Rect::from_xywh(-w / 2.0, -h / 2.0, w, h) {
            self.pixmap.fill_rect(rect, &frame, transform, None);
        }

        let border = self.frame_border;
        let inner_w = w - border * 2.0;
        let inner_h = h - border * 2.0;
        if inner_w <= 0.0 || inner_h <= 0.0 {
            return Ok(());
        }
        let photo = transform
            .pre_translate(-w / 2.0 + border, -h / 2.0 + border)
            .pre_scale(inner_w / source.width() as f32, inner_h / source.height() as f32);
        self.pixmap.draw_pixmap(0, 0, source.as_ref(), &image_paint(), photo, None);
        Ok(())
    }

    fn draw_frame_shadow(&mut self, w: f32, h: f32, transform: Transform) {
        let step_alpha = SHADOW_ALPHA / f32::from(SHADOW_STEPS);
        let mut paint = Paint::default();
        paint.set_color(Color::from_rgba(0.0, 0.0, 0.0, step_alpha).unwrap_or(Color::TRANSPARENT));
        paint.anti_alias = true;

        // Widest, faintest layer first; overlap darkens toward the middle.
        for step in 0..SHADOW_STEPS {
            let t = f32::from(step) / f32::from(SHADOW_STEPS);
            let spread = SHADOW_BLUR / 2.0 * (1.0 - 2.0 * t);
            let rect = Rect::from_ltrb(
                -w / 2.0 - spread,
                -h / 2.0 - spread + SHADOW_OFFSET_Y,
                w / 2.0 + spread,
                h / 2.0 + spread + SHADOW_OFFSET_Y,
            );
            if let Some(rect) = rect {
                self.pixmap.fill_rect(rect, &paint, transform, None);
            }
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn board_f32(&self) -> (f32, f32) {
        (self.board.width as f32, self.board.height as f32)
    }
}

/// Pixel size of a `board` rendered at `scale`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn surface_size(board: Size, scale: f32) -> (u32, u32) {
    let to_px = |v: f64| {
        let px = (v * f64::from(scale)).round();
        if px.is_finite() && px > 0.0 { px.min(f64::from(u32::MAX)) as u32 } else { 0 }
    };
    (to_px(board.width), to_px(board.height))
}

fn rgb([r, g, b]: [u8; 3]) -> Color {
    Color::from_rgba8(r, g, b, 255)
}

fn image_paint() -> PixmapPaint {
    PixmapPaint { quality: FilterQuality::Bilinear, ..PixmapPaint::default() }
}

/// Copy decoded RGBA pixels into a premultiplied pixmap.
fn to_pixmap(image: &DecodedImage) -> Result<Pixmap, LoadError> {
    let (width, height) = (image.width(), image.height());
    let too_large = LoadError::TooLarge { width, height };
    if width > MAX_SOURCE_SIDE || height > MAX_SOURCE_SIDE {
        return Err(too_large);
    }
    let mut pixmap = Pixmap::new(width, height).ok_or(too_large)?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels().pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}
