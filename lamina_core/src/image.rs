// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel buffers, shared image views, and paintable canvas images.
//!
//! An [`Image`] is a cheap, clonable handle onto a CPU-side [`Pixmap`].
//! Every clone observes the same pixels, so an image layer holding an
//! [`Image`] sees in-place edits made through the owning [`CanvasImage`]
//! on the next frame without being rebuilt.
//!
//! Each image carries a content *version* that is bumped on every drawing
//! operation. Backends that mirror images into GPU textures compare versions
//! to decide when to re-upload; the CPU copy is the source of truth and
//! survives loss of the GPU context.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, Ref, RefCell, RefMut};
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use tiny_skia::PremultipliedColorU8;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::canvas::Canvas;
use crate::color::Color;
use crate::error::GraphicsError;

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an image's pixel storage.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageId(pub u64);

impl ImageId {
    fn next() -> Self {
        Self(NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({})", self.0)
    }
}

/// A fixed-size RGBA buffer backed by a [`tiny_skia::Pixmap`].
///
/// Pixels are stored premultiplied, row-major, four bytes each.
#[derive(Clone)]
pub struct Pixmap(tiny_skia::Pixmap);

impl Pixmap {
    /// Creates a fully transparent pixmap.
    ///
    /// Returns `None` if either side is zero or the buffer would be too large.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Option<Self> {
        tiny_skia::Pixmap::new(width, height).map(Self)
    }

    /// Wraps existing premultiplied RGBA bytes.
    ///
    /// Returns `None` if `data.len() != width * height * 4` or a side is zero.
    #[must_use]
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let size = tiny_skia::IntSize::from_wh(width, height)?;
        tiny_skia::Pixmap::from_vec(data, size).map(Self)
    }

    /// Width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    /// Height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.0.height()
    }

    /// Row-major premultiplied RGBA bytes.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.0.data()
    }

    /// Row-major premultiplied pixels.
    #[inline]
    #[must_use]
    pub fn pixels(&self) -> &[PremultipliedColorU8] {
        self.0.pixels()
    }

    /// Returns the premultiplied pixel at `(x, y)`, or `None` out of bounds.
    #[inline]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<PremultipliedColorU8> {
        self.0.pixel(x, y)
    }

    /// Returns the un-premultiplied color at `(x, y)`; transparent out of bounds.
    #[must_use]
    pub fn color_at(&self, x: u32, y: u32) -> Color {
        self.pixel(x, y)
            .map_or(Color::TRANSPARENT, |px| Color::from(px.demultiply()))
    }

    /// Fills every pixel with `color`.
    pub fn fill(&mut self, color: Color) {
        self.0.fill(color.into());
    }

    /// The underlying tiny-skia pixmap.
    #[inline]
    #[must_use]
    pub fn as_skia(&self) -> &tiny_skia::Pixmap {
        &self.0
    }

    /// Mutable access to the underlying tiny-skia pixmap.
    #[inline]
    pub fn as_skia_mut(&mut self) -> &mut tiny_skia::Pixmap {
        &mut self.0
    }
}

impl fmt::Debug for Pixmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pixmap")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish_non_exhaustive()
    }
}

struct ImageData {
    id: ImageId,
    width: f64,
    height: f64,
    scale: f64,
    pixels: RefCell<Pixmap>,
    version: Cell<u64>,
}

/// A shared, read-mostly view of image pixels.
///
/// Sizes reported by [`width`](Self::width) and [`height`](Self::height) are
/// logical; the backing [`Pixmap`] is `scale` times larger on high-density
/// displays.
#[derive(Clone)]
pub struct Image(Rc<ImageData>);

impl Image {
    /// Wraps a pixmap whose pixels are `scale` physical pixels per logical unit.
    ///
    /// # Panics
    ///
    /// Panics if `scale` is not positive and finite.
    #[must_use]
    pub fn from_pixmap(pixmap: Pixmap, scale: f64) -> Self {
        assert!(
            scale.is_finite() && scale > 0.0,
            "image scale must be positive, got {scale}"
        );
        Self(Rc::new(ImageData {
            id: ImageId::next(),
            width: f64::from(pixmap.width()) / scale,
            height: f64::from(pixmap.height()) / scale,
            scale,
            pixels: RefCell::new(pixmap),
            version: Cell::new(0),
        }))
    }

    /// Identity shared by every clone of this image.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ImageId {
        self.0.id
    }

    /// Logical width.
    #[inline]
    #[must_use]
    pub fn width(&self) -> f64 {
        self.0.width
    }

    /// Logical height.
    #[inline]
    #[must_use]
    pub fn height(&self) -> f64 {
        self.0.height
    }

    /// Physical pixels per logical unit.
    #[inline]
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.0.scale
    }

    /// Width of the backing pixmap.
    #[must_use]
    pub fn pixel_width(&self) -> u32 {
        self.0.pixels.borrow().width()
    }

    /// Height of the backing pixmap.
    #[must_use]
    pub fn pixel_height(&self) -> u32 {
        self.0.pixels.borrow().height()
    }

    /// Content version, bumped by every drawing operation.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.0.version.get()
    }

    /// Borrows the current pixels.
    ///
    /// # Panics
    ///
    /// Panics if a drawing operation on this image is in progress.
    #[must_use]
    pub fn pixels(&self) -> Ref<'_, Pixmap> {
        self.0.pixels.borrow()
    }

    /// Whether two handles share the same pixel storage.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Copies the current pixels into a new, independent image.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        Self::from_pixmap(self.pixels().clone(), self.scale())
    }

    pub(crate) fn pixels_mut(&self) -> RefMut<'_, Pixmap> {
        self.0.pixels.borrow_mut()
    }

    pub(crate) fn touch(&self) {
        self.0.version.set(self.0.version.get() + 1);
    }
}

/// Images compare equal when they share pixel storage.
impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Image {}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("id", &self.0.id)
            .field("width", &self.0.width)
            .field("height", &self.0.height)
            .field("scale", &self.0.scale)
            .field("version", &self.0.version.get())
            .finish_non_exhaustive()
    }
}

/// A mutable bitmap with a drawing surface.
///
/// Width and height are fixed at creation; only pixel contents change.
#[derive(Debug)]
pub struct CanvasImage {
    image: Image,
}

impl CanvasImage {
    /// Allocates a transparent canvas image of the given logical size.
    ///
    /// The backing pixmap is `ceil(width * scale) x ceil(height * scale)`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::InvalidDimensions`] if either size is not
    /// positive and finite, or if the backing pixmap cannot be allocated.
    /// A non-positive `scale` is treated the same way.
    pub fn new(width: f64, height: f64, scale: f64) -> Result<Self, GraphicsError> {
        check_dimensions(width, height)?;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(GraphicsError::InvalidDimensions { width, height });
        }
        let pixmap = Pixmap::new(physical_extent(width, scale), physical_extent(height, scale))
            .ok_or(GraphicsError::InvalidDimensions { width, height })?;
        let image = Image(Rc::new(ImageData {
            id: ImageId::next(),
            width,
            height,
            scale,
            pixels: RefCell::new(pixmap),
            version: Cell::new(0),
        }));
        Ok(Self { image })
    }

    /// The live image view of this canvas; clones observe later edits.
    #[inline]
    #[must_use]
    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Logical width.
    #[inline]
    #[must_use]
    pub fn width(&self) -> f64 {
        self.image.width()
    }

    /// Logical height.
    #[inline]
    #[must_use]
    pub fn height(&self) -> f64 {
        self.image.height()
    }

    /// Returns a drawing surface for this image.
    #[must_use]
    pub fn canvas(&self) -> Canvas<'_> {
        Canvas::new(&self.image)
    }
}

/// Rejects sizes that are not strictly positive and finite.
pub(crate) fn check_dimensions(width: f64, height: f64) -> Result<(), GraphicsError> {
    if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
        Ok(())
    } else {
        Err(GraphicsError::InvalidDimensions { width, height })
    }
}

/// Number of physical pixels covering `logical` units at `scale`, rounded up.
#[expect(
    clippy::cast_possible_truncation,
    reason = "extents are validated positive and pixmaps are bounded by u32"
)]
#[must_use]
pub fn physical_extent(logical: f64, scale: f64) -> u32 {
    (logical * scale).ceil().min(f64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn canvas_image_reports_requested_size() {
        for &(w, h) in &[(1.0, 1.0), (200.0, 200.0), (17.5, 3.25)] {
            let img = CanvasImage::new(w, h, 1.0).unwrap();
            assert_eq!(img.width(), w);
            assert_eq!(img.height(), h);
        }
    }

    #[test]
    fn non_positive_sizes_rejected() {
        assert_eq!(
            CanvasImage::new(0.0, 10.0, 1.0).unwrap_err(),
            GraphicsError::InvalidDimensions {
                width: 0.0,
                height: 10.0
            }
        );
        assert!(CanvasImage::new(10.0, -1.0, 1.0).is_err());
        assert!(CanvasImage::new(f64::NAN, 1.0, 1.0).is_err());
    }

    #[test]
    fn hidpi_backing_is_scaled() {
        let img = CanvasImage::new(10.5, 4.0, 2.0).unwrap();
        assert_eq!(img.width(), 10.5);
        assert_eq!(img.image().pixel_width(), 21);
        assert_eq!(img.image().pixel_height(), 8);
    }

    #[test]
    fn initial_pixels_are_transparent() {
        let img = CanvasImage::new(4.0, 4.0, 1.0).unwrap();
        assert!(img.image().pixels().data().iter().all(|&b| b == 0));
    }

    #[test]
    fn clones_share_pixels_and_identity() {
        let img = CanvasImage::new(2.0, 2.0, 1.0).unwrap();
        let view = img.image().clone();
        img.canvas().set_fill_color(Color::WHITE).fill_rect(0.0, 0.0, 2.0, 2.0);
        assert!(view.ptr_eq(img.image()));
        assert_eq!(view.id(), img.image().id());
        assert_eq!(view.pixels().color_at(1, 1), Color::WHITE);
        assert!(view.version() > 0);
    }

    #[test]
    fn snapshot_is_independent() {
        let img = CanvasImage::new(2.0, 2.0, 1.0).unwrap();
        let snap = img.image().snapshot();
        img.canvas().set_fill_color(Color::WHITE).fill_rect(0.0, 0.0, 2.0, 2.0);
        assert_ne!(snap.id(), img.image().id());
        assert_eq!(snap.pixels().color_at(0, 0), Color::TRANSPARENT);
    }

    #[test]
    fn pixmap_from_rgba_checks_length() {
        assert!(Pixmap::from_rgba(2, 2, vec![0; 16]).is_some());
        assert!(Pixmap::from_rgba(2, 2, vec![0; 12]).is_none());
        assert!(Pixmap::from_rgba(0, 2, Vec::new()).is_none());
    }

    #[test]
    fn pixmap_reads_back_demultiplied() {
        // Premultiplied half-alpha red.
        let pm = Pixmap::from_rgba(1, 1, vec![128, 0, 0, 128]).unwrap();
        assert_eq!(pm.color_at(0, 0), Color::argb(128, 255, 0, 0));
        assert_eq!(pm.color_at(1, 0), Color::TRANSPARENT);
    }

    #[test]
    fn oversized_canvas_image_is_rejected() {
        assert!(CanvasImage::new(1e12, 1.0, 1.0).is_err());
    }
}
