// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A [`FontResolver`] over OpenType data, read with skrifa.
//!
//! Faces are registered from raw font bytes (single fonts or collections).
//! Family names and style come from each face's `name` table and
//! attributes. Metrics, advances and outlines are read at the requested size
//! in the default variation location, unhinted.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use kurbo::BezPath;
use skrifa::instance::{LocationRef, Size};
use skrifa::outline::OutlinePen;
use skrifa::raw::FileRef;
use skrifa::string::StringId;
use skrifa::{FontRef, GlyphId, MetadataProvider};

use super::{Font, FontMetrics, FontResolver, FontStyle};
use crate::error::GraphicsError;

struct Face {
    family: String,
    style: FontStyle,
    data: Vec<u8>,
    index: u32,
}

impl core::fmt::Debug for Face {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Face")
            .field("family", &self.family)
            .field("style", &self.style)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

/// Fonts loaded from OpenType files.
///
/// The family of the first registered face is the default family.
#[derive(Debug)]
pub struct SkrifaFonts {
    faces: Vec<Face>,
}

impl SkrifaFonts {
    /// Creates a resolver from one font file or collection.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidFont`] if `data` holds no readable face.
    pub fn new(data: Vec<u8>) -> Result<Self, GraphicsError> {
        let mut fonts = Self { faces: Vec::new() };
        fonts.add_font(data)?;
        Ok(fonts)
    }

    /// Registers every face in a font file or collection.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidFont`] if `data` holds no readable face. The
    /// resolver is unchanged on error.
    pub fn add_font(&mut self, data: Vec<u8>) -> Result<(), GraphicsError> {
        let described: Vec<(u32, String, FontStyle)> = match FileRef::new(&data) {
            Ok(FileRef::Font(font)) => describe(&font).map(|(f, s)| (0, f, s)).into_iter().collect(),
            Ok(FileRef::Collection(collection)) => (0..collection.len())
                .filter_map(|i| {
                    let font = collection.get(i).ok()?;
                    describe(&font).map(|(f, s)| (i, f, s))
                })
                .collect(),
            Err(_) => Vec::new(),
        };
        if described.is_empty() {
            return Err(GraphicsError::InvalidFont);
        }
        for (index, family, style) in described {
            log::debug!("registered font face {family:?} {style:?} (index {index})");
            self.faces.push(Face {
                family,
                style,
                data: data.clone(),
                index,
            });
        }
        Ok(())
    }

    /// Registered family names, in registration order, without duplicates.
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.faces
            .iter()
            .enumerate()
            .filter(|(i, face)| {
                !self.faces[..*i]
                    .iter()
                    .any(|earlier| earlier.family == face.family)
            })
            .map(|(_, face)| face.family.as_str())
    }

    fn face_for(&self, font: &Font) -> Option<FontRef<'_>> {
        let candidates = self.faces.iter().map(|f| (f.family.as_str(), f.style));
        let face = &self.faces[pick_face(candidates, font.family(), font.style())?];
        FontRef::from_index(&face.data, face.index).ok()
    }
}

impl FontResolver for SkrifaFonts {
    fn resolve_family(&self, name: &str, _style: FontStyle) -> Option<String> {
        self.faces
            .iter()
            .find(|face| face.family.eq_ignore_ascii_case(name))
            .map(|face| face.family.clone())
    }

    fn default_family(&self) -> &str {
        // Construction guarantees at least one face.
        self.faces.first().map_or("", |face| face.family.as_str())
    }

    fn metrics(&self, font: &Font) -> FontMetrics {
        let Some(face) = self.face_for(font) else {
            return FontMetrics::default();
        };
        let m = face.metrics(size(font), LocationRef::default());
        FontMetrics {
            ascent: f64::from(m.ascent),
            // OpenType descent is negative below the baseline.
            descent: -f64::from(m.descent),
            leading: f64::from(m.leading),
        }
    }

    fn advance(&self, font: &Font, ch: char) -> f64 {
        let Some(face) = self.face_for(font) else {
            return 0.0;
        };
        let glyph = face.charmap().map(ch).unwrap_or_default();
        let advance = face
            .glyph_metrics(size(font), LocationRef::default())
            .advance_width(glyph)
            .unwrap_or_default();
        f64::from(advance)
    }

    fn glyph_outline(&self, font: &Font, ch: char) -> Option<BezPath> {
        if ch.is_control() {
            return None;
        }
        let face = self.face_for(font)?;
        let glyph: GlyphId = face.charmap().map(ch).unwrap_or_default();
        let outline = face.outline_glyphs().get(glyph)?;
        let mut pen = BaselinePen::default();
        outline.draw(size(font), &mut pen).ok()?;
        pen.finish()
    }
}

/// Family name and style of one face, or `None` if it has no family name.
fn describe(font: &FontRef<'_>) -> Option<(String, FontStyle)> {
    let family = font
        .localized_strings(StringId::FAMILY_NAME)
        .english_or_first()?
        .to_string();
    let attributes = font.attributes();
    let bold = attributes.weight.value() >= 600.0;
    let italic = attributes.style != skrifa::attribute::Style::Normal;
    let style = match (bold, italic) {
        (false, false) => FontStyle::Plain,
        (true, false) => FontStyle::Bold,
        (false, true) => FontStyle::Italic,
        (true, true) => FontStyle::BoldItalic,
    };
    Some((family, style))
}

/// Index of the face to use for `family` in `style`: an exact style match if
/// there is one, else the family's first face.
fn pick_face<'a>(
    faces: impl Iterator<Item = (&'a str, FontStyle)>,
    family: &str,
    style: FontStyle,
) -> Option<usize> {
    let mut first = None;
    for (i, (name, face_style)) in faces.enumerate() {
        if !name.eq_ignore_ascii_case(family) {
            continue;
        }
        if face_style == style {
            return Some(i);
        }
        first.get_or_insert(i);
    }
    first
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "font sizes are far inside f32 range"
)]
fn size(font: &Font) -> Size {
    Size::new(font.size() as f32)
}

/// Collects an outline into a kurbo path with y pointing down, so the
/// origin sits on the baseline and ink above it has negative y.
#[derive(Default)]
struct BaselinePen {
    path: BezPath,
}

impl BaselinePen {
    fn finish(self) -> Option<BezPath> {
        (!self.path.elements().is_empty()).then_some(self.path)
    }
}

impl OutlinePen for BaselinePen {
    fn move_to(&mut self, x: f32, y: f32) {
        self.path.move_to((f64::from(x), -f64::from(y)));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.path.line_to((f64::from(x), -f64::from(y)));
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.path.quad_to(
            (f64::from(cx0), -f64::from(cy0)),
            (f64::from(x), -f64::from(y)),
        );
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.path.curve_to(
            (f64::from(cx0), -f64::from(cy0)),
            (f64::from(cx1), -f64::from(cy1)),
            (f64::from(x), -f64::from(y)),
        );
    }

    fn close(&mut self) {
        self.path.close_path();
    }
}
