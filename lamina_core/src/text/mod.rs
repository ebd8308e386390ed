// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fonts, text formats, and immutable text layouts.
//!
//! Font data comes from a [`FontResolver`]. The resolver maps a requested
//! family to an available one (falling back to its default family rather
//! than failing), and supplies metrics, advances, and glyph outlines.
//! [`layout_text`] is a pure function of its inputs: it never touches a
//! canvas, and the resulting [`TextLayout`] owns everything needed to render
//! it, so it outlives the format and resolver that produced it.
//!
//! With the `skrifa` feature, `SkrifaFonts` resolves against real OpenType
//! data instead of the synthetic [`FallbackFonts`].

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use kurbo::{BezPath, Rect, Shape};

#[cfg(feature = "skrifa")]
mod opentype;

#[cfg(feature = "skrifa")]
pub use opentype::SkrifaFonts;

/// Font weight and slant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontStyle {
    /// Regular weight, upright.
    #[default]
    Plain,
    /// Bold weight, upright.
    Bold,
    /// Regular weight, slanted.
    Italic,
    /// Bold weight, slanted.
    BoldItalic,
}

impl FontStyle {
    /// Whether this style is bold.
    #[must_use]
    pub const fn is_bold(self) -> bool {
        matches!(self, Self::Bold | Self::BoldItalic)
    }

    /// Whether this style is slanted.
    #[must_use]
    pub const fn is_italic(self) -> bool {
        matches!(self, Self::Italic | Self::BoldItalic)
    }
}

/// A resolved font: requested name, the family actually used, style and size.
#[derive(Clone, Debug, PartialEq)]
pub struct Font {
    name: String,
    family: String,
    style: FontStyle,
    size: f64,
}

impl Font {
    /// Resolves `name` through `resolver`, falling back to its default family.
    #[must_use]
    pub fn resolve(resolver: &dyn FontResolver, name: &str, style: FontStyle, size: f64) -> Self {
        let family = match resolver.resolve_family(name, style) {
            Some(family) => family,
            None => {
                let fallback = resolver.default_family();
                log::debug!("font family {name:?} unavailable, using {fallback:?}");
                fallback.to_string()
            }
        };
        Self {
            name: name.to_string(),
            family,
            style,
            size: clamp_size(size),
        }
    }

    /// The family name that was requested.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The family that will be used for metrics and rendering.
    #[must_use]
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Whether the requested family was unavailable.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        !self.family.eq_ignore_ascii_case(&self.name)
    }

    /// Style.
    #[must_use]
    pub fn style(&self) -> FontStyle {
        self.style
    }

    /// Size in logical units.
    #[must_use]
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Returns a copy of this font at a different size.
    ///
    /// Sizes that are not positive and finite become `0`, as in
    /// [`resolve`](Self::resolve).
    #[must_use]
    pub fn derive(&self, size: f64) -> Self {
        Self {
            size: clamp_size(size),
            ..self.clone()
        }
    }
}

fn clamp_size(size: f64) -> f64 {
    if size.is_finite() && size > 0.0 { size } else { 0.0 }
}

/// Vertical metrics of a font, in logical units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FontMetrics {
    /// Distance from the baseline to the top of the tallest glyphs.
    pub ascent: f64,
    /// Distance from the baseline to the bottom of the lowest glyphs.
    pub descent: f64,
    /// Extra spacing between lines.
    pub leading: f64,
}

impl FontMetrics {
    /// Distance between consecutive baselines.
    #[must_use]
    pub fn line_height(&self) -> f64 {
        self.ascent + self.descent + self.leading
    }
}

/// Source of font data for layout and rendering.
pub trait FontResolver {
    /// Maps a requested family to an available family, or `None` if no
    /// acceptable match exists.
    fn resolve_family(&self, name: &str, style: FontStyle) -> Option<String>;

    /// Family used when a requested family cannot be resolved.
    fn default_family(&self) -> &str;

    /// Vertical metrics for `font`.
    fn metrics(&self, font: &Font) -> FontMetrics;

    /// Horizontal advance of `ch` in `font`.
    fn advance(&self, font: &Font, ch: char) -> f64;

    /// Outline of `ch`, positioned with its origin on the baseline at the
    /// start of its advance. `None` for glyphs with no ink.
    fn glyph_outline(&self, font: &Font, ch: char) -> Option<BezPath>;
}

/// Built-in resolver with generic families and synthetic metrics.
///
/// Known families are `sans-serif`, `serif` and `monospace` plus common
/// aliases (`Helvetica`, `Arial`, `Times`, `Courier`, ...), matched without
/// regard to ASCII case. Anything else falls back to `sans-serif`. Glyphs are
/// drawn as missing-glyph boxes.
#[derive(Clone, Copy, Debug, Default)]
pub struct FallbackFonts;

const FAMILIES: &[(&str, &[&str])] = &[
    ("sans-serif", &["sans", "helvetica", "arial", "verdana"]),
    ("serif", &["times", "times new roman", "georgia"]),
    ("monospace", &["mono", "courier", "courier new", "menlo"]),
];

impl FontResolver for FallbackFonts {
    fn resolve_family(&self, name: &str, _style: FontStyle) -> Option<String> {
        FAMILIES
            .iter()
            .find(|(family, aliases)| {
                family.eq_ignore_ascii_case(name)
                    || aliases.iter().any(|alias| alias.eq_ignore_ascii_case(name))
            })
            .map(|(family, _)| (*family).to_string())
    }

    fn default_family(&self) -> &str {
        "sans-serif"
    }

    fn metrics(&self, font: &Font) -> FontMetrics {
        let size = font.size();
        FontMetrics {
            ascent: size * 0.8,
            descent: size * 0.2,
            leading: size * 0.1,
        }
    }

    fn advance(&self, font: &Font, ch: char) -> f64 {
        let size = font.size();
        let em = if font.family() == "monospace" {
            0.6
        } else {
            match ch {
                ' ' => 0.3,
                'i' | 'j' | 'l' | 'I' | '.' | ',' | ':' | ';' | '\'' | '!' | '|' => 0.28,
                'm' | 'w' | 'M' | 'W' => 0.83,
                c if c.is_ascii_uppercase() => 0.68,
                _ => 0.55,
            }
        };
        let weight = if font.style().is_bold() { 1.05 } else { 1.0 };
        size * em * weight
    }

    fn glyph_outline(&self, font: &Font, ch: char) -> Option<BezPath> {
        if ch.is_whitespace() || ch.is_control() {
            return None;
        }
        let advance = self.advance(font, ch);
        let size = font.size();
        let tofu = Rect::new(advance * 0.1, -size * 0.7, advance * 0.9, 0.0);
        Some(tofu.to_path(0.1))
    }
}

/// Horizontal alignment of lines within a layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextAlign {
    /// Flush left.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Flush right.
    Right,
}

/// Parameters controlling text layout.
#[derive(Clone, Debug, PartialEq)]
pub struct TextFormat {
    /// Font used for every glyph.
    pub font: Font,
    /// Lines wider than this are wrapped at word boundaries.
    pub wrap_width: Option<f64>,
    /// Alignment of each line within the layout width.
    pub align: TextAlign,
}

impl TextFormat {
    /// Creates an unwrapped, left-aligned format.
    #[must_use]
    pub fn new(font: Font) -> Self {
        Self {
            font,
            wrap_width: None,
            align: TextAlign::Left,
        }
    }

    /// Sets the wrap width.
    #[must_use]
    pub fn with_wrap_width(mut self, width: f64) -> Self {
        self.wrap_width = Some(width);
        self
    }

    /// Sets the alignment.
    #[must_use]
    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }
}

/// One positioned glyph within a [`TextLine`].
#[derive(Clone, Debug, PartialEq)]
pub struct Glyph {
    /// Source character.
    pub ch: char,
    /// Offset from the start of the line.
    pub x: f64,
    /// Horizontal advance.
    pub advance: f64,
    /// Outline relative to the glyph origin on the baseline.
    pub outline: Option<BezPath>,
}

/// One laid-out line.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLine {
    /// Text of the line, without the break that ended it.
    pub text: String,
    /// Left edge of the line after alignment.
    pub x: f64,
    /// Baseline position from the top of the layout.
    pub baseline: f64,
    /// Advance width, excluding trailing spaces.
    pub width: f64,
    /// Positioned glyphs.
    pub glyphs: Vec<Glyph>,
}

/// Immutable result of laying out text under a [`TextFormat`].
#[derive(Clone, Debug, PartialEq)]
pub struct TextLayout {
    lines: Vec<TextLine>,
    width: f64,
    height: f64,
    metrics: FontMetrics,
}

impl TextLayout {
    /// Laid-out lines, top to bottom.
    #[must_use]
    pub fn lines(&self) -> &[TextLine] {
        &self.lines
    }

    /// Number of lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Layout width: the wrap width if set, else the widest line.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Total height of all lines.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Sum of the advance widths of all lines.
    #[must_use]
    pub fn total_advance(&self) -> f64 {
        self.lines.iter().map(|l| l.width).sum()
    }

    /// Vertical metrics of the font used.
    #[must_use]
    pub fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    /// Bounds of the layout relative to its origin.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

/// Lays out `text` under `format`.
///
/// Lines break at `'\n'` and, when a wrap width is set, at the last space
/// that keeps the line within it. A single word wider than the wrap width
/// occupies its own line.
#[must_use]
pub fn layout_text(resolver: &dyn FontResolver, text: &str, format: &TextFormat) -> TextLayout {
    let font = &format.font;
    let metrics = resolver.metrics(font);
    let wrap = format.wrap_width.filter(|w| w.is_finite() && *w > 0.0);

    let mut raw_lines: Vec<(String, Vec<Glyph>, f64)> = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut glyphs: Vec<Glyph> = Vec::new();
        let mut pen = 0.0;
        for word in split_keeping_spaces(paragraph) {
            let ink_width = trimmed_width(resolver, font, word);
            if let Some(limit) = wrap
                && !line.is_empty()
                && pen + ink_width > limit
            {
                let width = line_ink_width(&glyphs);
                raw_lines.push((core::mem::take(&mut line), core::mem::take(&mut glyphs), width));
                pen = 0.0;
            }
            for ch in word.chars() {
                let advance = resolver.advance(font, ch);
                glyphs.push(Glyph {
                    ch,
                    x: pen,
                    advance,
                    outline: resolver.glyph_outline(font, ch),
                });
                pen += advance;
            }
            line.push_str(word);
        }
        let width = line_ink_width(&glyphs);
        raw_lines.push((line, glyphs, width));
    }

    let widest = raw_lines.iter().map(|(_, _, w)| *w).fold(0.0, f64::max);
    let layout_width = wrap.unwrap_or(widest);
    let line_height = metrics.line_height();
    let lines = raw_lines
        .into_iter()
        .enumerate()
        .map(|(i, (text, glyphs, width))| {
            let x = match format.align {
                TextAlign::Left => 0.0,
                TextAlign::Center => (layout_width - width) / 2.0,
                TextAlign::Right => layout_width - width,
            };
            let baseline = i as f64 * line_height + metrics.ascent;
            TextLine {
                text,
                x,
                baseline,
                width,
                glyphs,
            }
        })
        .collect::<Vec<_>>();
    let height = lines.len() as f64 * line_height;
    TextLayout {
        lines,
        width: layout_width,
        height,
        metrics,
    }
}

/// Splits into words, each carrying its trailing spaces.
fn split_keeping_spaces(s: &str) -> impl Iterator<Item = &str> {
    let mut rest = s;
    core::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let word_end = rest.find(' ').unwrap_or(rest.len());
        let space_end = rest[word_end..]
            .find(|c: char| c != ' ')
            .map_or(rest.len(), |i| word_end + i);
        let (word, tail) = rest.split_at(space_end);
        rest = tail;
        Some(word)
    })
}

fn trimmed_width(resolver: &dyn FontResolver, font: &Font, word: &str) -> f64 {
    word.trim_end_matches(' ')
        .chars()
        .map(|c| resolver.advance(font, c))
        .sum()
}

fn line_ink_width(glyphs: &[Glyph]) -> f64 {
    glyphs
        .iter()
        .rev()
        .find(|g| g.ch != ' ')
        .map_or(0.0, |g| g.x + g.advance)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font(name: &str, size: f64) -> Font {
        Font::resolve(&FallbackFonts, name, FontStyle::Plain, size)
    }

    #[test]
    fn known_family_resolves() {
        let f = font("Helvetica", 12.0);
        assert_eq!(f.family(), "sans-serif");
        assert_eq!(f.name(), "Helvetica");
        let f = font("MONOSPACE", 12.0);
        assert_eq!(f.family(), "monospace");
        assert!(!f.is_fallback());
    }

    #[test]
    fn unknown_family_falls_back() {
        let f = font("Comic Neue Extra", 10.0);
        assert_eq!(f.family(), "sans-serif");
        assert!(f.is_fallback());
    }

    #[test]
    fn derive_clamps_size_like_resolve() {
        let f = font("serif", 12.0);
        assert_eq!(f.derive(18.0).size(), 18.0);
        assert_eq!(f.derive(18.0).family(), "serif");
        for bad in [-3.0, f64::NAN, f64::INFINITY] {
            assert_eq!(f.derive(bad).size(), 0.0);
            assert_eq!(font("serif", bad).size(), 0.0);
        }
    }

    #[test]
    fn layout_is_deterministic() {
        let format = TextFormat::new(font("serif", 16.0));
        let a = layout_text(&FallbackFonts, "Hi", &format);
        let b = layout_text(&FallbackFonts, "Hi", &format);
        assert_eq!(a.line_count(), b.line_count());
        assert_eq!(a.total_advance(), b.total_advance());
        assert_eq!(a, b);
    }

    #[test]
    fn monospace_width() {
        let format = TextFormat::new(font("monospace", 10.0));
        let layout = layout_text(&FallbackFonts, "abcd", &format);
        assert_eq!(layout.line_count(), 1);
        assert!((layout.width() - 24.0).abs() < 1e-9);
    }

    #[test]
    fn newlines_split_lines() {
        let format = TextFormat::new(font("monospace", 10.0));
        let layout = layout_text(&FallbackFonts, "ab\ncd\n", &format);
        assert_eq!(layout.line_count(), 3);
        assert_eq!(layout.lines()[1].text, "cd");
        assert!(layout.lines()[2].glyphs.is_empty());
        let lh = FallbackFonts.metrics(&format.font).line_height();
        assert!((layout.height() - 3.0 * lh).abs() < 1e-9);
    }

    #[test]
    fn wraps_at_word_boundaries() {
        // Monospace at size 10: every glyph advances 6.
        let format = TextFormat::new(font("monospace", 10.0)).with_wrap_width(40.0);
        let layout = layout_text(&FallbackFonts, "aaa bbb ccc", &format);
        let texts: Vec<&str> = layout.lines().iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["aaa ", "bbb ", "ccc"]);
        assert!(layout.lines().iter().all(|l| (l.width - 18.0).abs() < 1e-9));
        assert_eq!(layout.width(), 40.0);
    }

    #[test]
    fn long_word_keeps_own_line() {
        let format = TextFormat::new(font("monospace", 10.0)).with_wrap_width(10.0);
        let layout = layout_text(&FallbackFonts, "abcdef g", &format);
        assert_eq!(layout.line_count(), 2);
        assert_eq!(layout.lines()[0].text, "abcdef ");
    }

    #[test]
    fn alignment_offsets_lines() {
        let format = TextFormat::new(font("monospace", 10.0))
            .with_wrap_width(60.0)
            .with_align(TextAlign::Right);
        let layout = layout_text(&FallbackFonts, "ab", &format);
        assert!((layout.lines()[0].x - 48.0).abs() < 1e-9);
        let centered = layout_text(&FallbackFonts, "ab", &format.with_align(TextAlign::Center));
        assert!((centered.lines()[0].x - 24.0).abs() < 1e-9);
    }

    #[test]
    fn whitespace_has_no_outline() {
        let format = TextFormat::new(font("sans-serif", 10.0));
        let layout = layout_text(&FallbackFonts, "a b", &format);
        let glyphs = &layout.lines()[0].glyphs;
        assert!(glyphs[0].outline.is_some());
        assert!(glyphs[1].outline.is_none());
    }
}
