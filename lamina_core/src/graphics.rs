// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`Graphics`] orchestrator.
//!
//! One `Graphics` value exists per drawable surface. The platform creates it
//! at startup from a [`GraphicsConfig`], keeps it for the lifetime of the
//! surface, and passes it (or a reference) to application code. Nothing here
//! is global, so tests build an isolated instance each.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::Size;

use crate::backend::{DrawContext, Gl20Handle, GlContextHandle};
use crate::color::Color;
use crate::config::{ClipNesting, GraphicsConfig};
use crate::error::GraphicsError;
use crate::gradient::Gradient;
use crate::image::{CanvasImage, Image, check_dimensions};
use crate::layer::{ImmediateRenderer, LayerId, LayerKind, LayerStore};
use crate::text::{FallbackFonts, Font, FontResolver, FontStyle, TextFormat, TextLayout, layout_text};
use crate::trace::{FrameBeginEvent, FrameSummary, TraceSink, Tracer};

/// Conditions reported to [`GraphicsListener`]s.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphicsEvent {
    /// The drawable surface was resized.
    SizeChanged {
        /// New width.
        width: u32,
        /// New height.
        height: u32,
    },
    /// The GPU context was lost; GPU-side textures are gone.
    ContextLost,
    /// A GPU context is available again; textures must be re-uploaded from
    /// CPU-side image pixels.
    ContextRestored,
}

/// Receives [`GraphicsEvent`]s.
pub trait GraphicsListener {
    /// Called synchronously when the event happens.
    fn on_event(&mut self, event: &GraphicsEvent);
}

impl<F> GraphicsListener for F
where
    F: FnMut(&GraphicsEvent),
{
    fn on_event(&mut self, event: &GraphicsEvent) {
        self(event);
    }
}

/// Owns the layer tree of one surface and creates everything drawn in it.
pub struct Graphics {
    config: GraphicsConfig,
    layers: LayerStore,
    root: LayerId,
    fonts: Box<dyn FontResolver>,
    width: u32,
    height: u32,
    frame_index: u64,
    context_lost: bool,
    listeners: Vec<Box<dyn GraphicsListener>>,
}

impl fmt::Debug for Graphics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graphics")
            .field("config", &self.config)
            .field("root", &self.root)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("frame_index", &self.frame_index)
            .field("context_lost", &self.context_lost)
            .field("layers", &self.layers.layer_count())
            .finish_non_exhaustive()
    }
}

impl Graphics {
    /// Creates the orchestrator with an empty root group layer.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidDimensions`] if the configuration has a zero
    /// size or a non-positive scale factor.
    pub fn new(config: GraphicsConfig) -> Result<Self, GraphicsError> {
        config.validate()?;
        let mut layers = LayerStore::new();
        let root = layers.create_layer(LayerKind::Group { clip: None });
        Ok(Self {
            config,
            layers,
            root,
            fonts: Box::new(FallbackFonts),
            width: config.width,
            height: config.height,
            frame_index: 0,
            context_lost: false,
            listeners: Vec::new(),
        })
    }

    /// Replaces the font resolver used by [`create_font`](Self::create_font)
    /// and [`layout_text`](Self::layout_text).
    #[must_use]
    pub fn with_font_resolver(mut self, resolver: impl FontResolver + 'static) -> Self {
        self.fonts = Box::new(resolver);
        self
    }

    /// The configuration this instance was created with.
    #[must_use]
    pub fn config(&self) -> &GraphicsConfig {
        &self.config
    }

    // -- Layer tree --

    /// The root group layer. Only layers reachable from it are painted.
    #[must_use]
    pub fn root_layer(&self) -> LayerId {
        self.root
    }

    /// The layer store, for reading properties.
    #[must_use]
    pub fn layers(&self) -> &LayerStore {
        &self.layers
    }

    /// The layer store, for setting properties.
    ///
    /// Only property setters are reachable here. Creating, attaching,
    /// detaching and destroying layers goes through `Graphics`, so the clip
    /// nesting policy and the root guard cannot be skipped:
    ///
    /// ```compile_fail
    /// # use lamina_core::{Graphics, GraphicsConfig};
    /// let mut g = Graphics::new(GraphicsConfig::desktop()).unwrap();
    /// let root = g.root_layer();
    /// g.layers_mut().destroy_layer(root);
    /// ```
    pub fn layers_mut(&mut self) -> &mut LayerStore {
        &mut self.layers
    }

    /// Attaches `child` under `parent`, in depth order.
    ///
    /// If `child` already has a parent it is detached from it first.
    ///
    /// # Errors
    ///
    /// - [`GraphicsError::NotAGroup`] if `parent` is not a group layer.
    /// - [`GraphicsError::CyclicGraph`] if `parent` is `child` or one of its
    ///   descendants.
    /// - [`GraphicsError::UnsupportedNesting`] under [`ClipNesting::Reject`]
    ///   when a clip-bearing layer would end up inside another.
    ///
    /// On error the tree is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn add_child(&mut self, parent: LayerId, child: LayerId) -> Result<(), GraphicsError> {
        self.check_nesting(parent, child)?;
        self.layers.add_child(parent, child)
    }

    /// Attaches `child` under `parent` at sibling position `index`.
    ///
    /// # Errors
    ///
    /// As [`add_child`](Self::add_child).
    pub fn insert_child(
        &mut self,
        parent: LayerId,
        index: usize,
        child: LayerId,
    ) -> Result<(), GraphicsError> {
        self.check_nesting(parent, child)?;
        self.layers.insert_child(parent, index, child)
    }

    /// Detaches `child` from its parent, returning the former parent.
    pub fn remove_from_parent(&mut self, child: LayerId) -> Option<LayerId> {
        self.layers.remove_from_parent(child)
    }

    /// Detaches every child of `parent`. The children stay alive.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is stale.
    pub fn remove_all(&mut self, parent: LayerId) {
        self.layers.remove_all(parent);
    }

    /// Destroys a layer, detaching its children.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale or is the root layer.
    pub fn destroy_layer(&mut self, id: LayerId) {
        assert!(id != self.root, "the root layer cannot be destroyed");
        self.layers.destroy_layer(id);
    }

    fn check_nesting(&self, parent: LayerId, child: LayerId) -> Result<(), GraphicsError> {
        if self.config.clip_nesting == ClipNesting::Reject
            && self.layers.would_nest_clip(parent, child)
        {
            return Err(GraphicsError::UnsupportedNesting);
        }
        Ok(())
    }

    // -- Layer factories --

    /// Creates an empty, unclipped group layer.
    pub fn create_group_layer(&mut self) -> LayerId {
        self.layers.create_layer(LayerKind::Group { clip: None })
    }

    /// Creates a group layer clipped to `[0, width) x [0, height)` in its
    /// local space. The clip is fixed for the layer's lifetime and is not
    /// affected by [`set_size`](Self::set_size).
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidDimensions`] for non-positive sizes.
    pub fn create_clipped_group_layer(
        &mut self,
        width: f64,
        height: f64,
    ) -> Result<LayerId, GraphicsError> {
        check_dimensions(width, height)?;
        Ok(self.layers.create_layer(LayerKind::Group {
            clip: Some(Size::new(width, height)),
        }))
    }

    /// Creates an image layer with no image.
    pub fn create_image_layer(&mut self) -> LayerId {
        self.layers.create_layer(LayerKind::Image { image: None })
    }

    /// Creates an image layer drawing `image`.
    pub fn create_image_layer_with(&mut self, image: Image) -> LayerId {
        self.layers.create_layer(LayerKind::Image { image: Some(image) })
    }

    /// Creates a layer that calls `renderer` every frame.
    pub fn create_immediate_layer(&mut self, renderer: impl ImmediateRenderer + 'static) -> LayerId {
        self.layers.create_layer(LayerKind::Immediate {
            renderer: Box::new(renderer),
            clip: None,
        })
    }

    /// Creates an immediate layer clipped to `[0, width) x [0, height)`.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidDimensions`] for non-positive sizes.
    pub fn create_clipped_immediate_layer(
        &mut self,
        width: f64,
        height: f64,
        renderer: impl ImmediateRenderer + 'static,
    ) -> Result<LayerId, GraphicsError> {
        check_dimensions(width, height)?;
        Ok(self.layers.create_layer(LayerKind::Immediate {
            renderer: Box::new(renderer),
            clip: Some(Size::new(width, height)),
        }))
    }

    /// Creates a layer backed by a persistent offscreen canvas of the given
    /// logical size. Draw on it via [`LayerStore::surface`].
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidDimensions`] for non-positive sizes.
    pub fn create_surface_layer(&mut self, width: f64, height: f64) -> Result<LayerId, GraphicsError> {
        let surface = CanvasImage::new(width, height, self.config.scale_factor)?;
        Ok(self.layers.create_layer(LayerKind::Surface { surface }))
    }

    // -- Value factories --

    /// Allocates a transparent canvas image of the given logical size,
    /// backed at the surface's scale factor.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidDimensions`] for non-positive sizes.
    pub fn create_image(&self, width: f64, height: f64) -> Result<CanvasImage, GraphicsError> {
        CanvasImage::new(width, height, self.config.scale_factor)
    }

    /// Creates a linear gradient from `(x0, y0)` to `(x1, y1)`.
    ///
    /// # Errors
    ///
    /// See [`Gradient::linear`].
    pub fn create_linear_gradient(
        &self,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        colors: &[Color],
        positions: &[f32],
    ) -> Result<Gradient, GraphicsError> {
        Gradient::linear(x0, y0, x1, y1, colors, positions)
    }

    /// Creates a radial gradient centered on `(x, y)` with radius `r`.
    ///
    /// # Errors
    ///
    /// See [`Gradient::radial`].
    pub fn create_radial_gradient(
        &self,
        x: f64,
        y: f64,
        r: f64,
        colors: &[Color],
        positions: &[f32],
    ) -> Result<Gradient, GraphicsError> {
        Gradient::radial(x, y, r, colors, positions)
    }

    /// Resolves a font, falling back to the resolver's default family when
    /// `name` is unavailable.
    #[must_use]
    pub fn create_font(&self, name: &str, style: FontStyle, size: f64) -> Font {
        Font::resolve(&*self.fonts, name, style, size)
    }

    /// Lays out `text`. Pure: no canvas or layer is touched.
    #[must_use]
    pub fn layout_text(&self, text: &str, format: &TextFormat) -> TextLayout {
        layout_text(&*self.fonts, text, format)
    }

    /// The font resolver in use.
    #[must_use]
    pub fn font_resolver(&self) -> &dyn FontResolver {
        &*self.fonts
    }

    // -- Surface queries --

    /// Width of the whole display.
    #[must_use]
    pub fn screen_width(&self) -> u32 {
        self.config.screen_width
    }

    /// Height of the whole display.
    #[must_use]
    pub fn screen_height(&self) -> u32 {
        self.config.screen_height
    }

    /// Current width of the drawable surface.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Current height of the drawable surface.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Resizes the drawable surface and notifies listeners.
    ///
    /// Already-created clipped layers keep their clip sizes.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidDimensions`] if either size is zero.
    pub fn set_size(&mut self, width: u32, height: u32) -> Result<(), GraphicsError> {
        if width == 0 || height == 0 {
            return Err(GraphicsError::InvalidDimensions {
                width: f64::from(width),
                height: f64::from(height),
            });
        }
        if (width, height) != (self.width, self.height) {
            self.width = width;
            self.height = height;
            log::debug!("surface resized to {width}x{height}");
            self.emit(GraphicsEvent::SizeChanged { width, height });
        }
        Ok(())
    }

    /// Physical pixels per logical unit.
    #[must_use]
    pub fn scale_factor(&self) -> f64 {
        self.config.scale_factor
    }

    // -- Backend handles --

    /// The GL 2.0 handle, or `None` on software backends and while the
    /// context is lost.
    #[must_use]
    pub fn gl20(&self) -> Option<Gl20Handle> {
        self.gl_handles().map(|(gl20, _)| gl20)
    }

    /// The GL context handle, or `None` on software backends and while the
    /// context is lost.
    #[must_use]
    pub fn ctx(&self) -> Option<GlContextHandle> {
        self.gl_handles().map(|(_, context)| context)
    }

    /// Like [`gl20`](Self::gl20), as a `Result`.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::BackendUnavailable`] when there is no GL handle.
    pub fn try_gl20(&self) -> Result<Gl20Handle, GraphicsError> {
        self.gl20().ok_or(GraphicsError::BackendUnavailable)
    }

    /// Like [`ctx`](Self::ctx), as a `Result`.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::BackendUnavailable`] when there is no GL context.
    pub fn try_ctx(&self) -> Result<GlContextHandle, GraphicsError> {
        self.ctx().ok_or(GraphicsError::BackendUnavailable)
    }

    fn gl_handles(&self) -> Option<(Gl20Handle, GlContextHandle)> {
        if self.context_lost {
            return None;
        }
        self.config.backend.gl_handles()
    }

    /// Whether the GPU context is currently lost.
    #[must_use]
    pub fn is_context_lost(&self) -> bool {
        self.context_lost
    }

    // -- Events --

    /// Registers a listener for [`GraphicsEvent`]s.
    pub fn add_listener(&mut self, listener: impl GraphicsListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Called by the platform when the GPU context is lost.
    ///
    /// Nothing is recovered automatically. CPU-side image pixels survive;
    /// GPU texture caches must be dropped and rebuilt from them once the
    /// context is restored.
    pub fn notify_context_lost(&mut self) {
        if !self.context_lost {
            self.context_lost = true;
            log::warn!("graphics context lost at frame {}", self.frame_index);
            self.emit(GraphicsEvent::ContextLost);
        }
    }

    /// Called by the platform when a GPU context is available again.
    pub fn notify_context_restored(&mut self) {
        if self.context_lost {
            self.context_lost = false;
            log::info!("graphics context restored at frame {}", self.frame_index);
            self.emit(GraphicsEvent::ContextRestored);
        }
    }

    fn emit(&mut self, event: GraphicsEvent) {
        for listener in &mut self.listeners {
            listener.on_event(&event);
        }
    }

    // -- Frames --

    /// Number of frames painted so far.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Evaluates the layer tree and composites it into `ctx`.
    ///
    /// Immediate layer callbacks run synchronously inside this call.
    pub fn paint(&mut self, ctx: &mut dyn DrawContext) -> FrameSummary {
        self.paint_with(ctx, Tracer::none())
    }

    /// Like [`paint`](Self::paint), reporting trace events to `sink`.
    ///
    /// Events are only delivered when the `trace` feature is enabled.
    pub fn paint_traced(&mut self, ctx: &mut dyn DrawContext, sink: &mut dyn TraceSink) -> FrameSummary {
        self.paint_with(ctx, Tracer::new(sink))
    }

    fn paint_with(&mut self, ctx: &mut dyn DrawContext, mut tracer: Tracer<'_>) -> FrameSummary {
        let frame_index = self.frame_index;
        let changes = self.layers.evaluate();
        let begin = FrameBeginEvent {
            frame_index,
            transforms_changed: count(&changes.transforms),
            alphas_changed: count(&changes.alphas),
            content_changed: count(&changes.content),
            topology_changed: changes.topology_changed,
        };
        log::trace!("frame {frame_index} begin: {begin:?}");
        tracer.frame_begin(&begin);

        let summary = self.layers.paint(self.root, ctx, frame_index, &mut tracer);

        tracer.frame_summary(&summary);
        log::trace!(
            "frame {frame_index} end: {} painted, {} hidden, {} immediate",
            summary.layers_painted,
            summary.hidden_skipped,
            summary.immediate_calls
        );
        self.frame_index += 1;
        summary
    }
}

fn count(indices: &[u32]) -> u32 {
    u32::try_from(indices.len()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::RefCell;

    use kurbo::{BezPath, Rect};

    use super::*;
    use crate::backend::{Backend, DrawState};
    use crate::raster::Paint;
    use crate::transform::Transform2d;

    #[derive(Default)]
    struct Recorder {
        state: DrawState,
        draws: Vec<(Rect, DrawState)>,
    }

    impl DrawContext for Recorder {
        fn state(&self) -> DrawState {
            self.state
        }

        fn set_state(&mut self, state: DrawState) {
            self.state = state;
        }

        fn draw_image_region(&mut self, _image: &Image, _src: Rect, dest: Rect) {
            self.draws.push((dest, self.state));
        }

        fn fill_rect(&mut self, rect: Rect, _paint: &Paint) {
            self.draws.push((rect, self.state));
        }

        fn fill_path(&mut self, _path: &BezPath, _paint: &Paint) {}
    }

    fn graphics() -> Graphics {
        Graphics::new(GraphicsConfig::desktop()).unwrap()
    }

    #[test]
    fn create_image_reports_size() {
        let g = graphics();
        for &(w, h) in &[(1.0, 1.0), (64.0, 32.0), (0.5, 300.0)] {
            let img = g.create_image(w, h).unwrap();
            assert_eq!((img.width(), img.height()), (w, h));
        }
        assert!(matches!(
            g.create_image(0.0, 1.0),
            Err(GraphicsError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn hidpi_images_are_backed_at_scale() {
        let g = Graphics::new(GraphicsConfig::hidpi()).unwrap();
        let img = g.create_image(10.0, 5.0).unwrap();
        assert_eq!(img.width(), 10.0);
        assert_eq!(img.image().pixel_width(), 20);
        assert_eq!(img.image().pixel_height(), 10);
    }

    #[test]
    fn reattach_under_new_parent() {
        let mut g = graphics();
        let root = g.root_layer();
        let p0 = g.create_group_layer();
        let p1 = g.create_group_layer();
        let l = g.create_image_layer();
        g.add_child(root, p0).unwrap();
        g.add_child(root, p1).unwrap();
        g.add_child(p0, l).unwrap();
        g.add_child(p1, l).unwrap();
        assert_eq!(g.layers().child_count(p0), 0);
        assert_eq!(g.layers().children(p1).collect::<Vec<_>>(), vec![l]);
        assert_eq!(g.layers().parent(l), Some(p1));

        assert_eq!(g.remove_from_parent(l), Some(p1));
        assert_eq!(g.remove_from_parent(l), None);
        assert_eq!(g.layers().child_count(p1), 0);
    }

    #[test]
    fn cyclic_attach_fails() {
        let mut g = graphics();
        let a = g.create_group_layer();
        let b = g.create_group_layer();
        g.add_child(a, b).unwrap();
        assert_eq!(g.add_child(b, a), Err(GraphicsError::CyclicGraph));
        assert_eq!(g.layers().parent(a), None);
        assert_eq!(g.layers().parent(b), Some(a));
    }

    #[test]
    fn hidden_group_emits_no_draws() {
        let mut g = graphics();
        let root = g.root_layer();
        let group = g.create_group_layer();
        let img = g.create_image(4.0, 4.0).unwrap();
        let layer = g.create_image_layer_with(img.image().clone());
        g.add_child(root, group).unwrap();
        g.add_child(group, layer).unwrap();

        let mut before = Recorder::default();
        g.paint(&mut before);
        assert_eq!(before.draws.len(), 1);

        g.layers_mut().set_visible(group, false);
        let mut hidden = Recorder::default();
        let summary = g.paint(&mut hidden);
        assert!(hidden.draws.is_empty());
        assert_eq!(summary.hidden_skipped, 1);

        g.layers_mut().set_visible(group, true);
        let mut after = Recorder::default();
        g.paint(&mut after);
        assert_eq!(after.draws, before.draws);
    }

    #[test]
    fn gradient_factories() {
        let g = graphics();
        let colors = [Color::BLACK, Color::WHITE, Color::BLACK];
        assert_eq!(
            g.create_linear_gradient(0.0, 0.0, 1.0, 0.0, &colors, &[0.0, 1.0]),
            Err(GraphicsError::MismatchedStopCount {
                colors: 3,
                positions: 2
            })
        );
        let grad = g
            .create_radial_gradient(0.0, 0.0, 5.0, &colors, &[0.0, 0.5, 1.0])
            .unwrap();
        let positions: Vec<f32> = grad.stops().iter().map(|s| s.position).collect();
        assert_eq!(positions, [0.0, 0.5, 1.0]);
    }

    #[test]
    fn layout_text_is_pure() {
        let g = graphics();
        let format = TextFormat::new(g.create_font("Arial", FontStyle::Bold, 14.0));
        let a = g.layout_text("Hi", &format);
        let b = g.layout_text("Hi", &format);
        assert_eq!(a.line_count(), b.line_count());
        assert_eq!(a.total_advance(), b.total_advance());
    }

    #[test]
    fn unknown_font_falls_back() {
        let g = graphics();
        let font = g.create_font("NoSuchFamily", FontStyle::Plain, 12.0);
        assert_eq!(font.family(), g.font_resolver().default_family());
    }

    #[test]
    fn clipped_group_limits_image() {
        let mut g = graphics();
        let root = g.root_layer();
        let clip = g.create_clipped_group_layer(100.0, 50.0).unwrap();
        let img = g.create_image(200.0, 200.0).unwrap();
        let layer = g.create_image_layer_with(img.image().clone());
        g.add_child(root, clip).unwrap();
        g.add_child(clip, layer).unwrap();

        let mut rec = Recorder::default();
        g.paint(&mut rec);
        let (_, state) = rec.draws[0];
        assert_eq!(
            state.clip.map(|c| c.rect),
            Some(Rect::new(0.0, 0.0, 100.0, 50.0))
        );
    }

    #[test]
    fn set_size_updates_surface_only() {
        let mut g = graphics();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        g.add_listener(move |e: &GraphicsEvent| sink.borrow_mut().push(*e));

        g.set_size(800, 600).unwrap();
        assert_eq!((g.width(), g.height()), (800, 600));
        assert_eq!((g.screen_width(), g.screen_height()), (1920, 1080));
        assert_eq!(
            *events.borrow(),
            [GraphicsEvent::SizeChanged {
                width: 800,
                height: 600
            }]
        );
        assert!(g.set_size(0, 600).is_err());
        assert_eq!((g.width(), g.height()), (800, 600));
    }

    #[test]
    fn immediate_layer_gets_composed_translation() {
        let mut g = graphics();
        let root = g.root_layer();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let group = g.create_group_layer();
        let imm = g.create_immediate_layer(move |ctx: &mut dyn DrawContext| {
            sink.borrow_mut().push(ctx.state().transform);
        });
        g.layers_mut()
            .set_transform(group, Transform2d::from_translation(10.0, 20.0));
        g.layers_mut()
            .set_transform(imm, Transform2d::from_translation(5.0, 5.0));
        g.add_child(root, group).unwrap();
        g.add_child(group, imm).unwrap();

        let summary = g.paint(&mut Recorder::default());
        assert_eq!(summary.immediate_calls, 1);
        let t = seen.borrow()[0].translation();
        assert_eq!((t.x, t.y), (15.0, 25.0));
    }

    #[test]
    fn reject_policy_refuses_nested_clips() {
        let config = GraphicsConfig::desktop().with_clip_nesting(ClipNesting::Reject);
        let mut g = Graphics::new(config).unwrap();
        let outer = g.create_clipped_group_layer(10.0, 10.0).unwrap();
        let inner = g
            .create_clipped_immediate_layer(5.0, 5.0, |_: &mut dyn DrawContext| {})
            .unwrap();
        let plain = g.create_group_layer();
        g.add_child(plain, inner).unwrap();
        assert_eq!(g.add_child(outer, plain), Err(GraphicsError::UnsupportedNesting));
        assert_eq!(g.layers().parent(plain), None);
    }

    #[test]
    fn default_policy_allows_nested_clips() {
        let mut g = graphics();
        let root = g.root_layer();
        let outer = g.create_clipped_group_layer(10.0, 10.0).unwrap();
        let inner = g.create_clipped_group_layer(5.0, 5.0).unwrap();
        g.add_child(root, outer).unwrap();
        g.add_child(outer, inner).unwrap();
        let summary = g.paint(&mut Recorder::default());
        assert_eq!(summary.clip_conflicts, 1);
    }

    #[test]
    fn gl_handles_by_backend() {
        let g = graphics();
        assert_eq!(g.gl20(), None);
        assert_eq!(g.ctx(), None);
        assert_eq!(g.try_ctx(), Err(GraphicsError::BackendUnavailable));

        let backend = Backend::Gl {
            gl20: Gl20Handle(7),
            context: GlContextHandle(9),
        };
        let mut g = Graphics::new(GraphicsConfig::desktop().with_backend(backend)).unwrap();
        assert_eq!(g.gl20(), Some(Gl20Handle(7)));
        assert_eq!(g.try_ctx(), Ok(GlContextHandle(9)));

        g.notify_context_lost();
        assert!(g.is_context_lost());
        assert_eq!(g.ctx(), None);
        g.notify_context_restored();
        assert_eq!(g.ctx(), Some(GlContextHandle(9)));
    }

    #[test]
    fn context_events_are_reported_once() {
        let mut g = graphics();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        g.add_listener(move |e: &GraphicsEvent| sink.borrow_mut().push(*e));
        g.notify_context_lost();
        g.notify_context_lost();
        g.notify_context_restored();
        assert_eq!(
            *events.borrow(),
            [GraphicsEvent::ContextLost, GraphicsEvent::ContextRestored]
        );
    }

    #[test]
    fn frame_index_advances() {
        let mut g = graphics();
        let first = g.paint(&mut Recorder::default());
        let second = g.paint(&mut Recorder::default());
        assert_eq!(first.frame_index, 0);
        assert_eq!(second.frame_index, 1);
        assert_eq!(g.frame_index(), 2);
    }

    #[test]
    fn surface_layer_keeps_content() {
        let mut g = graphics();
        let root = g.root_layer();
        let s = g.create_surface_layer(4.0, 4.0).unwrap();
        g.add_child(root, s).unwrap();
        g.layers()
            .surface(s)
            .canvas()
            .set_fill_color(Color::WHITE)
            .fill_rect(0.0, 0.0, 4.0, 4.0);
        g.layers_mut().mark_content_changed(s);
        g.paint(&mut Recorder::default());
        g.paint(&mut Recorder::default());
        let surface = g.layers().surface(s).image().clone();
        assert_eq!(surface.pixels().color_at(3, 3), Color::WHITE);
    }

    #[test]
    #[should_panic(expected = "root layer cannot be destroyed")]
    fn root_cannot_be_destroyed() {
        let mut g = graphics();
        let root = g.root_layer();
        g.destroy_layer(root);
    }

    #[test]
    fn reject_policy_applies_to_insert_child() {
        let config = GraphicsConfig::desktop().with_clip_nesting(ClipNesting::Reject);
        let mut g = Graphics::new(config).unwrap();
        let root = g.root_layer();
        let outer = g.create_clipped_group_layer(10.0, 10.0).unwrap();
        let inner = g.create_clipped_group_layer(5.0, 5.0).unwrap();
        g.add_child(root, outer).unwrap();
        assert_eq!(g.insert_child(outer, 0, inner), Err(GraphicsError::UnsupportedNesting));
        assert_eq!(g.layers().child_count(outer), 0);
        let summary = g.paint(&mut Recorder::default());
        assert_eq!(summary.clip_conflicts, 0);
    }

    #[test]
    fn root_survives_topology_edits() {
        let mut g = graphics();
        let root = g.root_layer();
        let group = g.create_group_layer();
        let image = g.create_image_layer();
        g.add_child(root, group).unwrap();
        g.add_child(group, image).unwrap();

        g.remove_all(root);
        assert_eq!(g.layers().child_count(root), 0);
        assert_eq!(g.layers().parent(image), Some(group));
        g.destroy_layer(group);
        assert!(!g.layers().is_alive(group));
        assert_eq!(g.layers().parent(image), None);

        assert!(g.layers().is_alive(root));
        let summary = g.paint(&mut Recorder::default());
        assert_eq!(summary.layers_painted, 1);
    }
}
