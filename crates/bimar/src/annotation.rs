//! Transient 3D text labels.
//!
//! An annotation is a pair of extruded text meshes (a primary and a secondary line)
//! inserted at the scene root. Creation waits for the label font, which is loaded
//! once per URL and shared by every request. Removal is scheduled by the caller
//! from the `on_ready` callback and fired by [`AnnotationManager::pump`].

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::FutureExt;

use bimar_assets::font::{CAP_MATERIAL, SIDE_MATERIAL};
use bimar_assets::{
    build_text_geometry, AssetCache, AssetError, AssetSource, GlyphSource, SharedLoad, TextFont,
    TextParams,
};
use bimar_core::{
    AnnotationOptions, Color, ElementMetadata, Material, Materials, Mesh, Node, NodeId,
    SceneGraph, TimerHandle, TimerQueue, Vec3,
};

/// A loaded label font.
pub type LabelFont = Box<dyn GlyphSource>;

/// Callback run right after an annotation is inserted into the scene.
pub type OnReady = Box<dyn FnOnce(&mut RemovalScheduler<'_>, &Annotation)>;

/// Text and placement of a new annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRequest {
    pub primary_text: String,
    pub secondary_text: String,
    pub primary_position: Vec3,
    pub secondary_position: Vec3,
}

/// The two label meshes of a created annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotation {
    pub primary: NodeId,
    pub secondary: NodeId,
}

impl Annotation {
    /// Detaches both labels. Returns `false` if they were already gone.
    ///
    /// Node ids are generational, so removing an annotation twice never touches
    /// nodes created later.
    pub fn remove(&self, scene: &mut SceneGraph) -> bool {
        let primary = scene.remove_from_parent(self.primary);
        let secondary = scene.remove_from_parent(self.secondary);
        primary || secondary
    }

    /// Whether either label is still in the scene.
    pub fn is_attached(&self, scene: &SceneGraph) -> bool {
        scene.contains(self.primary) || scene.contains(self.secondary)
    }
}

/// Schedules removal of annotations relative to the current frame time.
pub struct RemovalScheduler<'a> {
    timers: &'a mut TimerQueue<Annotation>,
    now_ms: f64,
}

impl RemovalScheduler<'_> {
    /// Frame time the scheduler measures delays from.
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Removes `annotation` once `delay_ms` has elapsed.
    pub fn remove_after(&mut self, annotation: &Annotation, delay_ms: f64) -> TimerHandle {
        self.timers.schedule(self.now_ms + delay_ms, *annotation)
    }

    /// Cancels a scheduled removal. Returns `false` if it already fired.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.timers.cancel(handle).is_some()
    }
}

/// Resolves once the annotation is in the scene, or with the font error.
pub struct AnnotationReceipt {
    font_url: String,
    receiver: oneshot::Receiver<Result<Annotation, AssetError>>,
}

impl AnnotationReceipt {
    fn cancelled(&self) -> AssetError {
        AssetError::Cancelled {
            url: self.font_url.clone(),
        }
    }

    /// Takes the outcome if creation has finished.
    ///
    /// The outcome is delivered once; poll no further after `Some`.
    pub fn try_result(&mut self) -> Option<Result<Annotation, AssetError>> {
        match self.receiver.try_recv() {
            Ok(Some(result)) => Some(result),
            Ok(None) => None,
            Err(oneshot::Canceled) => Some(Err(self.cancelled())),
        }
    }
}

impl Future for AnnotationReceipt {
    type Output = Result<Annotation, AssetError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.receiver.poll_unpin(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(self.cancelled())),
            Poll::Pending => Poll::Pending,
        }
    }
}

struct PendingAnnotation {
    font: SharedLoad<LabelFont>,
    request: AnnotationRequest,
    on_ready: OnReady,
    reply: oneshot::Sender<Result<Annotation, AssetError>>,
}

/// Creates and retires transient labels.
pub struct AnnotationManager {
    fonts: AssetCache<LabelFont>,
    options: AnnotationOptions,
    timers: TimerQueue<Annotation>,
    pending: Vec<PendingAnnotation>,
}

impl AnnotationManager {
    /// Creates a manager that decodes label fonts with fontdue.
    pub fn new(source: Rc<dyn AssetSource>, options: AnnotationOptions) -> Self {
        Self::with_font_decoder(source, options, |url, bytes| {
            let font = TextFont::from_bytes(url, &bytes)?;
            Ok(Box::new(font) as LabelFont)
        })
    }

    /// Creates a manager with a custom font decoder.
    pub fn with_font_decoder(
        source: Rc<dyn AssetSource>,
        options: AnnotationOptions,
        decode: impl Fn(&str, Vec<u8>) -> bimar_assets::Result<LabelFont> + 'static,
    ) -> Self {
        Self {
            fonts: AssetCache::new(source, decode),
            options,
            timers: TimerQueue::new(),
            pending: Vec::new(),
        }
    }

    pub fn options(&self) -> &AnnotationOptions {
        &self.options
    }

    /// Requests a new annotation.
    ///
    /// Nothing is inserted until a later [`pump`](Self::pump) finds the font
    /// loaded. `on_ready` then runs synchronously after both labels are in the
    /// scene; it is never called if the font fails to load.
    pub fn create_annotation(
        &mut self,
        request: AnnotationRequest,
        on_ready: impl FnOnce(&mut RemovalScheduler<'_>, &Annotation) + 'static,
    ) -> AnnotationReceipt {
        let font_url = self.options.font.clone();
        let (reply, receiver) = oneshot::channel();
        self.pending.push(PendingAnnotation {
            font: self.fonts.load(&font_url),
            request,
            on_ready: Box::new(on_ready),
            reply,
        });
        AnnotationReceipt { font_url, receiver }
    }

    /// Advances annotations to `now_ms`: fires due removals, then inserts every
    /// annotation whose font has finished loading.
    ///
    /// Returns the number of annotations removed.
    pub fn pump(&mut self, scene: &mut SceneGraph, now_ms: f64) -> usize {
        let mut removed = 0;
        while let Some(annotation) = self.timers.pop_due(now_ms) {
            if annotation.remove(scene) {
                removed += 1;
            }
        }

        let mut waiting = Vec::with_capacity(self.pending.len());
        for pending in std::mem::take(&mut self.pending) {
            match pending.font.clone().now_or_never() {
                None => waiting.push(pending),
                Some(Ok(font)) => self.insert(scene, now_ms, pending, &**font),
                Some(Err(err)) => {
                    log::error!("annotation dropped, label font unavailable: {err}");
                    pending.reply.send(Err(err)).ok();
                }
            }
        }
        self.pending = waiting;

        if removed > 0 {
            log::debug!("removed {removed} expired annotation(s)");
        }
        removed
    }

    fn insert(
        &mut self,
        scene: &mut SceneGraph,
        now_ms: f64,
        pending: PendingAnnotation,
        font: &dyn GlyphSource,
    ) {
        let PendingAnnotation {
            request,
            on_ready,
            reply,
            ..
        } = pending;

        let params = TextParams {
            size: self.options.size,
            depth: self.options.depth,
            ..TextParams::default()
        };
        let mut materials = vec![Material::default(); 2];
        materials[CAP_MATERIAL] = Material::phong(Color::from_hex(self.options.face_color));
        materials[SIDE_MATERIAL] = Material::phong(Color::from_hex(self.options.border_color));
        let materials = Materials::List(materials);

        let mut label = |text: &str, position: Vec3| {
            let geometry = build_text_geometry(text, font, &params);
            let node = Node::mesh(Mesh::new(Arc::new(geometry), materials.clone()))
                .with_position(position)
                .with_metadata(ElementMetadata::new(text))
                .with_pickable(false);
            scene.add_to_root(node)
        };
        let annotation = Annotation {
            primary: label(&request.primary_text, request.primary_position),
            secondary: label(&request.secondary_text, request.secondary_position),
        };
        log::debug!("annotation \"{}\" added", request.primary_text);

        let mut scheduler = RemovalScheduler {
            timers: &mut self.timers,
            now_ms,
        };
        on_ready(&mut scheduler, &annotation);
        reply.send(Ok(annotation)).ok();
    }

    /// Cancels a removal scheduled from `on_ready`.
    pub fn cancel_removal(&mut self, handle: TimerHandle) -> bool {
        self.timers.cancel(handle).is_some()
    }

    /// Number of requests waiting for their font.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of removals not yet fired.
    pub fn scheduled_removals(&self) -> usize {
        self.timers.len()
    }

    /// Drops scheduled removals and pending requests. Pending receipts resolve
    /// as cancelled; labels already in the scene stay.
    pub fn cancel_all(&mut self) {
        if !self.pending.is_empty() || !self.timers.is_empty() {
            log::debug!(
                "cancelling {} pending annotation(s) and {} removal(s)",
                self.pending.len(),
                self.timers.len()
            );
        }
        self.pending.clear();
        self.timers.clear();
    }
}
