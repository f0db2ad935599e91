//! The per-frame interaction loop.

use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use bimar_core::{
    count_trackable_images, AnnotationOptions, Camera, Color, CoreError, InputSampler, ModelOptions,
    Node, NodeId, OrbitControls, Options, Picker, PointerButton, PoseTracker, ReferenceSpace,
    SceneGraph, Vec2, XrFrame, XrSession,
};
use bimar_render::SceneRenderer;

use bimar_assets::AssetSource;

use crate::annotation::{AnnotationManager, AnnotationReceipt, AnnotationRequest};
use crate::error::Result;
use crate::setup::{build_scene, configure_camera, StartupLoads};

/// What happened during one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    /// Nearest node under the pointer when the primary button went down.
    pub picked: Option<NodeId>,
    /// An annotation was requested for the picked node.
    pub annotation_requested: bool,
    /// The model group took a new pose from a tracked marker.
    pub pose_updated: bool,
    /// Annotations whose lifetime ended this frame.
    pub annotations_removed: usize,
}

/// Owns the scene and drives pose tracking, input, picking, labels and rendering
/// once per displayed frame.
pub struct InteractionLoop {
    pub scene: SceneGraph,
    pub camera: Camera,
    pub controls: OrbitControls,
    pub input: InputSampler,
    model_root: NodeId,
    model_options: ModelOptions,
    background: Color,
    tracker: PoseTracker,
    reference_space: ReferenceSpace,
    immersive: bool,
    picker: Picker,
    annotations: AnnotationManager,
    receipts: Vec<AnnotationReceipt>,
    startup: StartupLoads,
    rng: StdRng,
    last_time_ms: Option<f64>,
}

impl InteractionLoop {
    /// Builds the scene and starts the startup loads from `source`.
    pub fn new(options: &Options, source: Rc<dyn AssetSource>) -> Self {
        let annotations = AnnotationManager::new(Rc::clone(&source), options.annotation.clone());
        Self::with_annotations(options, source, annotations)
    }

    /// Like [`new`](Self::new), with a preconfigured annotation manager.
    pub fn with_annotations(
        options: &Options,
        source: Rc<dyn AssetSource>,
        annotations: AnnotationManager,
    ) -> Self {
        let mut scene = SceneGraph::new();
        let model_root = build_scene(&mut scene, options);

        let [width, height] = options.window_size;
        let mut camera = Camera::new(width as f32 / height.max(1) as f32);
        configure_camera(&mut camera, &options.camera);
        let mut input = InputSampler::new();
        input.set_viewport(Vec2::new(width as f32, height as f32));

        Self {
            scene,
            camera,
            controls: OrbitControls::new(),
            input,
            model_root,
            model_options: options.model.clone(),
            background: options.background(),
            tracker: PoseTracker::new(options.tracking.tie_break),
            reference_space: options.tracking.reference_space,
            immersive: false,
            picker: Picker::new(),
            annotations,
            receipts: Vec::new(),
            startup: StartupLoads::start(&source, options),
            rng: StdRng::from_entropy(),
            last_time_ms: None,
        }
    }

    /// Seeds the generator used for recoloring picked elements.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// The marker-anchored group.
    pub fn model_root(&self) -> NodeId {
        self.model_root
    }

    pub fn annotations(&self) -> &AnnotationManager {
        &self.annotations
    }

    pub fn startup(&self) -> &StartupLoads {
        &self.startup
    }

    /// Clear color the renderer should use.
    pub fn background(&self) -> Color {
        self.background
    }

    /// Blocks until the startup loads have finished and applies them.
    pub fn complete_startup(&mut self) {
        self.startup
            .complete(&mut self.scene, self.model_root, &self.model_options);
    }

    pub fn is_immersive(&self) -> bool {
        self.immersive
    }

    /// Enters an image-tracking session.
    ///
    /// Returns the number of trackable marker images; with none, a warning is
    /// logged and the model keeps its last pose.
    pub fn begin_session(&mut self, session: &dyn XrSession) -> usize {
        self.immersive = true;
        self.reference_space = session.reference_space();
        let trackable = count_trackable_images(&session.tracked_image_scores());
        if trackable == 0 {
            log::warn!("no trackable images in the session, the model will not follow the marker");
        } else {
            log::info!("image tracking session started with {trackable} trackable image(s)");
        }
        if let Some(marker) = self.startup.marker() {
            log::debug!("marker width {:.3} m", marker.width_meters);
        }
        trackable
    }

    pub fn end_session(&mut self) {
        self.immersive = false;
        log::info!("image tracking session ended");
    }

    /// Follows a viewport size change. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32, renderer: &mut dyn SceneRenderer) {
        if width == 0 || height == 0 {
            return;
        }
        self.camera.set_aspect_ratio(width as f32 / height as f32);
        self.input.set_viewport(Vec2::new(width as f32, height as f32));
        renderer.resize(width, height);
    }

    /// Runs one frame at `time_ms`.
    ///
    /// Malformed tracking data fails the frame before anything is rendered.
    pub fn frame(
        &mut self,
        time_ms: f64,
        frame: Option<&dyn XrFrame>,
        renderer: &mut dyn SceneRenderer,
    ) -> Result<FrameReport> {
        let mut report = FrameReport::default();

        let dt = self
            .last_time_ms
            .map_or(0.0, |last| ((time_ms - last).max(0.0) / 1000.0) as f32);
        self.last_time_ms = Some(time_ms);
        if !self.immersive {
            self.controls.update(&mut self.camera, &self.input, dt);
        }

        let model = self
            .scene
            .get_mut(self.model_root)
            .ok_or(CoreError::NodeNotFound)?;
        report.pose_updated =
            self.tracker
                .update_pose(&mut model.transform, frame, self.reference_space)?;

        self.input.update();
        let pointer = self.input.pointer_sample();

        if self.input.button_just_pressed(PointerButton::Primary) {
            let hit = pointer
                .and_then(|sample| self.camera.ray_through(sample.ndc()))
                .and_then(|ray| {
                    self.picker
                        .pick_ray(ray, &self.scene, self.scene.root())
                        .first()
                        .copied()
                });
            if let Some(hit) = hit {
                log::debug!("picked {:?} at distance {:.3}", hit.node, hit.distance);
                report.picked = Some(hit.node);
                report.annotation_requested = self.annotate(hit.node);
                self.recolor(hit.node);
            }
        }

        self.startup
            .pump(&mut self.scene, self.model_root, &self.model_options);
        report.annotations_removed = self.annotations.pump(&mut self.scene, time_ms);
        self.receipts.retain_mut(|receipt| match receipt.try_result() {
            None => true,
            Some(Ok(_)) => false,
            Some(Err(err)) => {
                log::debug!("annotation request failed: {err}");
                false
            }
        });

        renderer.render(&self.scene, &self.camera)?;
        Ok(report)
    }

    fn annotate(&mut self, id: NodeId) -> bool {
        let Some(node) = self.scene.get(id) else {
            return false;
        };
        let options: &AnnotationOptions = self.annotations.options();
        let missing = options.missing_text.as_str();
        let name = node.metadata.name.as_deref().unwrap_or(missing);
        let description = node.metadata.description.as_deref().unwrap_or(missing);
        let position = node.position();
        let request = AnnotationRequest {
            primary_text: format!("Name: {name}"),
            secondary_text: format!("Description: {description}"),
            primary_position: position + options.primary_offset,
            secondary_position: position + options.secondary_offset,
        };
        let lifetime_ms = options.lifetime_ms;

        let receipt = self
            .annotations
            .create_annotation(request, move |scheduler, annotation| {
                scheduler.remove_after(annotation, lifetime_ms);
            });
        self.receipts.push(receipt);
        true
    }

    fn recolor(&mut self, id: NodeId) {
        let rng = &mut self.rng;
        if let Some(mesh) = self.scene.get_mut(id).and_then(Node::as_mesh_mut) {
            mesh.materials.recolor(|| Color::random(rng));
        }
    }

    /// Drops pending annotation work; labels already shown stay in the scene.
    pub fn shutdown(&mut self) {
        self.annotations.cancel_all();
        self.receipts.clear();
    }
}
