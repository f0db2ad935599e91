//! Scene bootstrap and startup asset loads.

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::FutureExt;

use bimar_assets::{
    axes_helper, make_transparent, AssetSource, ElementManifest, MarkerImage,
};
use bimar_core::{Camera, CameraOptions, Color, Light, ModelOptions, Node, NodeId, Options, SceneGraph};

/// Adds the lights and the marker-anchored model group to an empty scene.
///
/// Returns the model group. Its transform follows the tracked marker; the axes
/// helper and the loaded BIM elements live below it.
pub fn build_scene(scene: &mut SceneGraph, options: &Options) -> NodeId {
    scene.add_to_root(Node::light(Light::Ambient {
        color: Color::from_hex(options.ambient_color),
        intensity: options.ambient_intensity,
    }));
    scene.add_to_root(
        Node::light(Light::Directional {
            color: Color::WHITE,
            intensity: options.directional_intensity,
        })
        .with_position(options.directional_position),
    );

    let model_root = scene.add_to_root(Node::group());
    if options.axes_size > 0.0 {
        for axis in axes_helper(options.axes_size) {
            if let Err(err) = scene.add(model_root, axis) {
                log::warn!("axes helper not added: {err}");
            }
        }
    }

    log::info!("scene ready with {} nodes", scene.len());
    model_root
}

/// Applies the configured placement and lens to `camera`.
pub fn configure_camera(camera: &mut Camera, options: &CameraOptions) {
    camera.position = options.position;
    camera.target = options.target;
    camera.set_fov(options.fov_degrees.to_radians());
    camera.near = options.near;
    camera.far = options.far;
}

type Load<T> = LocalBoxFuture<'static, bimar_assets::Result<T>>;

/// Assets requested once at startup: the BIM model and the tracking marker.
///
/// Loads are polled from the frame loop and never block it. A failed load is
/// logged and disables only its own feature.
#[derive(Default)]
pub struct StartupLoads {
    model: Option<Load<ElementManifest>>,
    marker: Option<Load<MarkerImage>>,
    model_group: Option<NodeId>,
    marker_image: Option<MarkerImage>,
}

impl StartupLoads {
    /// Starts the loads named in `options`; empty URLs are skipped.
    pub fn start(source: &Rc<dyn AssetSource>, options: &Options) -> Self {
        let mut loads = Self::default();

        let url = options.model.manifest.clone();
        if !url.is_empty() {
            let fetch = source.fetch(&url);
            loads.model = Some(
                async move {
                    let bytes = fetch.await?;
                    ElementManifest::parse(&url, &bytes)
                }
                .boxed_local(),
            );
        }

        let url = options.marker.image.clone();
        if !url.is_empty() {
            let width = options.marker.width_meters;
            let fetch = source.fetch(&url);
            loads.marker = Some(
                async move {
                    let bytes = fetch.await?;
                    MarkerImage::decode(&url, &bytes, width)
                }
                .boxed_local(),
            );
        }

        loads
    }

    /// Polls outstanding loads once and applies the ones that finished.
    pub fn pump(&mut self, scene: &mut SceneGraph, model_root: NodeId, options: &ModelOptions) {
        if let Some(result) = self.model.as_mut().and_then(|load| load.now_or_never()) {
            self.model = None;
            self.apply_model(result, scene, model_root, options);
        }
        if let Some(result) = self.marker.as_mut().and_then(|load| load.now_or_never()) {
            self.marker = None;
            self.apply_marker(result);
        }
    }

    /// Drives outstanding loads to completion, blocking the caller.
    pub fn complete(&mut self, scene: &mut SceneGraph, model_root: NodeId, options: &ModelOptions) {
        if let Some(load) = self.model.take() {
            let result = futures::executor::block_on(load);
            self.apply_model(result, scene, model_root, options);
        }
        if let Some(load) = self.marker.take() {
            self.apply_marker(futures::executor::block_on(load));
        }
    }

    fn apply_model(
        &mut self,
        result: bimar_assets::Result<ElementManifest>,
        scene: &mut SceneGraph,
        model_root: NodeId,
        options: &ModelOptions,
    ) {
        let manifest = match result {
            Ok(manifest) => manifest,
            Err(err) => {
                log::error!("BIM model not loaded: {err}");
                return;
            }
        };

        let group = match scene.add(model_root, Node::group()) {
            Ok(group) => group,
            Err(err) => {
                log::error!("BIM model not inserted: {err}");
                return;
            }
        };
        for node in manifest.instantiate(options.offset) {
            if let Err(err) = scene.add(group, node) {
                log::error!("BIM element not inserted: {err}");
            }
        }
        if options.transparent {
            make_transparent(scene, group, options.opacity);
        }

        log::info!("BIM model loaded: {} elements", manifest.elements.len());
        self.model_group = Some(group);
    }

    fn apply_marker(&mut self, result: bimar_assets::Result<MarkerImage>) {
        match result {
            Ok(marker) => {
                log::info!(
                    "tracking marker loaded: {}x{} px, {:.3}x{:.3} m",
                    marker.image.width(),
                    marker.image.height(),
                    marker.width_meters,
                    marker.height_meters()
                );
                self.marker_image = Some(marker);
            }
            Err(err) => log::error!("tracking marker not loaded: {err}"),
        }
    }

    /// Whether every load has finished, successfully or not.
    pub fn is_finished(&self) -> bool {
        self.model.is_none() && self.marker.is_none()
    }

    /// Group holding the loaded BIM elements.
    pub fn model_group(&self) -> Option<NodeId> {
        self.model_group
    }

    pub fn marker(&self) -> Option<&MarkerImage> {
        self.marker_image.as_ref()
    }
}
