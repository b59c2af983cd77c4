//! # Showroom
//!
//! The configurator scene: loads the shoe, indexes its customizable parts,
//! wires their material parameters into the registry and moves the camera
//! between preset viewpoints.

pub mod report;

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use cgmath::{Rad, Vector3, Zero};
use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    assets::{catalog, AssetError, LoaderManager, TextureData},
    config::ConfiguratorConfig,
    customizer::ModelCustomizer,
    gfx::{
        camera::{CameraManager, CameraTween},
        resources::{global_bindings::ShaderParams, material::TextureSlot},
        scene::{Aabb, SharedGraph},
    },
    params::{defaults, ParamOptions, ParamRegistry, ParamValue, ParamView, Uniform},
};

pub use report::ModelReport;

/// Elements that get panel controls and camera presets
pub const CUSTOMIZABLE: [&str; 2] = ["shoe", "shoelace"];

/// Camera target covering the whole model
pub const OVERVIEW: &str = "overview";

/// Seconds a camera move takes unless the caller says otherwise
pub const DEFAULT_FOCUS_DURATION: f32 = 1.5;

const SHOE_VIEW: Vector3<f32> = Vector3::new(68.248, -3.159, -11.119);
const SHOELACE_VIEW: Vector3<f32> = Vector3::new(1.313, 17.765, 46.719);
const OVERVIEW_VIEW: Vector3<f32> = Vector3::new(50.112, 27.794, 36.482);
const BASE_VIEW: Vector3<f32> = Vector3::new(12.675, 30.65, 67.268);

#[derive(Debug, Error)]
pub enum ShowroomError {
    #[error(transparent)]
    Assets(#[from] AssetError),
    #[error("model '{0}' is not in the asset cache")]
    MissingModel(String),
}

/// Where the camera goes to look at one element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTarget {
    /// Point looked at, the element's world-space center
    pub target: Vector3<f32>,
    /// Eye position
    pub position: Vector3<f32>,
    pub distance: f32,
    pub size: Vector3<f32>,
}

/// Material values an element had right after loading
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDefaults {
    /// `#rrggbb`
    pub color: String,
    pub metalness: f32,
    pub roughness: f32,
}

impl Default for ElementDefaults {
    fn default() -> Self {
        Self {
            color: "#ffffff".to_string(),
            metalness: 0.0,
            roughness: 1.0,
        }
    }
}

/// Registry name of one of an element's material parameters
pub fn param_name(element: &str, property: &str) -> String {
    format!("{}.{}", element, property)
}

/// Eye position for elements without a preset, framing `bounds` from the front-right
pub fn fallback_view(bounds: &Aabb, fov: Rad<f32>, aspect: f32) -> Vector3<f32> {
    let center = bounds.center();
    let size = bounds.size();
    let half_fov_tan = (fov.0 / 2.0).tan();
    let distance_x = size.x / 2.0 / half_fov_tan;
    let distance_y = size.y / 2.0 / (half_fov_tan * aspect);
    let distance = distance_x.max(distance_y) * 1.2;
    let angle = std::f32::consts::FRAC_PI_6;

    Vector3::new(
        center.x + angle.sin() * distance * 0.5,
        center.y + size.y * 0.3,
        center.z + angle.cos() * distance * 0.6,
    )
}

fn preset_view(element: &str) -> Option<Vector3<f32>> {
    match element {
        "shoe" => Some(SHOE_VIEW),
        "shoelace" => Some(SHOELACE_VIEW),
        _ => None,
    }
}

pub struct Showroom {
    config: ConfiguratorConfig,
    pub camera: CameraManager,
    model: Option<SharedGraph>,
    customizer: Option<Rc<ModelCustomizer>>,
    report: Option<ModelReport>,
    camera_targets: Vec<(String, CameraTarget)>,
    defaults: HashMap<String, ElementDefaults>,
    tween: Option<CameraTween>,
    time: f32,
    progress: Rc<Uniform>,
    since_camera_log: f32,
}

impl Showroom {
    pub fn new(config: ConfiguratorConfig) -> Self {
        let camera = CameraManager::from_config(&config.camera, &config.controls, 1.0);
        Self {
            config,
            camera,
            model: None,
            customizer: None,
            report: None,
            camera_targets: Vec::new(),
            defaults: HashMap::new(),
            tween: None,
            time: 0.0,
            progress: Uniform::new(0.0),
            since_camera_log: 0.0,
        }
    }

    /// Loads the bootstrap assets and sets the scene up
    pub async fn init(
        &mut self,
        loader: &LoaderManager,
        registry: &mut ParamRegistry,
    ) -> Result<(), ShowroomError> {
        loader.submit(&catalog::bootstrap_requests()).await?;
        self.setup(loader, registry)
    }

    /// Builds the scene from assets that are already cached
    ///
    /// Only the first successful call does anything; later calls keep the
    /// current model and its registered parameters.
    pub fn setup(
        &mut self,
        loader: &LoaderManager,
        registry: &mut ParamRegistry,
    ) -> Result<(), ShowroomError> {
        if self.model.is_some() {
            debug!("Showroom already set up");
            return Ok(());
        }

        let shoe = catalog::model(loader, catalog::SHOE)
            .ok_or_else(|| ShowroomError::MissingModel(catalog::SHOE.to_string()))?;

        // The cached model stays pristine, edits go to this copy
        let graph: SharedGraph = Rc::new(RefCell::new((*shoe).clone()));

        let report = ModelReport::from_graph(&graph.borrow());
        report.log();

        let customizer = Rc::new(ModelCustomizer::new(graph.clone()));
        info!(
            "Available elements: {}",
            customizer.available_elements().join(", ")
        );

        let center = graph.borrow_mut().center_at_origin();
        debug!("Centered model, shifted by {:?}", center);

        self.model = Some(graph);
        self.customizer = Some(customizer);
        self.report = Some(report);
        self.camera_targets = self.calculate_camera_targets();

        self.camera.look_from(BASE_VIEW, Vector3::zero());
        self.camera.camera.set_home(BASE_VIEW, Vector3::zero());

        self.register_params(registry);
        Ok(())
    }

    fn calculate_camera_targets(&self) -> Vec<(String, CameraTarget)> {
        let (Some(graph), Some(customizer)) = (&self.model, &self.customizer) else {
            return Vec::new();
        };
        let graph = graph.borrow();

        CUSTOMIZABLE
            .iter()
            .filter_map(|&name| {
                let Some(element) = customizer.element(name) else {
                    warn!("No element '{}' to compute a camera target for", name);
                    return None;
                };
                let bounds = graph.bounding_box(element);
                let center = bounds.center();
                let position = preset_view(name).unwrap_or_else(|| {
                    fallback_view(&bounds, self.camera.camera.fovy, self.camera.camera.aspect)
                });
                let target = CameraTarget {
                    target: center,
                    position,
                    distance: cgmath::MetricSpace::distance(position, center),
                    size: bounds.size(),
                };
                debug!("Camera target for '{}': {:?}", name, target);
                Some((name.to_string(), target))
            })
            .collect()
    }

    fn register_params(&mut self, registry: &mut ParamRegistry) {
        defaults::define_defaults(registry, &self.config.params);
        if let Err(e) = registry.bind_uniform(defaults::PROGRESS, &self.progress) {
            warn!("{}", e);
        }

        let Some(customizer) = self.customizer.clone() else {
            return;
        };

        for element in self.customizable_elements() {
            let Some(info) = customizer.element_info(&element) else {
                continue;
            };
            let Some(first) = info.materials.first() else {
                continue;
            };
            let element_defaults = ElementDefaults {
                color: format!("#{}", first.color),
                metalness: first.metalness,
                roughness: first.roughness,
            };

            let color = param_name(&element, "color");
            let metalness = param_name(&element, "metalness");
            let roughness = param_name(&element, "roughness");

            let _ = registry.define(
                &color,
                element_defaults.color.as_str(),
                ParamOptions::default()
                    .with_label("Color")
                    .with_view(ParamView::Color),
            );
            let _ = registry.define(
                &metalness,
                element_defaults.metalness,
                ParamOptions::range(0.0, 1.0, 0.01).with_label("Metalness"),
            );
            let _ = registry.define(
                &roughness,
                element_defaults.roughness,
                ParamOptions::range(0.0, 1.0, 0.01).with_label("Roughness"),
            );

            let target = customizer.clone();
            let name = element.clone();
            registry.on_change(&color, move |value, _| {
                if let Some(hex) = value.as_str() {
                    if let Err(e) = target.set_color(&name, hex) {
                        warn!("{}", e);
                    }
                }
            });
            let target = customizer.clone();
            let name = element.clone();
            registry.on_change(&metalness, move |value, _| {
                if let Some(v) = value.as_f32() {
                    if let Err(e) = target.set_metalness(&name, v) {
                        warn!("{}", e);
                    }
                }
            });
            let target = customizer.clone();
            let name = element.clone();
            registry.on_change(&roughness, move |value, _| {
                if let Some(v) = value.as_f32() {
                    if let Err(e) = target.set_roughness(&name, v) {
                        warn!("{}", e);
                    }
                }
            });

            self.defaults.insert(element, element_defaults);
        }
    }

    /// Customizable elements the loaded model actually has, in model order
    pub fn customizable_elements(&self) -> Vec<String> {
        self.customizer
            .as_ref()
            .map(|customizer| {
                customizer
                    .available_elements()
                    .iter()
                    .filter(|name| CUSTOMIZABLE.contains(&name.as_str()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Starts a camera move towards `name`, or [`OVERVIEW`] for the whole model
    ///
    /// Returns false, leaving the camera alone, when there is no such target.
    pub fn focus_on_element(&mut self, name: &str, duration: f32) -> bool {
        let destination = if name == OVERVIEW {
            let Some(graph) = &self.model else {
                warn!("No model loaded, cannot show the overview");
                return false;
            };
            let graph = graph.borrow();
            (OVERVIEW_VIEW, graph.bounding_box(graph.root()).center())
        } else {
            match self.camera_target(name) {
                Some(target) => (target.position, target.target),
                None => {
                    warn!("No camera target for '{}'", name);
                    return false;
                }
            }
        };

        let start = (self.camera.camera.eye, self.camera.camera.target);
        self.tween = Some(CameraTween::new(start, destination, duration));
        self.camera.enabled = false;
        debug!("Focusing camera on '{}' over {:.2}s", name, duration);
        true
    }

    /// Advances camera moves, time and the debug camera log
    pub fn update(&mut self, dt: f32) {
        if let Some(tween) = &mut self.tween {
            let (eye, target) = tween.advance(dt);
            let finished = tween.is_finished();
            self.camera.look_from(eye, target);
            if finished {
                self.tween = None;
                self.camera.enabled = true;
            }
        }
        self.camera.update();
        self.time += dt;

        if self.config.debug.enabled {
            self.since_camera_log += dt;
            if self.since_camera_log >= self.config.debug.camera_log_interval {
                let camera = &self.camera.camera;
                debug!(
                    "Camera position ({:.3}, {:.3}, {:.3}) target ({:.3}, {:.3}, {:.3})",
                    camera.eye.x,
                    camera.eye.y,
                    camera.eye.z,
                    camera.target.x,
                    camera.target.y,
                    camera.target.z
                );
                self.since_camera_log = 0.0;
            }
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.camera.resize_projection(width, height);
    }

    /// Replaces a texture on every material of an element
    pub fn apply_texture(&self, element: &str, slot: TextureSlot, texture: Rc<TextureData>) -> bool {
        let Some(customizer) = &self.customizer else {
            return false;
        };
        match customizer.set_texture(element, slot, texture) {
            Ok(()) => true,
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    /// Restores an element's color, metalness and roughness through the registry
    pub fn reset_element(&self, element: &str, registry: &mut ParamRegistry) {
        let Some(values) = self.element_defaults(element) else {
            return;
        };
        let updates = [
            ("color", ParamValue::from(values.color.as_str())),
            ("metalness", ParamValue::from(values.metalness)),
            ("roughness", ParamValue::from(values.roughness)),
        ];
        for (property, value) in updates {
            if let Err(e) = registry.update(&param_name(element, property), value) {
                warn!("{}", e);
            }
        }
    }

    pub fn element_defaults(&self, element: &str) -> Option<&ElementDefaults> {
        self.defaults.get(element)
    }

    pub fn camera_target(&self, name: &str) -> Option<&CameraTarget> {
        self.camera_targets
            .iter()
            .find(|(target, _)| target == name)
            .map(|(_, target)| target)
    }

    pub fn camera_targets(&self) -> &[(String, CameraTarget)] {
        &self.camera_targets
    }

    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    pub fn model(&self) -> Option<&SharedGraph> {
        self.model.as_ref()
    }

    pub fn customizer(&self) -> Option<&Rc<ModelCustomizer>> {
        self.customizer.as_ref()
    }

    pub fn report(&self) -> Option<&ModelReport> {
        self.report.as_ref()
    }

    pub fn shader_params(&self) -> ShaderParams {
        ShaderParams {
            time: self.time,
            progress: self.progress.as_f32(),
        }
    }

    pub fn config(&self) -> &ConfiguratorConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use futures::{executor::LocalPool, future, FutureExt};

    use cgmath::Deg;

    use super::*;
    use crate::{
        assets::{AssetBackend, AssetErrorKind, AssetHandle, LoadFailure, LoadFuture},
        gfx::{
            resources::material::Material,
            scene::{Geometry, NodeKind, SceneGraph, Transform},
        },
    };

    fn shoe_graph() -> SceneGraph {
        let mut graph = SceneGraph::new();
        let leather = graph.add_material(Material::new("leather", [1.0, 1.0, 1.0, 1.0], 0.1, 0.9));
        let cotton = graph.add_material(Material::new("cotton", [0.0, 0.0, 1.0, 1.0], 0.0, 1.0));
        let quad = Rc::new(Geometry::new(
            vec![0.0, 0.0, 0.0, 4.0, 0.0, 0.0, 4.0, 2.0, 0.0, 0.0, 2.0, 0.0],
            Vec::new(),
            vec![0, 1, 2, 0, 2, 3],
        ));

        let root = graph.add_node(
            graph.root(),
            "shoe",
            NodeKind::Group,
            Transform::from_translation(Vector3::new(10.0, 0.0, 0.0)),
        );
        let upper = graph.add_node(root, "upper", NodeKind::Mesh, Transform::default());
        graph.add_primitive(upper, quad.clone(), leather);
        let laces = graph.add_node(root, "shoelace", NodeKind::Mesh, Transform::default());
        graph.add_primitive(laces, quad, cotton);
        graph
    }

    struct ShoeBackend;

    impl AssetBackend for ShoeBackend {
        fn load_texture(&self, _source: &str) -> LoadFuture {
            future::ready(Ok(AssetHandle::Texture(Rc::new(TextureData {
                label: "water".into(),
                image: crate::assets::ImageData::solid([0, 0, 255, 255]),
                flip_y: true,
            }))))
            .boxed_local()
        }

        fn load_model(&self, _source: &str) -> LoadFuture {
            future::ready(Ok(AssetHandle::Model(Rc::new(shoe_graph())))).boxed_local()
        }

        fn load_image(&self, source: &str) -> LoadFuture {
            future::ready(Err(LoadFailure::not_found(source))).boxed_local()
        }

        fn load_font(&self, source: &str) -> LoadFuture {
            future::ready(Err(LoadFailure::not_found(source))).boxed_local()
        }

        fn load_object(&self, source: &str) -> LoadFuture {
            future::ready(Err(LoadFailure::not_found(source))).boxed_local()
        }
    }

    struct EmptyBackend;

    impl AssetBackend for EmptyBackend {
        fn load_texture(&self, source: &str) -> LoadFuture {
            future::ready(Err(LoadFailure::not_found(source))).boxed_local()
        }

        fn load_model(&self, source: &str) -> LoadFuture {
            future::ready(Err(LoadFailure::not_found(source))).boxed_local()
        }

        fn load_image(&self, source: &str) -> LoadFuture {
            future::ready(Err(LoadFailure::not_found(source))).boxed_local()
        }

        fn load_font(&self, source: &str) -> LoadFuture {
            future::ready(Err(LoadFailure::not_found(source))).boxed_local()
        }

        fn load_object(&self, source: &str) -> LoadFuture {
            future::ready(Err(LoadFailure::not_found(source))).boxed_local()
        }
    }

    fn ready_showroom() -> (Showroom, ParamRegistry, LoaderManager) {
        let mut pool = LocalPool::new();
        let loader = LoaderManager::new(Rc::new(ShoeBackend), pool.spawner());
        let mut registry = ParamRegistry::new();
        let mut showroom = Showroom::new(ConfiguratorConfig::default());

        pool.run_until(showroom.init(&loader, &mut registry)).unwrap();
        (showroom, registry, loader)
    }

    #[test]
    fn second_setup_keeps_a_single_set_of_bindings() {
        let (mut showroom, mut registry, loader) = ready_showroom();
        registry.update("shoe.roughness", 0.25).unwrap();
        let model = showroom.model().unwrap().clone();

        showroom.setup(&loader, &mut registry).unwrap();

        assert!(Rc::ptr_eq(showroom.model().unwrap(), &model));
        assert_eq!(registry.binding_count(defaults::PROGRESS), 1);
        assert_eq!(registry.listener_count("shoe.color"), 1);
        assert_eq!(registry.listener_count("shoelace.metalness"), 1);
        assert_eq!(registry.get("shoe.roughness").and_then(ParamValue::as_f32), Some(0.25));
    }

    #[test]
    fn init_centres_a_copy_of_the_cached_model() {
        let (showroom, _registry, loader) = ready_showroom();

        let graph = showroom.model().unwrap().borrow();
        let bounds = graph.bounding_box(graph.root());
        assert_eq!(bounds.center(), Vector3::new(0.0, 0.0, 0.0));

        let cached = catalog::model(&loader, catalog::SHOE).unwrap();
        assert_eq!(cached.bounding_box(cached.root()).center(), Vector3::new(12.0, 1.0, 0.0));
        assert_eq!(showroom.customizable_elements(), vec!["shoe", "shoelace"]);
    }

    #[test]
    fn camera_targets_use_presets_and_element_centres() {
        let (showroom, _registry, _loader) = ready_showroom();

        let laces = showroom.camera_target("shoelace").unwrap();
        assert_eq!(laces.position, SHOELACE_VIEW);
        assert_eq!(laces.target, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(laces.size, Vector3::new(4.0, 2.0, 0.0));
        assert_eq!(showroom.camera_targets().len(), 2);
        assert!(showroom.camera_target("sole").is_none());
    }

    #[test]
    fn element_params_edit_the_showroom_copy() {
        let (showroom, mut registry, loader) = ready_showroom();

        assert_eq!(
            registry.get("shoelace.color"),
            Some(&ParamValue::from("#0000ff"))
        );
        registry.update("shoelace.color", "#ff0000").unwrap();
        registry.update("shoe.roughness", 0.25).unwrap();

        let graph = showroom.model().unwrap().borrow();
        assert_eq!(graph.materials()[1].color().to_hex(), 0xff0000);
        assert_eq!(graph.materials()[0].roughness, 0.25);

        let cached = catalog::model(&loader, catalog::SHOE).unwrap();
        assert_eq!(cached.materials()[1].color().to_hex(), 0x0000ff);
    }

    #[test]
    fn reset_restores_loaded_values() {
        let (showroom, mut registry, _loader) = ready_showroom();
        registry.update("shoe.metalness", 0.8).unwrap();
        registry.update("shoe.color", "#123456").unwrap();

        showroom.reset_element("shoe", &mut registry);

        let defaults = showroom.element_defaults("shoe").unwrap();
        assert_eq!(defaults.color, "#ffffff");
        assert_eq!(registry.get("shoe.color"), Some(&ParamValue::from("#ffffff")));
        let graph = showroom.model().unwrap().borrow();
        assert!((graph.materials()[0].metallic - 0.1).abs() < 1e-6);
    }

    #[test]
    fn progress_parameter_reaches_shader_params() {
        let (mut showroom, mut registry, _loader) = ready_showroom();
        registry.update(defaults::PROGRESS, 0.4).unwrap();
        showroom.update(0.5);

        let params = showroom.shader_params();
        assert_eq!(params.progress, 0.4);
        assert_eq!(params.time, 0.5);
    }

    #[test]
    fn focus_tweens_then_returns_control() {
        let (mut showroom, _registry, _loader) = ready_showroom();

        assert!(showroom.focus_on_element("shoelace", 1.0));
        assert!(!showroom.camera.enabled);

        showroom.update(0.5);
        assert!(showroom.is_animating());
        showroom.update(0.6);

        assert!(!showroom.is_animating());
        assert!(showroom.camera.enabled);
        let eye = showroom.camera.camera.eye;
        assert!((eye - SHOELACE_VIEW).x.abs() < 1e-2);
        assert!((eye - SHOELACE_VIEW).z.abs() < 1e-2);
    }

    #[test]
    fn unknown_focus_target_is_ignored() {
        let (mut showroom, _registry, _loader) = ready_showroom();
        let before = showroom.camera.camera.eye;

        assert!(!showroom.focus_on_element("sole", 1.0));
        assert!(showroom.focus_on_element(OVERVIEW, 0.0));
        showroom.update(0.0);

        assert!(!showroom.is_animating());
        assert_ne!(showroom.camera.camera.eye, before);
    }

    #[test]
    fn bootstrap_texture_applies_to_one_element() {
        let (showroom, _registry, loader) = ready_showroom();
        let water = catalog::texture(&loader, catalog::WATER).unwrap();

        assert!(showroom.apply_texture("shoelace", TextureSlot::Map, water));
        assert!(!showroom.apply_texture(
            "sole",
            TextureSlot::Map,
            catalog::texture(&loader, catalog::WATER).unwrap()
        ));

        let graph = showroom.model().unwrap().borrow();
        assert!(graph.materials()[1].texture(TextureSlot::Map).is_some());
        assert!(graph.materials()[0].texture(TextureSlot::Map).is_none());
    }

    #[test]
    fn missing_model_fails_init() {
        let mut pool = LocalPool::new();
        let loader = LoaderManager::new(Rc::new(EmptyBackend), pool.spawner());
        let mut registry = ParamRegistry::new();
        let mut showroom = Showroom::new(ConfiguratorConfig::default());

        let err = pool
            .run_until(showroom.init(&loader, &mut registry))
            .unwrap_err();

        match err {
            ShowroomError::Assets(e) => assert_eq!(e.kind, AssetErrorKind::ResourceNotFound),
            other => panic!("unexpected error {other}"),
        }
        assert!(!showroom.is_ready());
    }

    #[test]
    fn fallback_view_frames_the_bounds() {
        let bounds = Aabb::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));
        let eye = fallback_view(&bounds, Rad::from(Deg(90.0)), 1.0);

        // tan(45deg) = 1, so the distance is 1.2
        assert!((eye.x - 0.3).abs() < 1e-4);
        assert!((eye.y - 0.6).abs() < 1e-4);
        assert!((eye.z - 1.2 * 0.6 * (std::f32::consts::FRAC_PI_6).cos()).abs() < 1e-4);
    }
}
