//! Render pipeline creation and caching
//!
//! Shaders and pipeline configurations are registered by name; pipelines are
//! built lazily the first time they are requested.

use std::{collections::HashMap, sync::Arc};

use log::{debug, error};
use thiserror::Error;
use wgpu::*;

use crate::gfx::scene::vertex::Vertex3D;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("shader '{0}' has not been loaded")]
    MissingShader(String),
    #[error("pipeline '{0}' has not been registered")]
    UnknownPipeline(String),
}

/// Everything needed to build one render pipeline
///
/// ```
/// use atelier::gfx::rendering::PipelineConfig;
///
/// let config = PipelineConfig::default()
///     .with_label("Configurator Pipeline")
///     .with_shader("configurator")
///     .with_cull_mode(None)
///     .with_color_format(wgpu::TextureFormat::Rgba8UnormSrgb);
///
/// assert_eq!(config.label, "Configurator Pipeline");
/// assert!(config.cull_mode.is_none());
/// assert_eq!(config.color_targets.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub shader: String,
    pub bind_group_layouts: Vec<BindGroupLayout>,
    pub cull_mode: Option<Face>,
    pub depth_format: Option<TextureFormat>,
    pub color_targets: Vec<Option<ColorTargetState>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: "Default Pipeline".to_string(),
            shader: "configurator".to_string(),
            bind_group_layouts: Vec::new(),
            cull_mode: Some(Face::Back),
            depth_format: None,
            color_targets: vec![Some(ColorTargetState {
                format: TextureFormat::Bgra8Unorm,
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })],
        }
    }
}

impl PipelineConfig {
    /// Sets the label shown in wgpu validation messages
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    /// Sets the shader by the name it was loaded under
    ///
    /// The module must provide `vs_main` and `fs_main`.
    pub fn with_shader(mut self, shader: &str) -> Self {
        self.shader = shader.to_string();
        self
    }

    /// Sets face culling; `None` draws both sides
    pub fn with_cull_mode(mut self, face: Option<Face>) -> Self {
        self.cull_mode = face;
        self
    }

    /// Sets all bind group layouts at once, in group order
    pub fn with_bind_group_layouts(mut self, layouts: Vec<BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }

    /// Enables depth testing against a target of `format`
    pub fn with_depth_format(mut self, format: TextureFormat) -> Self {
        self.depth_format = Some(format);
        self
    }

    /// Single color target in `format`
    pub fn with_color_format(mut self, format: TextureFormat) -> Self {
        self.color_targets = vec![Some(ColorTargetState {
            format,
            blend: Some(BlendState::REPLACE),
            write_mask: ColorWrites::ALL,
        })];
        self
    }
}

/// Named shaders and pipelines for one device
///
/// Configurations are cheap to register; the wgpu pipeline is only built by
/// [`prepare`](Self::prepare) or [`create_all_pipelines`](Self::create_all_pipelines).
pub struct PipelineManager {
    device: Arc<Device>,
    pipelines: HashMap<String, RenderPipeline>,
    pipeline_configs: HashMap<String, PipelineConfig>,
    shader_modules: HashMap<String, ShaderModule>,
}

impl PipelineManager {
    /// Creates an empty manager
    ///
    /// # Arguments
    /// * `device` - Device every shader module and pipeline is created on
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            pipelines: HashMap::new(),
            pipeline_configs: HashMap::new(),
            shader_modules: HashMap::new(),
        }
    }

    /// Compiles a WGSL module and stores it under `name`
    ///
    /// Loading a name twice replaces the module; pipelines already built from
    /// the old one keep using it until they are registered again.
    ///
    /// # Arguments
    /// * `name` - Key used by [`PipelineConfig::shader`]
    /// * `source` - WGSL source text
    pub fn load_shader(&mut self, name: &str, source: &str) {
        let shader_module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });
        self.shader_modules.insert(name.to_string(), shader_module);
    }

    /// Registers a configuration, replacing any built pipeline of the same name
    pub fn register_pipeline(&mut self, name: &str, config: PipelineConfig) {
        self.pipelines.remove(name);
        self.pipeline_configs.insert(name.to_string(), config);
    }

    /// Builds the pipeline if needed
    ///
    /// # Arguments
    /// * `name` - Name the configuration was registered under
    ///
    /// # Returns
    /// `Ok` once the pipeline exists, or the reason it could not be built
    pub fn prepare(&mut self, name: &str) -> Result<(), PipelineError> {
        if self.pipelines.contains_key(name) {
            return Ok(());
        }
        let config = self
            .pipeline_configs
            .get(name)
            .ok_or_else(|| PipelineError::UnknownPipeline(name.to_string()))?;
        let pipeline = self.create_pipeline_from_config(name, config)?;
        debug!("Created pipeline '{}'", name);
        self.pipelines.insert(name.to_string(), pipeline);
        Ok(())
    }

    /// Returns a built pipeline; call [`prepare`](Self::prepare) first
    pub fn get_pipeline(&self, name: &str) -> Option<&RenderPipeline> {
        self.pipelines.get(name)
    }

    /// Builds every registered pipeline, logging the ones that fail
    ///
    /// # Returns
    /// Every error encountered, or `Ok` when all pipelines were built
    pub fn create_all_pipelines(&mut self) -> Result<(), Vec<PipelineError>> {
        let names: Vec<String> = self.pipeline_configs.keys().cloned().collect();
        let errors: Vec<PipelineError> = names
            .iter()
            .filter_map(|name| self.prepare(name).err())
            .inspect(|e| error!("Failed to create pipeline: {}", e))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn create_pipeline_from_config(
        &self,
        name: &str,
        config: &PipelineConfig,
    ) -> Result<RenderPipeline, PipelineError> {
        let shader = self
            .shader_modules
            .get(&config.shader)
            .ok_or_else(|| PipelineError::MissingShader(config.shader.clone()))?;

        let bind_group_layout_refs: Vec<&BindGroupLayout> =
            config.bind_group_layouts.iter().collect();
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some(&format!("{} Layout", name)),
                bind_group_layouts: &bind_group_layout_refs,
                push_constant_ranges: &[],
            });

        let depth_stencil = config.depth_format.map(|format| DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        });

        Ok(self
            .device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(&config.label),
                layout: Some(&pipeline_layout),
                vertex: VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex3D::desc()],
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment: Some(FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    targets: &config.color_targets,
                    compilation_options: PipelineCompilationOptions::default(),
                }),
                primitive: PrimitiveState {
                    topology: PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: FrontFace::Ccw,
                    cull_mode: config.cull_mode,
                    polygon_mode: PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil,
                multisample: MultisampleState::default(),
                multiview: None,
                cache: None,
            }))
    }

    /// Whether a configuration is registered under `name`, built or not
    pub fn has_pipeline(&self, name: &str) -> bool {
        self.pipeline_configs.contains_key(name)
    }
}
