//! WGPU rendering for the configurator
//!
//! Owns the surface, a depth buffer, the global uniform and one forward
//! pipeline. The shoe is drawn from a [`GpuModel`] that mirrors the showroom's
//! scene graph; UI is drawn on top through a callback.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use log::{info, warn};
use wgpu::TextureFormat;

use crate::{
    config::RendererConfig,
    gfx::{
        camera::camera_utils::CameraUniform,
        color::Color,
        resources::{
            global_bindings::{GlobalBindings, LightConfig, ShaderParams},
            texture_resource::TextureResource,
            uniform_buffer::uniform_bind_group_layout,
        },
        scene::graph::SceneGraph,
    },
};

use super::{
    gpu_model::GpuModel,
    pipeline_manager::{PipelineConfig, PipelineManager},
};

const MAIN_PIPELINE: &str = "Configurator";

pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    pipeline_manager: PipelineManager,
    global_bindings: GlobalBindings,
    object_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
    light_config: LightConfig,
    background: Color,
    model: Option<GpuModel>,
}

impl RenderEngine {
    /// Creates the device and surface for `window`
    ///
    /// Loads the configurator shader, builds its pipeline and a depth buffer
    /// sized to the window.
    ///
    /// # Arguments
    /// * `window` - Window the surface presents to
    /// * `width` - Initial surface width in physical pixels
    /// * `height` - Initial surface height in physical pixels
    /// * `renderer` - Power preference and background color
    ///
    /// # Returns
    /// The engine, or an error when no adapter or device matches the settings
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        renderer: &RendererConfig,
    ) -> anyhow::Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("failed to create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: renderer.power_preference.into(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable graphics adapter")?;
        info!("Using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to request a device")?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| anyhow!("surface reports no supported formats"))?;
        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let global_bindings = GlobalBindings::new(&device);
        let object_layout = uniform_bind_group_layout(&device, "Object Bind Group Layout");
        let material_layout = uniform_bind_group_layout(&device, "Material Bind Group Layout");

        let device: Arc<wgpu::Device> = device.into();
        let queue: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device.clone());
        pipeline_manager.load_shader("configurator", include_str!("configurator.wgsl"));
        pipeline_manager.register_pipeline(
            MAIN_PIPELINE,
            PipelineConfig::default()
                .with_label("CONFIGURATOR")
                .with_shader("configurator")
                .with_color_format(format)
                .with_depth_format(TextureResource::DEPTH_FORMAT)
                // glTF materials are frequently double sided
                .with_cull_mode(None)
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layout().clone(),
                    object_layout.clone(),
                    material_layout.clone(),
                ]),
        );
        pipeline_manager
            .create_all_pipelines()
            .map_err(|errors| anyhow!("pipeline creation failed: {:?}", errors))?;

        Ok(RenderEngine {
            surface,
            device,
            queue,
            config,
            depth_texture,
            format,
            pipeline_manager,
            global_bindings,
            object_layout,
            material_layout,
            light_config: LightConfig::default(),
            background: renderer.background_color(),
            model: None,
        })
    }

    /// Mirrors `graph` on the GPU, re-uploading only what changed
    pub fn sync_model(&mut self, graph: &SceneGraph) {
        match &mut self.model {
            Some(model) if model.matches(graph) => {
                model.sync(&self.queue, graph);
            }
            _ => {
                self.model = Some(GpuModel::upload(
                    &self.device,
                    graph,
                    &self.object_layout,
                    &self.material_layout,
                ));
            }
        }
    }

    /// Writes the per-frame global uniform
    pub fn update(&mut self, camera_uniform: &CameraUniform, params: ShaderParams) {
        self.global_bindings
            .update(&self.queue, camera_uniform, &self.light_config, params);
    }

    /// Renders the model and then the UI overlay
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    ///
    /// # Arguments
    /// * `ui_callback` - Records the UI pass into the frame's encoder, drawing
    ///   over the finished scene
    pub fn render_frame<F>(&mut self, ui_callback: Option<F>)
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(e) => {
                warn!("Skipping frame: {}", e);
                return;
            }
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let Color { r, g, b } = self.background;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let (Some(pipeline), Some(model)) = (
                self.pipeline_manager.get_pipeline(MAIN_PIPELINE),
                self.model.as_ref(),
            ) {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);
                model.draw(&mut render_pass);
            }
        }

        if let Some(ui_callback) = ui_callback {
            ui_callback(
                &self.device,
                &self.queue,
                &mut encoder,
                &surface_texture_view,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
    }

    /// Resizes the surface and depth buffer; zero sizes are ignored
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    /// Replaces the light rig used from the next [`update`](Self::update)
    pub fn set_light(&mut self, light_config: LightConfig) {
        self.light_config = light_config;
    }

    /// Sets the clear color behind the model
    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    /// Current surface size in physical pixels
    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}
