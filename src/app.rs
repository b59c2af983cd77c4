use std::{cell::RefCell, rc::Rc, sync::Arc, time::Instant};

use anyhow::Context;
use futures::{executor::LocalPool, task::LocalSpawnExt};
use log::{error, info};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, Event, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    assets::{catalog, AssetError, FsBackend, LoaderManager},
    config::{ConfiguratorConfig, RuntimeFlags},
    gfx::RenderEngine,
    params::ParamRegistry,
    showroom::Showroom,
    ui::{debug_panel, CustomizationPanel, UiManager},
};

type BootstrapResult = Rc<RefCell<Option<Result<(), AssetError>>>>;

pub struct ConfiguratorApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    pool: LocalPool,
    loader: LoaderManager,
    registry: ParamRegistry,
    showroom: Showroom,
    panel: CustomizationPanel,
    bootstrap: BootstrapResult,
    show_debug_panel: bool,
    last_frame: Instant,
}

impl ConfiguratorApp {
    /// Creates the event loop and starts loading the shoe in the background
    pub fn new(config: ConfiguratorConfig, flags: &RuntimeFlags) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("failed to create event loop")?;

        let pool = LocalPool::new();
        let loader = LoaderManager::new(
            Rc::new(FsBackend::new(config.assets.root.clone())),
            pool.spawner(),
        );

        let bootstrap: BootstrapResult = Rc::new(RefCell::new(None));
        let batch = loader.submit_with_progress(&catalog::bootstrap_requests(), |progress| {
            info!(
                "Loading assets: {}/{} ({:.0}%)",
                progress.loaded,
                progress.total,
                progress.fraction * 100.0
            );
        });
        let slot = bootstrap.clone();
        pool.spawner()
            .spawn_local(async move {
                let result = batch.await;
                *slot.borrow_mut() = Some(result);
            })
            .context("failed to spawn the asset bootstrap")?;

        let show_debug_panel = flags.debug || config.debug.enabled;

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                window: None,
                render_engine: None,
                ui_manager: None,
                pool,
                loader,
                registry: ParamRegistry::new(),
                showroom: Showroom::new(config),
                panel: CustomizationPanel::new(),
                bootstrap,
                show_debug_panel,
                last_frame: Instant::now(),
            },
        })
    }

    /// Runs the event loop until the window closes
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .context("event loop already consumed")?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop
            .run_app(&mut self.app_state)
            .context("event loop terminated with an error")
    }
}

impl AppState {
    /// Drives pending loads and finishes the scene once the bootstrap batch lands
    fn poll_assets(&mut self) {
        self.pool.run_until_stalled();

        let finished = self.bootstrap.borrow_mut().take();
        match finished {
            Some(Ok(())) => {
                if let Err(e) = self.showroom.setup(&self.loader, &mut self.registry) {
                    error!("Failed to set up the showroom: {}", e);
                }
            }
            Some(Err(e)) => error!("{}", e),
            None => {}
        }
    }

    fn redraw(&mut self) {
        let (Some(render_engine), Some(window)) = (self.render_engine.as_mut(), self.window.as_ref())
        else {
            return;
        };

        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.showroom.update(dt);
        if let Some(model) = self.showroom.model() {
            render_engine.sync_model(&model.borrow());
        }
        render_engine.update(
            &self.showroom.camera.camera.uniform,
            self.showroom.shader_params(),
        );

        let Some(ui_manager) = self.ui_manager.as_mut() else {
            render_engine.render_frame(
                None::<fn(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView)>,
            );
            return;
        };

        let showroom = &mut self.showroom;
        let registry = &mut self.registry;
        let panel = &mut self.panel;
        let show_debug_panel = self.show_debug_panel;
        ui_manager.update_logic(window, |ui| {
            panel.draw(ui, showroom, registry);
            if show_debug_panel {
                debug_panel(ui, registry);
            }
        });

        render_engine.render_frame(Some(
            |device: &wgpu::Device,
             queue: &wgpu::Queue,
             encoder: &mut wgpu::CommandEncoder,
             view: &wgpu::TextureView| {
                ui_manager.render_display_only(device, queue, encoder, view);
            },
        ));
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(
            WindowAttributes::default()
                .with_title("Atelier")
                .with_inner_size(winit::dpi::LogicalSize::new(1200, 800)),
        ) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let (width, height) = window.inner_size().into();
        let renderer_config = self.showroom.config().renderer.clone();
        let target = window.clone();
        let renderer = match pollster::block_on(RenderEngine::new(
            target,
            width,
            height,
            &renderer_config,
        )) {
            Ok(renderer) => renderer,
            Err(e) => {
                error!("Failed to initialise rendering: {:#}", e);
                event_loop.exit();
                return;
            }
        };

        let mut ui_manager = UiManager::new(
            renderer.device(),
            renderer.queue(),
            renderer.surface_format(),
            &window,
        );
        ui_manager.update_display_size(width, height);
        self.showroom.resize(width, height);

        self.ui_manager = Some(ui_manager);
        self.render_engine = Some(renderer);
        self.window = Some(window);
        self.last_frame = Instant::now();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        if let Some(ui_manager) = self.ui_manager.as_mut() {
            let ui_event: Event<()> = Event::WindowEvent {
                window_id,
                event: event.clone(),
            };
            if ui_manager.handle_input(&window, &ui_event) {
                window.request_redraw();
                return;
            }
        }

        match event {
            WindowEvent::KeyboardInput {
                event: key_event, ..
            } => {
                if key_event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                    event_loop.exit();
                    return;
                }
                self.showroom.camera.process_keyboard_event(&key_event);
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.showroom.resize(width, height);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => (),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if self
            .ui_manager
            .as_ref()
            .is_some_and(UiManager::wants_input)
        {
            return;
        }
        self.showroom.camera.process_event(&event, window);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        self.poll_assets();
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
