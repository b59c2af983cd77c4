//! ImGui integration
//!
//! Owns the ImGui context, the winit platform glue and the wgpu renderer that
//! draws panels on top of the model.

use imgui::{Context, FontConfig, FontSource, MouseCursor};
use imgui_wgpu::{Renderer, RendererConfig};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use log::warn;
use std::time::Instant;
use wgpu::{CommandEncoder, Device, Queue, TextureFormat, TextureView};
use winit::{
    event::{Event, WindowEvent},
    window::Window,
};

const FONT_SIZE: f32 = 18.0;

pub struct UiManager {
    pub context: Context,
    platform: WinitPlatform,
    renderer: Renderer,
    last_frame: Instant,
    last_cursor: Option<MouseCursor>,
}

impl UiManager {
    /// Sets up ImGui for `window`, rendering into `output_color_format`
    ///
    /// DPI is locked to 1.0; display size is kept in physical pixels through
    /// [`update_display_size`](Self::update_display_size). No `imgui.ini` is
    /// written, so panel layout resets on every launch.
    ///
    /// # Arguments
    /// * `device` - Device the ImGui renderer allocates its buffers on
    /// * `queue` - Queue used to upload the font atlas
    /// * `output_color_format` - Format of the surface the panels are drawn into
    /// * `window` - Window whose events and cursor ImGui follows
    pub fn new(
        device: &Device,
        queue: &Queue,
        output_color_format: TextureFormat,
        window: &Window,
    ) -> Self {
        let mut context = Context::create();
        context.set_ini_filename(None);

        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(context.io_mut(), window, HiDpiMode::Locked(1.0));

        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: FONT_SIZE,
                ..Default::default()
            }),
        }]);

        let renderer_config = RendererConfig {
            texture_format: output_color_format,
            ..Default::default()
        };
        let renderer = Renderer::new(&mut context, device, queue, renderer_config);

        Self {
            context,
            platform,
            renderer,
            last_frame: Instant::now(),
            last_cursor: None,
        }
    }

    /// Tells ImGui the size of the surface in physical pixels
    ///
    /// # Arguments
    /// * `width` - Surface width
    /// * `height` - Surface height
    pub fn update_display_size(&mut self, width: u32, height: u32) {
        self.context.io_mut().display_size = [width as f32, height as f32];
    }

    /// Whether the panels currently want mouse or keyboard input
    pub fn wants_input(&self) -> bool {
        let io = self.context.io();
        io.want_capture_mouse || io.want_capture_keyboard
    }

    /// Feeds a window event to ImGui
    ///
    /// Only pointer, keyboard and focus events are forwarded.
    ///
    /// # Arguments
    /// * `window` - Window the event belongs to
    /// * `event` - Event to forward
    ///
    /// # Returns
    /// True when a panel is under the pointer or has keyboard focus, in which
    /// case the event should not reach the camera
    pub fn handle_input<T>(&mut self, window: &Window, event: &Event<T>) -> bool {
        match event {
            Event::WindowEvent {
                event: window_event,
                ..
            } => match window_event {
                WindowEvent::CursorMoved { .. }
                | WindowEvent::MouseInput { .. }
                | WindowEvent::MouseWheel { .. }
                | WindowEvent::KeyboardInput { .. }
                | WindowEvent::Focused(_) => {
                    self.platform
                        .handle_event(self.context.io_mut(), window, event);
                    self.wants_input()
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// Starts a new ImGui frame and builds the panels into it
    ///
    /// Call once per frame before [`render_display_only`](Self::render_display_only).
    ///
    /// # Arguments
    /// * `window` - Window used to sync the mouse cursor
    /// * `run_ui` - Draws the panels for this frame
    ///
    /// # Returns
    /// True if ImGui wants mouse or keyboard input after this frame
    pub fn update_logic<F>(&mut self, window: &Window, run_ui: F) -> bool
    where
        F: FnOnce(&imgui::Ui),
    {
        let now = Instant::now();
        self.context
            .io_mut()
            .update_delta_time(now - self.last_frame);
        self.last_frame = now;

        if let Err(e) = self.platform.prepare_frame(self.context.io_mut(), window) {
            warn!("Failed to prepare UI frame: {}", e);
        }

        let ui = self.context.frame();
        run_ui(ui);

        if self.last_cursor != ui.mouse_cursor() {
            self.last_cursor = ui.mouse_cursor();
            self.platform.prepare_render(ui, window);
        }

        self.wants_input()
    }

    /// Renders the frame built by the last [`update_logic`](Self::update_logic)
    ///
    /// The attachment is loaded, not cleared, so the panels sit on top of the
    /// model. Render errors are logged and the frame continues.
    ///
    /// # Arguments
    /// * `device` - Device owning the renderer's buffers
    /// * `queue` - Queue for vertex and index uploads
    /// * `encoder` - Encoder the UI pass is recorded into
    /// * `color_attachment` - Surface view already holding the scene
    pub fn render_display_only(
        &mut self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        color_attachment: &TextureView,
    ) {
        let draw_data = self.context.render();
        if draw_data.display_size[0] <= 0.0 || draw_data.display_size[1] <= 0.0 {
            return;
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("imgui_render_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_attachment,
                resolve_target: None,
                ops: wgpu::Operations {
                    // keep the model underneath
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let Err(e) = self
            .renderer
            .render(draw_data, queue, device, &mut render_pass)
        {
            warn!("Failed to render UI: {:?}", e);
        }
    }
}
