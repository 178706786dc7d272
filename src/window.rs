use std::{sync::Arc, time::Duration};

use anyhow::Context;
use imgui::{FontConfig, FontSource};
use imgui_winit_support::WinitPlatform;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, Event, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::{
    config::PresentationConfig,
    demo::DemoState,
    engine,
    frame_loop::{CancelHandle, FrameLoop},
    rendering::renderer::Renderer,
};

const WINDOW_TITLE: &str = "scrollstage";

struct ImguiState {
    context: imgui::Context,
    platform: WinitPlatform,
}

struct App {
    renderer: Option<Renderer>,
    demo_state: DemoState,
    imgui: Option<ImguiState>,
    frame_loop: FrameLoop,
    cancel: CancelHandle,
    error: Option<anyhow::Error>,
}

impl App {
    fn from_demo_state(demo_state: DemoState) -> Self {
        let frame_loop = FrameLoop::new();
        let cancel = frame_loop.cancel_handle();

        Self {
            renderer: None,
            demo_state,
            imgui: None,
            frame_loop,
            cancel,
            error: None,
        }
    }

    fn setup_imgui(&mut self, window: &Window) {
        let mut context = imgui::Context::create();
        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(
            context.io_mut(),
            window,
            imgui_winit_support::HiDpiMode::Default,
        );

        let font_size = 14.0;
        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: font_size,
                ..Default::default()
            }),
        }]);

        // The overlay has no state worth persisting
        context.set_ini_filename(None);

        self.imgui = Some(ImguiState { context, platform });
    }

    fn create_renderer(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<Renderer> {
        let window_attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(LogicalSize::new(1280.0, 720.0));
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("Failed to create window")?,
        );

        self.setup_imgui(&window);

        let scale_factor = window.scale_factor();
        let logical: LogicalSize<f32> = window.inner_size().to_logical(scale_factor);
        // A window without area still gets a surface; the first nonzero resize replaces it.
        self.demo_state
            .resize(logical.width, logical.height, scale_factor as f32);
        let size = self.demo_state.viewport.surface_size();

        let imgui = self.imgui.as_mut().context("Imgui is not initialized")?;

        pollster::block_on(Renderer::new(
            window,
            size,
            &self.demo_state.config.stage,
            &self.demo_state.camera,
            &mut imgui.context,
        ))
    }

    fn handle_key(&mut self, key: &Key) {
        let line = self.demo_state.config.page.wheel_line_pixels;
        let scroll = &mut self.demo_state.scroll;

        match key {
            Key::Named(NamedKey::PageDown | NamedKey::Space) => scroll.page_down(),
            Key::Named(NamedKey::PageUp) => scroll.page_up(),
            Key::Named(NamedKey::Home) => scroll.home(),
            Key::Named(NamedKey::End) => scroll.end(),
            Key::Named(NamedKey::ArrowDown) => scroll.scroll_by(line),
            Key::Named(NamedKey::ArrowUp) => scroll.scroll_by(-line),
            Key::Named(NamedKey::Escape) => self.cancel.cancel(),
            Key::Character(c) if c.eq_ignore_ascii_case("m") => {
                self.demo_state.markers_enabled = !self.demo_state.markers_enabled;
            }
            _ => (),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(tick) = self.frame_loop.next_frame() else {
            event_loop.exit();
            return;
        };

        let (Some(renderer), Some(imgui)) = (self.renderer.as_mut(), self.imgui.as_mut()) else {
            return;
        };

        imgui
            .context
            .io_mut()
            .update_delta_time(Duration::from_secs_f32(tick.delta.max(1e-6)));

        if let Err(error) = imgui
            .platform
            .prepare_frame(imgui.context.io_mut(), &renderer.window)
        {
            log::warn!("Failed to prepare overlay frame: {}", error);
        }

        let ui = imgui.context.new_frame();
        engine::update(&mut self.demo_state, tick, ui);
        imgui.platform.prepare_render(ui, &renderer.window);

        match renderer.render(
            &mut self.demo_state.scene,
            &self.demo_state.camera,
            &mut imgui.context,
        ) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                renderer.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of memory");
                self.cancel.cancel();
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timeout");
            }
            Err(other) => {
                log::error!("Unexpected error: {:?}", other);
            }
        }

        renderer.window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        match self.create_renderer(event_loop) {
            Ok(renderer) => {
                renderer.window.request_redraw();
                self.renderer = Some(renderer);
            }
            Err(error) => {
                log::error!("{:#}", error);
                self.error = Some(error);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };

        if let Some(imgui) = self.imgui.as_mut() {
            imgui.platform.handle_event::<()>(
                imgui.context.io_mut(),
                &renderer.window,
                &Event::WindowEvent {
                    window_id,
                    event: event.clone(),
                },
            );
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.cancel.cancel();
                renderer.window.request_redraw();
            }
            WindowEvent::Resized(physical) => {
                let scale_factor = renderer.window.scale_factor();
                let logical: LogicalSize<f32> = physical.to_logical(scale_factor);

                if let Some(size) =
                    self.demo_state
                        .resize(logical.width, logical.height, scale_factor as f32)
                {
                    renderer.resize(size);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => match delta {
                MouseScrollDelta::LineDelta(_, lines) => self.demo_state.scroll_lines(-lines),
                MouseScrollDelta::PixelDelta(position) => {
                    let logical = position.to_logical::<f32>(renderer.window.scale_factor());
                    self.demo_state.scroll.scroll_by(-logical.y);
                }
            },
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                self.handle_key(&event.logical_key);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => (),
        }
    }
}

pub async fn run(config: PresentationConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::from_demo_state(DemoState::new(config));
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
