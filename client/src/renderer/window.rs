use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context;
use pixels::{Pixels, PixelsBuilder, SurfaceTexture, wgpu::TextureFormat};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowAttributes, WindowId},
};

use super::frame::RenderFrame;

pub struct RendererWindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub target_fps: u64,
    pub draw_callback: Box<dyn FnMut(RenderFrame)>,
    pub event_callback: Option<Box<dyn FnMut(&WindowEvent)>>,

    /// Polled after every frame; the window title is updated when the result changes.
    pub title_callback: Option<Box<dyn FnMut() -> String>>,

    /// Polled after every frame; a new logical size is requested when the result changes.
    /// Manual resizes are kept until then.
    pub size_callback: Option<Box<dyn FnMut() -> (u32, u32)>>,
}

pub struct Renderer {
    event_loop: EventLoop<()>,
    window: RendererWindow,
}

impl Renderer {
    pub fn new(config: RendererWindowConfig) -> anyhow::Result<Self> {
        Ok(Self {
            event_loop: EventLoop::new().context("Creating event loop")?,
            window: RendererWindow::new(config),
        })
    }

    pub fn run(mut self) -> anyhow::Result<()> {
        self.event_loop
            .run_app(&mut self.window)
            .context("Running event loop")?;
        Ok(())
    }
}

struct RendererWindow {
    config: RendererWindowConfig,
    resumed_window: Option<ResumedWindow>,
    pacer: FramePacer,
    current_title: String,
    requested_size: (u32, u32),
}

struct ResumedWindow {
    window: Arc<Window>,
    pixels: Pixels<'static>,
}

impl RendererWindow {
    fn new(config: RendererWindowConfig) -> Self {
        let frame_time = Duration::from_micros(1_000_000 / config.target_fps.max(1));

        Self {
            current_title: config.title.clone(),
            requested_size: (config.width, config.height),
            config,
            resumed_window: None,
            pacer: FramePacer {
                frame_time,
                last_frame: None,
            },
        }
    }

    fn open(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<ResumedWindow> {
        let window = Arc::new({
            let window_size = LogicalSize::new(self.config.width as f64, self.config.height as f64);

            event_loop
                .create_window(
                    WindowAttributes::default()
                        .with_title(self.config.title.clone())
                        .with_inner_size(window_size),
                )
                .context("Creating window")?
        });

        let pixels = {
            let window_size = window.inner_size();

            let surface_texture =
                SurfaceTexture::new(window_size.width, window_size.height, window.clone());

            PixelsBuilder::new(window_size.width, window_size.height, surface_texture)
                .texture_format(TextureFormat::Rgba8UnormSrgb)
                .build()
                .context("Creating pixels buffer")?
        };

        Ok(ResumedWindow { window, pixels })
    }
}

impl ApplicationHandler for RendererWindow {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.resumed_window.is_some() {
            return;
        }

        match self.open(event_loop) {
            Ok(resumed_window) => {
                resumed_window.window.request_redraw();
                self.resumed_window = Some(resumed_window);
            }
            Err(e) => {
                log::error!("{e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(ResumedWindow { window, pixels }) = self.resumed_window.as_mut() else {
            return;
        };

        match &event {
            WindowEvent::RedrawRequested => {
                let PhysicalSize { width, height } = window.inner_size();

                let next_frame = RenderFrame {
                    width,
                    height,
                    buffer: pixels.frame_mut(),
                };

                (self.config.draw_callback)(next_frame);

                if let Err(e) = pixels.render() {
                    log::error!("Rendering with pixels failed: {e}");
                    event_loop.exit();
                    return;
                }

                if let Some(title_callback) = &mut self.config.title_callback {
                    let title = title_callback();
                    if title != self.current_title {
                        window.set_title(&title);
                        self.current_title = title;
                    }
                }

                if let Some(size_callback) = &mut self.config.size_callback {
                    let size = size_callback();
                    if size != self.requested_size {
                        let (logical_width, logical_height) = size;

                        // Applied through the Resized event that follows.
                        let _ = window.request_inner_size(LogicalSize::new(
                            logical_width as f64,
                            logical_height as f64,
                        ));
                        self.requested_size = size;
                    }
                }

                self.pacer.wait();
                window.request_redraw();
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                // Minimizing reports a zero size, which pixels rejects.
                if *width > 0 && *height > 0 {
                    let resized = pixels
                        .resize_surface(*width, *height)
                        .and_then(|()| pixels.resize_buffer(*width, *height));

                    if let Err(e) = resized {
                        log::warn!("Couldn't resize pixels buffer: {e}");
                    }
                }

                window.request_redraw();
            }
            WindowEvent::KeyboardInput {
                event: key_event, ..
            } if key_event.state == ElementState::Pressed
                && key_event.logical_key == Key::Named(NamedKey::Escape) =>
            {
                event_loop.exit();
            }
            WindowEvent::CloseRequested => event_loop.exit(),
            _ => {}
        }

        if let Some(event_callback) = &mut self.config.event_callback {
            event_callback(&event);
        }
    }
}

/// Caps the redraw loop at the configured frame rate.
struct FramePacer {
    frame_time: Duration,
    last_frame: Option<Instant>,
}

impl FramePacer {
    fn wait(&mut self) {
        if let Some(last_frame) = self.last_frame {
            let elapsed = last_frame.elapsed();

            if elapsed < self.frame_time {
                spin_sleep::sleep(self.frame_time - elapsed);
            }
        }

        self.last_frame = Some(Instant::now());
    }
}
