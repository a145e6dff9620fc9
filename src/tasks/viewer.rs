use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use rand::rngs::StdRng;
use softbuffer::{Context as SoftContext, Surface};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    window::{Fullscreen, Window, WindowAttributes, WindowId},
};

use crate::canvas::font::load_caption_font;
use crate::canvas::raster::PixelCanvas;
use crate::config::Configuration;
use crate::events::{AppEvent, InputEvent, Tick};
use crate::media::ConfiguredDevices;
use crate::session::{CaptureOutcome, Session, SessionOptions};
use crate::tapestry::TapestryRenderer;
use crate::view;

use super::capture_timer::IntervalScheduler;
use super::{initial_source, seeded_rng};

type WindowHandle = Arc<Window>;
type ProxyScheduler = IntervalScheduler<EventLoopProxy<AppEvent>>;

struct ViewerApp {
    cfg: Configuration,
    cancel: CancellationToken,
    window: Option<WindowHandle>,
    context: Option<SoftContext<WindowHandle>>,
    surface: Option<Surface<WindowHandle, WindowHandle>>,
    canvas: PixelCanvas,
    renderer: TapestryRenderer,
    session: Session<ProxyScheduler>,
    devices: ConfiguredDevices,
    rng: StdRng,
    frame_interval: Duration,
    next_frame_at: Instant,
}

impl ViewerApp {
    fn new(cfg: Configuration, cancel: CancellationToken, scheduler: ProxyScheduler) -> Self {
        let font = match load_caption_font() {
            Ok(font) => Some(font),
            Err(err) => {
                warn!(error = ?err, "no caption font; overlays will be drawn without text");
                None
            }
        };
        let session = Session::new(
            SessionOptions::from_config(&cfg),
            initial_source(&cfg),
            scheduler,
            Tick::now(),
        );
        Self {
            canvas: PixelCanvas::new(cfg.window.width, cfg.window.height).with_font(font),
            renderer: TapestryRenderer::new(cfg.tapestry.clone()),
            devices: ConfiguredDevices::from_config(&cfg),
            rng: seeded_rng(cfg.seed),
            frame_interval: cfg.window.frame_interval(),
            next_frame_at: Instant::now(),
            session,
            cfg,
            cancel,
            window: None,
            context: None,
            surface: None,
        }
    }

    fn ensure_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        if self.window.is_some() {
            return Ok(());
        }

        let mut attrs = WindowAttributes::default()
            .with_title(self.cfg.window.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.cfg.window.width,
                self.cfg.window.height,
            ));
        if self.cfg.window.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        let window = WindowHandle::new(
            event_loop
                .create_window(attrs)
                .context("failed to create viewer window")?,
        );

        let context = SoftContext::new(window.clone())
            .map_err(|err| anyhow!("failed to create softbuffer context: {err:?}"))?;
        let surface = Surface::new(&context, window.clone())
            .map_err(|err| anyhow!("failed to create softbuffer surface: {err:?}"))?;

        self.context = Some(context);
        self.surface = Some(surface);
        let size = window.inner_size();
        self.window = Some(window);
        self.handle_resize(size);
        info!(
            width = size.width,
            height = size.height,
            fullscreen = self.cfg.window.fullscreen,
            "viewer window created"
        );
        Ok(())
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        let (width, height) = (size.width.max(1), size.height.max(1));
        if let Some(surface) = self.surface.as_mut() {
            if let (Some(w), Some(h)) = (NonZeroU32::new(width), NonZeroU32::new(height)) {
                if let Err(err) = surface.resize(w, h) {
                    warn!(error = ?err, "failed to resize softbuffer surface");
                }
            }
        }
        self.canvas.resize(width, height);
        debug!(width, height, "viewer surface resized");
        self.request_redraw();
    }

    fn request_redraw(&self) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn draw(&mut self) {
        let tick = Tick::now();
        self.session.frame_tick(tick);

        let source = self.session.source().clone();
        let t = self.session.animation_time();
        self.renderer.render(
            &mut self.canvas,
            &source,
            self.session.pan(),
            t,
            &mut self.rng,
        );
        view::draw_overlay(
            &mut self.canvas,
            &mut self.session,
            self.renderer.thread_counts(),
            tick.at,
        );

        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        match surface.buffer_mut() {
            Ok(mut buffer) => {
                let pixels = self.canvas.pixels();
                if buffer.len() == pixels.len() {
                    buffer.copy_from_slice(pixels);
                } else {
                    let len = buffer.len().min(pixels.len());
                    buffer[..len].copy_from_slice(&pixels[..len]);
                    debug!(
                        surface = buffer.len(),
                        canvas = pixels.len(),
                        "surface and canvas sizes disagree"
                    );
                }
                if let Err(err) = buffer.present() {
                    error!(error = ?err, "softbuffer present error");
                }
            }
            Err(err) => error!(error = ?err, "softbuffer buffer access error"),
        }
    }

    fn input(&mut self, event: InputEvent) {
        self.session
            .handle_input(event, &mut self.devices, Tick::now());
    }
}

impl ApplicationHandler<AppEvent> for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.cancel.is_cancelled() {
            event_loop.exit();
            return;
        }
        if let Err(err) = self.ensure_window(event_loop) {
            error!(error = ?err, "failed to initialize viewer window");
            event_loop.exit();
            return;
        }
        self.next_frame_at = Instant::now();
        self.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                info!("viewer window close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = window.inner_size();
                self.handle_resize(size);
            }
            WindowEvent::RedrawRequested => self.draw(),
            other => {
                if let Some(input) = input_event(&other) {
                    self.input(input);
                }
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame_at {
            self.request_redraw();
            self.next_frame_at += self.frame_interval;
            if self.next_frame_at < now {
                // Fell behind; pace from now instead of bursting.
                self.next_frame_at = now + self.frame_interval;
            }
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame_at));
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::CaptureTick(id) => {
                if let CaptureOutcome::Finished = self.session.on_timer(id, Tick::now()) {
                    self.request_redraw();
                }
            }
            AppEvent::Cancelled => {
                info!("viewer received cancellation event");
                event_loop.exit();
            }
        }
    }
}

/// Pointer and keyboard events the session cares about. Every mouse button
/// presses; key repeats are dropped.
fn input_event(event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::CursorMoved { position, .. } => Some(InputEvent::PointerMoved {
            x: position.x as f32,
            y: position.y as f32,
        }),
        WindowEvent::MouseInput { state, .. } => Some(match state {
            ElementState::Pressed => InputEvent::PointerPressed,
            ElementState::Released => InputEvent::PointerReleased,
        }),
        WindowEvent::KeyboardInput { event, .. }
            if event.state == ElementState::Pressed && !event.repeat =>
        {
            Some(InputEvent::KeyPressed)
        }
        _ => None,
    }
}

/// Runs the session window on the calling thread until it is closed or
/// `cancel` fires. Must be called from inside a tokio runtime; capture
/// timers are spawned onto it.
pub fn run_windowed(cfg: Configuration, cancel: CancellationToken) -> Result<()> {
    let event_loop = EventLoop::<AppEvent>::with_user_event()
        .build()
        .context("failed to build viewer event loop")?;
    let proxy = event_loop.create_proxy();

    let cancel_task = {
        let cancel = cancel.clone();
        let proxy = proxy.clone();
        tokio::spawn(async move {
            cancel.cancelled().await;
            let _ = proxy.send_event(AppEvent::Cancelled);
        })
    };

    let scheduler = IntervalScheduler::new(Handle::current(), proxy, cancel.child_token());
    let mut app = ViewerApp::new(cfg, cancel, scheduler);
    let run_result = event_loop.run_app(&mut app);
    cancel_task.abort();

    run_result.context("viewer event loop failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;
    use winit::event::{DeviceId, MouseButton};

    fn mouse(state: ElementState, button: MouseButton) -> WindowEvent {
        WindowEvent::MouseInput {
            // SAFETY: only compared, never handed back to the platform.
            device_id: unsafe { DeviceId::dummy() },
            state,
            button,
        }
    }

    #[test]
    fn every_mouse_button_presses() {
        for button in [
            MouseButton::Left,
            MouseButton::Right,
            MouseButton::Middle,
            MouseButton::Other(7),
        ] {
            assert_eq!(
                input_event(&mouse(ElementState::Pressed, button)),
                Some(InputEvent::PointerPressed)
            );
            assert_eq!(
                input_event(&mouse(ElementState::Released, button)),
                Some(InputEvent::PointerReleased)
            );
        }
    }

    #[test]
    fn cursor_moves_become_pointer_positions() {
        let event = WindowEvent::CursorMoved {
            // SAFETY: as above.
            device_id: unsafe { DeviceId::dummy() },
            position: PhysicalPosition::new(12.5, 40.0),
        };
        assert_eq!(
            input_event(&event),
            Some(InputEvent::PointerMoved { x: 12.5, y: 40.0 })
        );
        assert_eq!(input_event(&WindowEvent::Focused(true)), None);
    }
}
