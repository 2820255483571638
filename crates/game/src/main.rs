//! OpenBridge - the main-screen 3D viewport of a starship bridge simulator.

mod config;
mod scenario;
mod state;
mod viewport;

use anyhow::Result;
use state::GameState;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

/// Application handler for winit.
struct App {
    state: Option<GameState>,
}

impl App {
    fn new() -> Self {
        Self { state: None }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_none() {
            let config = config::GameConfig::load();
            let window_attrs = Window::default_attributes()
                .with_title("OpenBridge")
                .with_inner_size(winit::dpi::LogicalSize::new(
                    config.window_width,
                    config.window_height,
                ));

            let window = match event_loop.create_window(window_attrs) {
                Ok(w) => Arc::new(w),
                Err(e) => {
                    log::error!("Failed to create window: {}", e);
                    event_loop.exit();
                    return;
                }
            };

            match pollster::block_on(GameState::new(window.clone())) {
                Ok(s) => {
                    self.state = Some(s);
                    window.request_redraw();
                }
                Err(e) => {
                    log::error!("Failed to initialize: {}", e);
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(state) = &mut self.state {
            if state.handle_window_event(event) || !state.running {
                event_loop.exit();
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("OpenBridge main screen");
    println!("  W/S  - impulse ahead / astern     A/D - rudder");
    println!("  Arrows - look around              T   - cycle target lock");
    println!("  C/H/G  - callsigns / headings / space dust");
    println!("  Escape - quit");

    log::info!("Starting OpenBridge");

    let event_loop = EventLoop::new()?;
    // Poll keeps redraws flowing; Wait would stall the frame loop until the
    // next input event.
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app)?;

    Ok(())
}
