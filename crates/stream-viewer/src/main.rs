//! Entry point for the Stream Viewer application.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use stream_viewer::{app::App, config::Config, net, stream, watch};
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

fn main() -> Result<()> {
    // Initialize logging; default to "info" if RUST_LOG is unset.
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    let config = Config::parse();
    log::info!("Viewer starting with {:?}", config);

    // The socket lives on its own thread and only talks to us through the inbox.
    let (tx, inbox) = stream::channel();
    let file_points = tx.point_slot();
    let _network = net::spawn_network(config.url.clone(), config.request.clone(), tx);

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Point Stream Viewer")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720))
            .build(&event_loop)?,
    );

    // Initialise the application (async → sync).
    let mut app = pollster::block_on(App::new(window.clone(), &config, inbox))?;

    if let Some(path) = &config.preload {
        if let Err(err) = app.preload(path) {
            log::error!("Failed to preload points: {:#}", err);
        }
    }

    // Kept alive for the whole event loop; dropping it stops the reloads.
    let _watcher = match (&config.preload, config.watch) {
        (Some(path), true) => match watch::watch_points_file(path.clone(), file_points) {
            Ok(watcher) => Some(watcher),
            Err(err) => {
                log::error!("Failed to watch {}: {}", path.display(), err);
                None
            }
        },
        _ => None,
    };

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => {
                // Forward events to the app; handle unconsumed window events.
                if !app.handle_event(&window, &event) {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::KeyboardInput { event, .. } => {
                            if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                                elwt.exit();
                            }
                        }
                        WindowEvent::RedrawRequested => match app.render(&window) {
                            Ok(()) => {}
                            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                app.renderer.gfx.reconfigure();
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                log::error!("WGPU out of memory – exiting.");
                                elwt.exit();
                            }
                            Err(e) => log::error!("Render error: {:?}", e),
                        },
                        _ => {}
                    }
                }
            }
            Event::AboutToWait => {
                // Redraw every frame whether or not new points arrived.
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
