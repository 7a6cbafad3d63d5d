// src/lib.rs
//! Live 3D point cloud viewer fed by a WebSocket stream.
//!
//! A network thread reads JSON point arrays from the socket and hands them to
//! the render thread, which replaces the GPU vertex buffer and redraws every
//! frame through an orbiting camera.

pub mod app;
pub mod camera;
pub mod config;
pub mod data;
pub mod error;
pub mod net;
pub mod renderer;
pub mod stream;
pub mod ui;
pub mod watch;
