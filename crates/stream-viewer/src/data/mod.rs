// src/data/mod.rs
//! Data handling modules for the stream viewer.
//!
//! This module provides functionality for:
//! - Decoding streamed point payloads into a flat vertex buffer.
//! - Holding the CPU-side point cloud and its GPU mirror.

pub mod point_cloud;
pub mod types;

// Re-export commonly used types for convenience.
pub use self::point_cloud::{decode_points, PointCloud};
pub use self::types::{PointCloudGpu, PointUniformStd140};
