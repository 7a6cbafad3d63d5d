use crate::data::types::PointUniformStd140 as PointUniform;
use glam::{Mat4, Vec3};
use std::f32::consts::{PI, TAU};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// Vertical field of view.
pub const FOV_Y_DEG: f32 = 75.0;
/// Near clipping plane; also the closest the orbit may get to its target.
pub const Z_NEAR: f32 = 0.1;
/// Far clipping plane; also the farthest the orbit may get from its target.
pub const Z_FAR: f32 = 1000.0;

/// Keeps the polar angle off the poles so `look_at` never degenerates.
const POLAR_EPS: f32 = 1e-6;

#[derive(Debug, Clone)]
pub struct Camera {
    // --- Orbital Parameters (Primary State) ---
    /// The point the camera orbits around.
    pub target: Vec3,
    /// Distance from the camera to the target.
    pub radius: f32,
    /// Azimuth around +Y (radians); 0 places the camera on the +Z side.
    pub theta: f32,
    /// Polar angle measured from +Y (radians).
    pub phi: f32,

    // --- Derived Properties (Updated by `update()`) ---
    position: Vec3,

    // --- Projection Matrix ---
    pub proj: Mat4,
}

impl Camera {
    /// Places a camera at `position` looking at `target`.
    pub fn new(position: Vec3, target: Vec3, aspect: f32) -> Self {
        let offset = position - target;
        let radius = offset.length();
        let (theta, phi) = if radius > 0.0 {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, PI / 2.0)
        };

        let mut camera = Self {
            target,
            radius,
            theta,
            phi,
            position, // refreshed below
            proj: perspective(aspect),
        };

        camera.update();
        camera
    }

    /// Recalculates the camera position from its orbital parameters, clamping
    /// them into range first. Must be called after any orbital change.
    pub fn update(&mut self) {
        self.phi = self.phi.clamp(POLAR_EPS, PI - POLAR_EPS);
        self.radius = self.radius.clamp(Z_NEAR, Z_FAR);

        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        let offset = Vec3::new(
            self.radius * sin_phi * sin_theta,
            self.radius * cos_phi,
            self.radius * sin_phi * cos_theta,
        );

        self.position = self.target + offset;
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.proj = perspective(aspect);
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj * self.view()
    }

    /// Unit right and up vectors of the camera in world space.
    pub fn screen_axes(&self) -> (Vec3, Vec3) {
        let forward = (self.target - self.position).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward);
        (right, up)
    }

    /// Builds the per-frame point uniform.
    pub fn make_uniform(&self, color: [f32; 3], point_size: f32) -> PointUniform {
        PointUniform {
            view: self.view().to_cols_array_2d(),
            proj: self.proj.to_cols_array_2d(),
            color: [color[0], color[1], color[2], 1.0],
            point_size,
            _pad: [0.0; 3],
        }
    }
}

fn perspective(aspect: f32) -> Mat4 {
    // glam's perspective_rh already targets wgpu's [0, 1] depth range.
    Mat4::perspective_rh(FOV_Y_DEG.to_radians(), aspect.max(1e-3), Z_NEAR, Z_FAR)
}

/// Orbit controls: left drag rotates, right drag pans, wheel zooms.
///
/// Input accumulates into pending deltas; `update` applies a
/// `damping_factor` share of them each frame and decays the rest, so motion
/// eases out over several frames after the mouse stops.
pub struct CameraController {
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,

    rotating: bool,
    panning: bool,
    last_mouse: Option<(f64, f64)>,
    viewport_height: f32,

    delta_theta: f32,
    delta_phi: f32,
    pan_offset: Vec3,
    scale: f32,
}

impl CameraController {
    /// Creates a new controller with default state.
    pub fn new(viewport_height: u32) -> Self {
        Self {
            damping_factor: 0.1,
            rotate_speed: 0.5,
            zoom_speed: 1.0,
            rotating: false,
            panning: false,
            last_mouse: None,
            viewport_height: viewport_height.max(1) as f32,
            delta_theta: 0.0,
            delta_phi: 0.0,
            pan_offset: Vec3::ZERO,
            scale: 1.0,
        }
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        self.viewport_height = height.max(1) as f32;
    }

    /// Handles window events, queuing camera motion for the next `update`.
    pub fn handle_event(&mut self, event: &WindowEvent, camera: &Camera) {
        match event {
            WindowEvent::MouseInput { button, state, .. } => {
                let pressed = *state == ElementState::Pressed;
                match button {
                    MouseButton::Left => self.rotating = pressed,
                    MouseButton::Right => self.panning = pressed,
                    _ => {}
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.handle_cursor((position.x, position.y), camera);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
                };

                self.zoom(scroll);
            }
            _ => {}
        }
    }

    /// Rotates by a screen-space drag of `(dx, dy)` pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        // A drag across the full viewport height turns `rotate_speed` full circles.
        self.delta_theta -= TAU * dx / self.viewport_height * self.rotate_speed;
        self.delta_phi -= TAU * dy / self.viewport_height * self.rotate_speed;
    }

    /// Moves the target so that world points under the cursor follow a drag
    /// of `(dx, dy)` pixels.
    pub fn pan(&mut self, dx: f32, dy: f32, camera: &Camera) {
        let (right, up) = camera.screen_axes();
        let half_height = camera.radius * (FOV_Y_DEG.to_radians() / 2.0).tan();
        let per_pixel = 2.0 * half_height / self.viewport_height;

        self.pan_offset += -right * (dx * per_pixel) + up * (dy * per_pixel);
    }

    /// Positive `lines` (wheel up) moves towards the target.
    pub fn zoom(&mut self, lines: f32) {
        self.scale *= 0.95f32.powf(self.zoom_speed * lines);
    }

    fn handle_cursor(&mut self, xy: (f64, f64), camera: &Camera) {
        if let Some(last) = self.last_mouse {
            let dx = (xy.0 - last.0) as f32;
            let dy = (xy.1 - last.1) as f32;

            if self.rotating {
                self.rotate(dx, dy);
            } else if self.panning {
                self.pan(dx, dy, camera);
            }
        }
        self.last_mouse = Some(xy);
    }

    /// Advances the damping state by one frame and applies it to `camera`.
    /// Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let d = self.damping_factor;
        let before = (camera.position(), camera.target);

        camera.theta += self.delta_theta * d;
        camera.phi += self.delta_phi * d;
        camera.radius *= self.scale;
        camera.target += self.pan_offset * d;
        camera.update();

        self.delta_theta *= 1.0 - d;
        self.delta_phi *= 1.0 - d;
        self.pan_offset *= 1.0 - d;
        self.scale = 1.0;

        before.0.distance_squared(camera.position()) > 1e-12
            || before.1.distance_squared(camera.target) > 1e-12
    }
}
