use cgmath::{Matrix4, SquareMatrix, Vector3};
use winit::{
    event::{DeviceEvent, KeyEvent},
    window::Window,
};

use super::{camera_controller::CameraController, orbit_camera::OrbitCamera};
use crate::config::{CameraConfig, ControlsConfig};

/// Camera plus its input controller
///
/// While `enabled` is false (during a scripted camera move) user input is ignored.
pub struct CameraManager {
    pub camera: OrbitCamera,
    pub controller: CameraController,
    pub enabled: bool,
}

impl CameraManager {
    pub fn new(camera: OrbitCamera, controller: CameraController) -> Self {
        Self {
            camera,
            controller,
            enabled: true,
        }
    }

    pub fn from_config(camera: &CameraConfig, controls: &ControlsConfig, aspect: f32) -> Self {
        Self::new(
            OrbitCamera::from_config(camera, controls, aspect),
            CameraController::from_config(controls),
        )
    }

    pub fn process_event(&mut self, event: &DeviceEvent, window: &Window) {
        if self.enabled {
            self.controller.process_events(event, window);
        }
    }

    pub fn process_keyboard_event(&mut self, event: &KeyEvent) {
        if self.enabled {
            self.controller
                .process_keyed_events(event, &mut self.camera);
        }
    }

    /// Applies pending input and refreshes the uniform
    pub fn update(&mut self) {
        if self.enabled {
            self.controller.update(&mut self.camera);
        }
        self.camera.update_view_proj();
    }

    /// Moves the camera directly, discarding pending input
    pub fn look_from(&mut self, eye: Vector3<f32>, target: Vector3<f32>) {
        self.controller.stop();
        self.camera.set_eye_target(eye, target);
    }

    /// Get the view projection matrix from the camera
    pub fn get_view_proj_matrix(&self) -> cgmath::Matrix4<f32> {
        self.camera.build_view_projection_matrix()
    }
}

pub trait Camera: Sized {
    fn build_view_projection_matrix(&self) -> Matrix4<f32>;
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct CameraUniform {
    /// The eye position of the camera in homogenous coordinates.
    ///
    /// Homogenous coordinates are used to fullfill the 16 byte alignment requirement.
    pub view_position: [f32; 4],

    /// Contains the view projection matrix.
    pub view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: convert_matrix4_to_array(Matrix4::identity()),
        }
    }
}

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    matrix4.into()
}
