pub mod camera_controller;
pub mod camera_utils;
pub mod orbit_camera;
pub mod tween;

// Re-export main types
pub use camera_controller::CameraController;
pub use camera_utils::{CameraManager, CameraUniform};
pub use orbit_camera::OrbitCamera;
pub use tween::CameraTween;
