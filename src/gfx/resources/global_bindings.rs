//! Global uniform bindings for camera, light and shader parameters
//!
//! Bound to group 0 in the configurator pipeline. The layout of
//! [`GlobalUBOContent`] must match `Globals` in `configurator.wgsl`.

use crate::gfx::camera::camera_utils::CameraUniform;

use super::uniform_buffer::{uniform_bind_group, uniform_bind_group_layout, UniformBuffer};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUBOContent {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    /// rgb = light color, w = ambient intensity
    ambient: [f32; 4],
    /// xyz = direction towards the light, w = intensity
    key_light: [f32; 4],
    fill_light: [f32; 4],
    /// xyz = world position, w = intensity
    point_light: [f32; 4],
    /// x = elapsed time, y = progress, zw unused
    params: [f32; 4],
}
// 16 + 64 + 4 * 16 + 16 = 160 bytes

/// A light with a position and a strength
///
/// Directional lights shine from `position` towards the origin.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Light {
    pub position: [f32; 3],
    pub intensity: f32,
}

impl Light {
    pub const fn new(position: [f32; 3], intensity: f32) -> Self {
        Self {
            position,
            intensity,
        }
    }

    fn packed_direction(&self) -> [f32; 4] {
        let [x, y, z] = self.position;
        let length = (x * x + y * y + z * z).sqrt();
        if length <= f32::EPSILON {
            return [0.0, 1.0, 0.0, self.intensity];
        }
        [x / length, y / length, z / length, self.intensity]
    }

    fn packed_position(&self) -> [f32; 4] {
        let [x, y, z] = self.position;
        [x, y, z, self.intensity]
    }
}

/// Showroom lighting: soft ambient, a key and a fill directional light and
/// an overhead point light for highlights. All lights share one color.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LightConfig {
    pub color: [f32; 3],
    pub ambient: f32,
    pub key: Light,
    pub fill: Light,
    pub point: Light,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            ambient: 0.6,
            key: Light::new([5.0, 10.0, 5.0], 0.8),
            fill: Light::new([-5.0, 5.0, -5.0], 0.4),
            point: Light::new([0.0, 8.0, 0.0], 0.5),
        }
    }
}

/// Shader parameters driven by the parameter registry each frame
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ShaderParams {
    pub time: f32,
    pub progress: f32,
}

impl GlobalUBOContent {
    pub fn new(camera: &CameraUniform, light: &LightConfig, params: ShaderParams) -> Self {
        let [r, g, b] = light.color;
        Self {
            view_position: camera.view_position,
            view_proj: camera.view_proj,
            ambient: [r, g, b, light.ambient],
            key_light: light.key.packed_direction(),
            fill_light: light.fill.packed_direction(),
            point_light: light.point.packed_position(),
            params: [params.time, params.progress, 0.0, 0.0],
        }
    }
}

pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

pub struct GlobalBindings {
    ubo: GlobalUBO,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let initial = GlobalUBOContent::new(
            &CameraUniform::default(),
            &LightConfig::default(),
            ShaderParams::default(),
        );
        let ubo = GlobalUBO::new(device, &initial);
        let bind_group_layout = uniform_bind_group_layout(device, "Globals Bind Group Layout");
        let bind_group = uniform_bind_group(device, &bind_group_layout, &ubo, "Globals Bind Group");

        GlobalBindings {
            ubo,
            bind_group_layout,
            bind_group,
        }
    }

    pub fn update(
        &mut self,
        queue: &wgpu::Queue,
        camera: &CameraUniform,
        light: &LightConfig,
        params: ShaderParams,
    ) {
        self.ubo
            .update_content(queue, GlobalUBOContent::new(camera, light, params));
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}
