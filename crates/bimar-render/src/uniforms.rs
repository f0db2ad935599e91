//! GPU uniform layouts shared with `shaders/scene.wgsl`.

use bimar_core::{Camera, Material, Mat4, Shading};

/// Maximum number of directional lights the shader evaluates.
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

/// Specular strength of Phong materials.
const SPECULAR_STRENGTH: f32 = 0.067;

/// Camera uniforms for GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
}

impl CameraUniforms {
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            camera_pos: camera.position.extend(1.0).to_array(),
        }
    }
}

impl Default for CameraUniforms {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            camera_pos: [0.0, 0.0, 5.0, 1.0],
        }
    }
}

/// Scene lighting: ambient term plus up to [`MAX_DIRECTIONAL_LIGHTS`] directional lights.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniforms {
    /// Ambient color premultiplied by intensity.
    pub ambient: [f32; 4],
    /// Unit vectors pointing toward each light.
    pub directions: [[f32; 4]; MAX_DIRECTIONAL_LIGHTS],
    /// Light colors premultiplied by intensity.
    pub colors: [[f32; 4]; MAX_DIRECTIONAL_LIGHTS],
    /// `x` holds the number of directional lights in use.
    pub count: [u32; 4],
}

/// Per-draw uniforms, bound with a dynamic offset.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniforms {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    /// RGB and alpha.
    pub color: [f32; 4],
    /// `x`: shininess, `y`: specular strength (0 for non-Phong materials).
    pub params: [f32; 4],
}

impl DrawUniforms {
    pub fn new(model: Mat4, material: &Material) -> Self {
        let normal = model.inverse().transpose();
        let (shininess, specular) = match material.shading {
            Shading::Phong { shininess } => (shininess, SPECULAR_STRENGTH),
            Shading::Standard => (1.0, 0.0),
        };
        let rgb = material.color.to_array();
        Self {
            model: model.to_cols_array_2d(),
            normal: normal.to_cols_array_2d(),
            color: [rgb[0], rgb[1], rgb[2], material.alpha()],
            params: [shininess, specular, 0.0, 0.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bimar_core::{Color, Vec3};

    #[test]
    fn test_uniform_sizes_match_shader() {
        assert_eq!(std::mem::size_of::<CameraUniforms>(), 80);
        assert_eq!(std::mem::size_of::<LightUniforms>(), 16 + 64 + 64 + 16);
        assert_eq!(std::mem::size_of::<DrawUniforms>(), 160);
    }

    #[test]
    fn test_draw_uniforms_alpha_and_specular() {
        let transparent = Material::transparent_standard(Color::WHITE, 0.8);
        let u = DrawUniforms::new(Mat4::IDENTITY, &transparent);
        assert!((u.color[3] - 0.8).abs() < 1e-6);
        assert_eq!(u.params[1], 0.0);

        let phong = Material::phong(Color::from_hex(0xad4000));
        let u = DrawUniforms::new(Mat4::from_translation(Vec3::X), &phong);
        assert!((u.color[3] - 1.0).abs() < 1e-6);
        assert!((u.params[0] - 30.0).abs() < 1e-6);
        assert!(u.params[1] > 0.0);
    }
}
