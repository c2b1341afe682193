/// Contract with the external shading stage
///
/// The shading stage receives an integer texture selector per draw. The core
/// works with [`TextureSelector`] and converts to the integer form only at the
/// sink boundary; the shading side decodes it with [`ShadingMode::from_wire`].
use nalgebra::{Matrix4, Point3};

pub const WIRE_SHOW_NORMAL: i32 = -3;
pub const WIRE_SHOW_COLOR: i32 = -2;
pub const WIRE_SHOW_UV: i32 = -1;

/// What a part's fragments display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSelector {
    /// Debug view of the surface normal
    ShowNormal,
    /// Flat base color
    ShowColor,
    /// Debug view of the UV coordinates
    ShowUv,
    /// Sample the texture bound to this unit
    Sample(u32),
}

impl TextureSelector {
    pub fn to_wire(self) -> i32 {
        match self {
            TextureSelector::ShowNormal => WIRE_SHOW_NORMAL,
            TextureSelector::ShowColor => WIRE_SHOW_COLOR,
            TextureSelector::ShowUv => WIRE_SHOW_UV,
            TextureSelector::Sample(unit) => i32::try_from(unit).unwrap_or(i32::MAX),
        }
    }
}

/// Decoded selector as seen by the shading stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingMode {
    Normal,
    Color,
    Uv,
    Texture(u32),
    /// Selector outside the known range; rendered in [`ERROR_COLOR`]
    ErrorIndicator,
}

/// Color shown for selectors the shading stage does not understand
pub const ERROR_COLOR: [f32; 4] = [1.0, 0.2, 0.2, 1.0];

impl ShadingMode {
    /// Decode a wire selector; `texture_units` is how many units are bound
    pub fn from_wire(selector: i32, texture_units: u32) -> Self {
        match selector {
            WIRE_SHOW_NORMAL => ShadingMode::Normal,
            WIRE_SHOW_COLOR => ShadingMode::Color,
            WIRE_SHOW_UV => ShadingMode::Uv,
            unit if unit >= 0 && (unit as u32) < texture_units => ShadingMode::Texture(unit as u32),
            _ => ShadingMode::ErrorIndicator,
        }
    }
}

/// Light and toggle state owned by the caller and relayed every frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub position: Point3<f32>,
    pub color: [f32; 4],
    pub enabled: bool,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 2.0, 2.0),
            color: [1.0, 1.0, 1.0, 1.0],
            enabled: true,
        }
    }
}

/// Per-frame uniforms shared by every draw of that frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub light_position: Point3<f32>,
    pub light_color: [f32; 4],
    pub camera_position: Point3<f32>,
    pub lighting_enabled: bool,
}

/// Per-draw uniforms for one scene part
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartUniforms {
    pub model: Matrix4<f32>,
    pub normal: Matrix4<f32>,
    /// RGBA, unclamped
    pub color: [f32; 4],
    pub texture: i32,
}
