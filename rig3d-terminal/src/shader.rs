/// Software shading stage honouring the texture-selector contract
use nalgebra::{Point3, Vector2, Vector3};
use rig3d_core::shading::{FrameUniforms, PartUniforms, ShadingMode, ERROR_COLOR};

const AMBIENT: f32 = 0.3;
const DIFFUSE: f32 = 0.7;
const SPECULAR: f32 = 0.8;
const SHININESS: i32 = 32;

/// Interpolated inputs for one cell
#[derive(Debug, Clone, Copy)]
pub struct Fragment {
    pub world: Point3<f32>,
    pub normal: Vector3<f32>,
    pub uv: Vector2<f32>,
}

/// Stand-ins for uploaded textures, sampled by UV
#[derive(Debug, Clone, PartialEq)]
pub enum ProceduralTexture {
    /// Vertical blend from `bottom` at v = 0 to `top` at v = 1
    Gradient { bottom: [f32; 3], top: [f32; 3] },
    Checker { tiles: f32, a: [f32; 3], b: [f32; 3] },
    Bricks { rows: f32, brick: [f32; 3], mortar: [f32; 3] },
    Stripes { count: f32, a: [f32; 3], b: [f32; 3] },
}

impl ProceduralTexture {
    pub fn sample(&self, uv: &Vector2<f32>) -> [f32; 3] {
        let (u, v) = (uv.x, uv.y);
        match self {
            ProceduralTexture::Gradient { bottom, top } => lerp(bottom, top, v.clamp(0.0, 1.0)),
            ProceduralTexture::Checker { tiles, a, b } => {
                let cell = (u * tiles).floor() as i64 + (v * tiles).floor() as i64;
                if cell.rem_euclid(2) == 0 {
                    *a
                } else {
                    *b
                }
            }
            ProceduralTexture::Bricks { rows, brick, mortar } => {
                let row = v * rows;
                // every other row is offset by half a brick
                let shift = if (row.floor() as i64).rem_euclid(2) == 0 { 0.0 } else { 0.5 };
                let col = u * rows * 0.5 + shift;
                if row.fract() < 0.12 || col.fract() < 0.06 {
                    *mortar
                } else {
                    *brick
                }
            }
            ProceduralTexture::Stripes { count, a, b } => {
                if (u * count).fract() < 0.5 {
                    *a
                } else {
                    *b
                }
            }
        }
    }
}

fn lerp(a: &[f32; 3], b: &[f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

fn mul(a: &[f32; 3], b: &[f32]) -> [f32; 3] {
    [a[0] * b[0], a[1] * b[1], a[2] * b[2]]
}

/// Phong shading with per-part texture selection
#[derive(Debug, Clone)]
pub struct Shader {
    textures: Vec<ProceduralTexture>,
}

impl Shader {
    pub fn new(textures: Vec<ProceduralTexture>) -> Self {
        Self { textures }
    }

    pub fn texture_units(&self) -> u32 {
        self.textures.len() as u32
    }

    /// Shade one fragment; the result is unclamped RGB
    pub fn shade(&self, fragment: &Fragment, frame: &FrameUniforms, part: &PartUniforms) -> [f32; 3] {
        let normal = fragment.normal.try_normalize(1e-6).unwrap_or_else(Vector3::zeros);
        let base = match ShadingMode::from_wire(part.texture, self.texture_units()) {
            ShadingMode::Normal => {
                return [
                    (normal.x + 1.0) * 0.5,
                    (normal.y + 1.0) * 0.5,
                    (normal.z + 1.0) * 0.5,
                ]
            }
            ShadingMode::Uv => return [fragment.uv.x, fragment.uv.y, 0.0],
            ShadingMode::ErrorIndicator => return [ERROR_COLOR[0], ERROR_COLOR[1], ERROR_COLOR[2]],
            ShadingMode::Color => [part.color[0], part.color[1], part.color[2]],
            ShadingMode::Texture(unit) => {
                mul(&self.textures[unit as usize].sample(&fragment.uv), &part.color)
            }
        };

        if !frame.lighting_enabled {
            return base;
        }

        let to_light = (frame.light_position - fragment.world)
            .try_normalize(1e-6)
            .unwrap_or_else(Vector3::zeros);
        let to_eye = (frame.camera_position - fragment.world)
            .try_normalize(1e-6)
            .unwrap_or_else(Vector3::zeros);
        let n_dot_l = normal.dot(&to_light).max(0.0);
        let reflected = normal * (2.0 * normal.dot(&to_light)) - to_light;
        let specular = if n_dot_l > 0.0 {
            reflected.dot(&to_eye).max(0.0).powi(SHININESS) * SPECULAR
        } else {
            0.0
        };

        let light = &frame.light_color;
        let mut out = [0.0; 3];
        for i in 0..3 {
            out[i] = base[i] * AMBIENT + base[i] * light[i] * n_dot_l * DIFFUSE + light[i] * specular;
        }
        out
    }
}

impl Default for Shader {
    /// One texture per unit the scenery binds: sky, floor, wall, cloth
    fn default() -> Self {
        Self::new(vec![
            ProceduralTexture::Gradient {
                bottom: [0.85, 0.9, 1.0],
                top: [0.2, 0.4, 0.9],
            },
            ProceduralTexture::Checker {
                tiles: 12.0,
                a: [0.9, 0.9, 0.9],
                b: [0.3, 0.3, 0.3],
            },
            ProceduralTexture::Bricks {
                rows: 8.0,
                brick: [0.75, 0.35, 0.25],
                mortar: [0.85, 0.85, 0.8],
            },
            ProceduralTexture::Stripes {
                count: 6.0,
                a: [1.0, 1.0, 1.0],
                b: [0.6, 0.6, 0.6],
            },
        ])
    }
}
