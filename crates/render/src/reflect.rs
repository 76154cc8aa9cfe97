//! Link-time resolution of uniform and attribute names.
//!
//! Every program shares one uniform block layout, so a uniform's location is
//! its fixed slot in that block. Attributes are the vertex inputs declared as
//! `@location(N) a_Name` in the vertex stage.

use crate::api::{ApiError, AttributeLocation, ProgramSource, UniformLocation};
use std::collections::BTreeMap;

pub const U_MATRIX: &str = "u_Matrix";
pub const U_TIME: &str = "u_Time";
pub const U_TEXTURE_UNIT: &str = "u_TextureUnit";

pub const A_POSITION: &str = "a_Position";
pub const A_COLOR: &str = "a_Color";
pub const A_TEXTURE_COORDINATES: &str = "a_TextureCoordinates";
pub const A_DIRECTION_VECTOR: &str = "a_DirectionVector";
pub const A_PARTICLE_START_TIME: &str = "a_ParticleStartTime";

/// Uniform names in slot order. The index is the [`UniformLocation`].
pub const UNIFORM_SLOTS: [&str; 3] = [U_MATRIX, U_TIME, U_TEXTURE_UNIT];

/// Names a linked program exposes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramReflection {
    uniforms: BTreeMap<String, UniformLocation>,
    attributes: BTreeMap<String, AttributeLocation>,
}

impl ProgramReflection {
    /// Check both entry points exist and collect every declared name.
    pub fn reflect(source: &ProgramSource) -> Result<Self, ApiError> {
        if !source.vertex.contains("fn vs_main") {
            return Err(ApiError::Link {
                label: source.label.clone(),
                message: "vertex stage has no `vs_main` entry point".into(),
            });
        }
        if !source.fragment.contains("fn fs_main") {
            return Err(ApiError::Link {
                label: source.label.clone(),
                message: "fragment stage has no `fs_main` entry point".into(),
            });
        }

        let linked = source.linked();
        let uniforms = UNIFORM_SLOTS
            .iter()
            .enumerate()
            .filter(|(_, name)| contains_identifier(&linked, name))
            .map(|(slot, name)| (name.to_string(), UniformLocation(slot as u32)))
            .collect();

        let attributes = parse_attributes(&source.label, &source.vertex)?;

        Ok(Self {
            uniforms,
            attributes,
        })
    }

    pub fn uniform(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms.get(name).copied()
    }

    pub fn attribute(&self, name: &str) -> Option<AttributeLocation> {
        self.attributes.get(name).copied()
    }

    /// Whether the program reads a texture unit.
    pub fn samples_texture(&self) -> bool {
        self.uniforms.contains_key(U_TEXTURE_UNIT)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, AttributeLocation)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn contains_identifier(haystack: &str, name: &str) -> bool {
    haystack.match_indices(name).any(|(at, _)| {
        let before = haystack[..at].chars().next_back();
        let after = haystack[at + name.len()..].chars().next();
        !before.is_some_and(is_ident_char) && !after.is_some_and(is_ident_char)
    })
}

fn parse_attributes(
    label: &str,
    vertex: &str,
) -> Result<BTreeMap<String, AttributeLocation>, ApiError> {
    const MARKER: &str = "@location(";
    let compile_err = |message: String| ApiError::Compile {
        label: label.to_string(),
        message,
    };

    let mut out = BTreeMap::new();
    let mut rest = vertex;
    while let Some(start) = rest.find(MARKER) {
        rest = &rest[start + MARKER.len()..];
        let close = rest
            .find(')')
            .ok_or_else(|| compile_err("unterminated @location".into()))?;
        let index: u32 = rest[..close]
            .trim()
            .parse()
            .map_err(|_| compile_err(format!("bad location index `{}`", &rest[..close])))?;
        rest = &rest[close + 1..];

        let name: String = rest
            .trim_start()
            .chars()
            .take_while(|c| is_ident_char(*c))
            .collect();
        if !name.starts_with("a_") {
            continue;
        }
        if out.values().any(|loc: &AttributeLocation| loc.0 == index) {
            return Err(compile_err(format!(
                "location {index} bound to more than one attribute"
            )));
        }
        out.insert(name, AttributeLocation(index));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = r#"
struct Uniforms { u_Matrix: mat4x4<f32>, u_Time: f32 };
struct VertexInput {
    @location(0) a_Position: vec4<f32>,
    @location(3) a_Color: vec3<f32>,
};
struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) v_Color: vec3<f32>,
};
@vertex
fn vs_main(in: VertexInput) -> VertexOutput { }
"#;

    #[test]
    fn resolves_attributes_and_uniform_slots() {
        let src = ProgramSource::new("color", VERTEX, "@fragment fn fs_main() {}");
        let r = ProgramReflection::reflect(&src).unwrap();
        assert_eq!(r.attribute(A_POSITION), Some(AttributeLocation(0)));
        assert_eq!(r.attribute(A_COLOR), Some(AttributeLocation(3)));
        assert_eq!(r.attribute("v_Color"), None);
        assert_eq!(r.uniform(U_MATRIX), Some(UniformLocation(0)));
        assert_eq!(r.uniform(U_TIME), Some(UniformLocation(1)));
        assert!(!r.samples_texture());
    }

    #[test]
    fn missing_entry_point_fails_link() {
        let src = ProgramSource::new("broken", VERTEX, "fn main() {}");
        let err = ProgramReflection::reflect(&src).unwrap_err();
        assert!(matches!(err, ApiError::Link { .. }));
    }

    #[test]
    fn duplicate_location_fails_compile() {
        let vertex = "@location(1) a_Position: vec4<f32>, @location(1) a_Color: vec3<f32>, fn vs_main() {}";
        let src = ProgramSource::new("dup", vertex, "fn fs_main() {}");
        let err = ProgramReflection::reflect(&src).unwrap_err();
        assert!(matches!(err, ApiError::Compile { .. }));
    }

    #[test]
    fn identifier_match_respects_word_boundaries() {
        assert!(contains_identifier("x.u_Time * 2", "u_Time"));
        assert!(!contains_identifier("u_TimeScale", "u_Time"));
    }
}
