//! Shader program wrappers.
//!
//! A program is built in two phases: construction only stores source and the
//! names it needs, [`ShaderProgram::initialize`] compiles, links and resolves
//! every name once. Using a program before that is an error rather than an
//! implicit compile.

use crate::error::ProgramError;
use glam::Mat4;
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use vista_assets::{AssetError, AssetSource, names};
use vista_render::reflect::{
    A_COLOR, A_DIRECTION_VECTOR, A_PARTICLE_START_TIME, A_POSITION, A_TEXTURE_COORDINATES,
    U_MATRIX, U_TEXTURE_UNIT, U_TIME,
};
use vista_render::{
    AttributeLocation, GraphicsApi, ProgramId, ProgramSource, TextureId, UniformLocation,
};

/// Texture unit every textured program samples from.
pub const TEXTURE_UNIT: u32 = 0;

#[derive(Debug)]
struct Linked {
    id: ProgramId,
    uniforms: BTreeMap<&'static str, UniformLocation>,
    attributes: BTreeMap<&'static str, AttributeLocation>,
}

/// A vertex + fragment program and the locations it resolved at link time.
#[derive(Debug)]
pub struct ShaderProgram {
    source: ProgramSource,
    uniform_names: &'static [&'static str],
    attribute_names: &'static [&'static str],
    linked: Option<Linked>,
}

impl ShaderProgram {
    pub fn new(
        source: ProgramSource,
        uniform_names: &'static [&'static str],
        attribute_names: &'static [&'static str],
    ) -> Self {
        Self {
            source,
            uniform_names,
            attribute_names,
            linked: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.source.label
    }

    pub fn is_ready(&self) -> bool {
        self.linked.is_some()
    }

    pub fn id(&self) -> Option<ProgramId> {
        self.linked.as_ref().map(|l| l.id)
    }

    /// Compile, link and resolve every declared name. A second call is a
    /// no-op.
    pub fn initialize(&mut self, api: &mut dyn GraphicsApi) -> Result<(), ProgramError> {
        if self.linked.is_some() {
            return Ok(());
        }
        let id = api.create_program(&self.source)?;
        match self.resolve(api, id) {
            Ok(linked) => {
                tracing::debug!(program = %self.source.label, id = id.0, "program linked");
                self.linked = Some(linked);
                Ok(())
            }
            Err(err) => {
                api.delete_program(id);
                Err(err)
            }
        }
    }

    fn resolve(&self, api: &dyn GraphicsApi, id: ProgramId) -> Result<Linked, ProgramError> {
        let mut uniforms = BTreeMap::new();
        for &name in self.uniform_names {
            let loc = api
                .uniform_location(id, name)
                .ok_or_else(|| ProgramError::MissingUniform {
                    program: self.source.label.clone(),
                    name,
                })?;
            uniforms.insert(name, loc);
        }

        let mut attributes = BTreeMap::new();
        for &name in self.attribute_names {
            let loc = api
                .attribute_location(id, name)
                .ok_or_else(|| ProgramError::MissingAttribute {
                    program: self.source.label.clone(),
                    name,
                })?;
            attributes.insert(name, loc);
        }

        Ok(Linked {
            id,
            uniforms,
            attributes,
        })
    }

    /// Release the linked program. The source is kept, so `initialize` can
    /// build it again.
    pub fn delete(&mut self, api: &mut dyn GraphicsApi) {
        if let Some(linked) = self.linked.take() {
            api.delete_program(linked.id);
            tracing::debug!(program = %self.source.label, id = linked.id.0, "program deleted");
        }
    }

    fn linked(&self) -> Result<&Linked, ProgramError> {
        self.linked
            .as_ref()
            .ok_or_else(|| ProgramError::NotReady(self.source.label.clone()))
    }

    /// Make this program current for subsequent draws.
    pub fn use_program(&self, api: &mut dyn GraphicsApi) -> Result<(), ProgramError> {
        api.use_program(self.linked()?.id);
        Ok(())
    }

    pub fn uniform(&self, name: &'static str) -> Result<UniformLocation, ProgramError> {
        let linked = self.linked()?;
        linked
            .uniforms
            .get(name)
            .copied()
            .ok_or_else(|| ProgramError::MissingUniform {
                program: self.source.label.clone(),
                name,
            })
    }

    pub fn attribute(&self, name: &'static str) -> Result<AttributeLocation, ProgramError> {
        let linked = self.linked()?;
        linked
            .attributes
            .get(name)
            .copied()
            .ok_or_else(|| ProgramError::MissingAttribute {
                program: self.source.label.clone(),
                name,
            })
    }

    fn bind_texture(
        &self,
        api: &mut dyn GraphicsApi,
        texture: TextureId,
    ) -> Result<(), ProgramError> {
        let loc = self.uniform(U_TEXTURE_UNIT)?;
        api.bind_texture(TEXTURE_UNIT, texture);
        api.uniform_i32(loc, TEXTURE_UNIT as i32);
        Ok(())
    }
}

macro_rules! program_kind {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal, $vertex:expr, $fragment:expr,
        uniforms: [$($u:expr),* $(,)?],
        attributes: [$($a:expr),* $(,)?]
    ) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name(ShaderProgram);

        impl $name {
            pub fn new(assets: &dyn AssetSource) -> Result<Self, AssetError> {
                let source = assets.program_source($label, $vertex, $fragment)?;
                Ok(Self(ShaderProgram::new(source, &[$($u),*], &[$($a),*])))
            }
        }

        impl Deref for $name {
            type Target = ShaderProgram;

            fn deref(&self) -> &ShaderProgram {
                &self.0
            }
        }

        impl DerefMut for $name {
            fn deref_mut(&mut self) -> &mut ShaderProgram {
                &mut self.0
            }
        }
    };
}

program_kind!(
    /// Terrain coloured by height.
    HeightmapProgram, "heightmap",
    names::HEIGHTMAP_VERTEX_SHADER, names::HEIGHTMAP_FRAGMENT_SHADER,
    uniforms: [U_MATRIX],
    attributes: [A_POSITION]
);

program_kind!(
    /// Cube-mapped skybox.
    SkyboxProgram, "skybox",
    names::SKYBOX_VERTEX_SHADER, names::SKYBOX_FRAGMENT_SHADER,
    uniforms: [U_MATRIX, U_TEXTURE_UNIT],
    attributes: [A_POSITION]
);

program_kind!(
    /// Point-sprite particles animated by elapsed time.
    ParticleProgram, "particle",
    names::PARTICLE_VERTEX_SHADER, names::PARTICLE_FRAGMENT_SHADER,
    uniforms: [U_MATRIX, U_TIME, U_TEXTURE_UNIT],
    attributes: [A_POSITION, A_COLOR, A_DIRECTION_VECTOR, A_PARTICLE_START_TIME]
);

program_kind!(
    /// Textured 2D geometry.
    TextureProgram, "texture",
    names::TEXTURE_VERTEX_SHADER, names::TEXTURE_FRAGMENT_SHADER,
    uniforms: [U_MATRIX, U_TEXTURE_UNIT],
    attributes: [A_POSITION, A_TEXTURE_COORDINATES]
);

program_kind!(
    /// Per-vertex coloured points.
    ColorProgram, "color",
    names::COLOR_VERTEX_SHADER, names::COLOR_FRAGMENT_SHADER,
    uniforms: [U_MATRIX],
    attributes: [A_POSITION, A_COLOR]
);

impl HeightmapProgram {
    pub fn set_uniforms(
        &self,
        api: &mut dyn GraphicsApi,
        matrix: &Mat4,
    ) -> Result<(), ProgramError> {
        api.uniform_matrix4(self.uniform(U_MATRIX)?, matrix);
        Ok(())
    }

    pub fn position_attribute_location(&self) -> Result<AttributeLocation, ProgramError> {
        self.attribute(A_POSITION)
    }
}

impl SkyboxProgram {
    pub fn set_uniforms(
        &self,
        api: &mut dyn GraphicsApi,
        matrix: &Mat4,
        texture: TextureId,
    ) -> Result<(), ProgramError> {
        api.uniform_matrix4(self.uniform(U_MATRIX)?, matrix);
        self.bind_texture(api, texture)
    }

    pub fn position_attribute_location(&self) -> Result<AttributeLocation, ProgramError> {
        self.attribute(A_POSITION)
    }
}

impl ParticleProgram {
    pub fn set_uniforms(
        &self,
        api: &mut dyn GraphicsApi,
        matrix: &Mat4,
        elapsed_time: f32,
        texture: TextureId,
    ) -> Result<(), ProgramError> {
        api.uniform_matrix4(self.uniform(U_MATRIX)?, matrix);
        api.uniform_f32(self.uniform(U_TIME)?, elapsed_time);
        self.bind_texture(api, texture)
    }

    pub fn position_attribute_location(&self) -> Result<AttributeLocation, ProgramError> {
        self.attribute(A_POSITION)
    }

    pub fn color_attribute_location(&self) -> Result<AttributeLocation, ProgramError> {
        self.attribute(A_COLOR)
    }

    pub fn direction_vector_attribute_location(
        &self,
    ) -> Result<AttributeLocation, ProgramError> {
        self.attribute(A_DIRECTION_VECTOR)
    }

    pub fn particle_start_time_attribute_location(
        &self,
    ) -> Result<AttributeLocation, ProgramError> {
        self.attribute(A_PARTICLE_START_TIME)
    }
}

impl TextureProgram {
    pub fn set_uniforms(
        &self,
        api: &mut dyn GraphicsApi,
        matrix: &Mat4,
        texture: TextureId,
    ) -> Result<(), ProgramError> {
        api.uniform_matrix4(self.uniform(U_MATRIX)?, matrix);
        self.bind_texture(api, texture)
    }

    pub fn position_attribute_location(&self) -> Result<AttributeLocation, ProgramError> {
        self.attribute(A_POSITION)
    }

    pub fn texture_coordinates_attribute_location(
        &self,
    ) -> Result<AttributeLocation, ProgramError> {
        self.attribute(A_TEXTURE_COORDINATES)
    }
}

impl ColorProgram {
    pub fn set_uniforms(
        &self,
        api: &mut dyn GraphicsApi,
        matrix: &Mat4,
    ) -> Result<(), ProgramError> {
        api.uniform_matrix4(self.uniform(U_MATRIX)?, matrix);
        Ok(())
    }

    pub fn position_attribute_location(&self) -> Result<AttributeLocation, ProgramError> {
        self.attribute(A_POSITION)
    }

    pub fn color_attribute_location(&self) -> Result<AttributeLocation, ProgramError> {
        self.attribute(A_COLOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vista_assets::BuiltinAssets;
    use vista_render::{ApiError, Command, RecordingApi};

    #[test]
    fn use_before_initialize_is_an_error() {
        let program = HeightmapProgram::new(&BuiltinAssets::new()).unwrap();
        let mut api = RecordingApi::new();
        assert!(!program.is_ready());
        let err = program.use_program(&mut api).unwrap_err();
        assert!(matches!(err, ProgramError::NotReady(_)));
        assert!(api.commands().is_empty());
    }

    #[test]
    fn initialize_links_once() {
        let mut program = ParticleProgram::new(&BuiltinAssets::new()).unwrap();
        let mut api = RecordingApi::new();
        program.initialize(&mut api).unwrap();
        program.initialize(&mut api).unwrap();
        assert!(program.is_ready());
        assert_eq!(api.program_count(), 1);
    }

    #[test]
    fn every_builtin_program_links() {
        let assets = BuiltinAssets::new();
        let mut api = RecordingApi::new();
        HeightmapProgram::new(&assets)
            .unwrap()
            .initialize(&mut api)
            .unwrap();
        SkyboxProgram::new(&assets)
            .unwrap()
            .initialize(&mut api)
            .unwrap();
        ParticleProgram::new(&assets)
            .unwrap()
            .initialize(&mut api)
            .unwrap();
        TextureProgram::new(&assets)
            .unwrap()
            .initialize(&mut api)
            .unwrap();
        ColorProgram::new(&assets)
            .unwrap()
            .initialize(&mut api)
            .unwrap();
        assert_eq!(api.program_count(), 5);
    }

    #[test]
    fn particle_attributes_are_distinct() {
        let mut program = ParticleProgram::new(&BuiltinAssets::new()).unwrap();
        let mut api = RecordingApi::new();
        program.initialize(&mut api).unwrap();
        let mut locs = vec![
            program.position_attribute_location().unwrap().0,
            program.color_attribute_location().unwrap().0,
            program.direction_vector_attribute_location().unwrap().0,
            program.particle_start_time_attribute_location().unwrap().0,
        ];
        locs.sort_unstable();
        locs.dedup();
        assert_eq!(locs.len(), 4);
    }

    #[test]
    fn missing_attribute_fails_initialize() {
        let source = ProgramSource::new(
            "bare",
            "struct U { u_Matrix: mat4x4<f32> }; fn vs_main() {}",
            "fn fs_main() {}",
        );
        let mut program = ShaderProgram::new(source, &[U_MATRIX], &[A_POSITION]);
        let err = program.initialize(&mut RecordingApi::new()).unwrap_err();
        assert!(matches!(
            err,
            ProgramError::MissingAttribute {
                name: A_POSITION,
                ..
            }
        ));
        assert!(!program.is_ready());
    }

    #[test]
    fn failed_initialize_releases_the_program() {
        let source = ProgramSource::new(
            "bare",
            "struct U { u_Matrix: mat4x4<f32> }; fn vs_main() {}",
            "fn fs_main() {}",
        );
        let mut program = ShaderProgram::new(source, &[U_MATRIX], &[A_POSITION]);
        let mut api = RecordingApi::new();
        assert!(program.initialize(&mut api).is_err());
        assert_eq!(api.program_count(), 0);
    }

    #[test]
    fn delete_releases_and_allows_relinking() {
        let mut program = SkyboxProgram::new(&BuiltinAssets::new()).unwrap();
        let mut api = RecordingApi::new();
        program.initialize(&mut api).unwrap();
        let first = program.id().unwrap();

        program.delete(&mut api);
        assert!(!program.is_ready());
        assert_eq!(api.program_count(), 0);
        assert!(matches!(
            program.use_program(&mut api),
            Err(ProgramError::NotReady(_))
        ));
        program.delete(&mut api);

        program.initialize(&mut api).unwrap();
        assert_ne!(program.id(), Some(first));
        assert_eq!(api.program_count(), 1);
    }

    #[test]
    fn link_failure_surfaces_from_initialize() {
        let source = ProgramSource::new("broken", "fn main() {}", "fn fs_main() {}");
        let mut program = ShaderProgram::new(source, &[], &[]);
        let err = program.initialize(&mut RecordingApi::new()).unwrap_err();
        assert!(matches!(err, ProgramError::Api(ApiError::Link { .. })));
    }

    #[test]
    fn skybox_uniforms_bind_texture_unit() {
        let mut program = SkyboxProgram::new(&BuiltinAssets::new()).unwrap();
        let mut api = RecordingApi::new();
        program.initialize(&mut api).unwrap();
        api.take_commands();

        program
            .set_uniforms(&mut api, &Mat4::IDENTITY, TextureId(4))
            .unwrap();
        assert!(api.commands().contains(&Command::BindTexture {
            unit: TEXTURE_UNIT,
            texture: TextureId(4),
        }));
        assert!(
            api.commands()
                .iter()
                .any(|c| matches!(c, Command::UniformI32 { value: 0, .. }))
        );
    }
}
