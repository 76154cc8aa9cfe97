use crate::config::FountainConfig;
use crate::error::{ProgramError, SceneError};
use crate::objects::{ParticleShooter, ParticleSystem};
use crate::program::ParticleProgram;
use glam::Mat4;
use vista_assets::{AssetSource, names};
use vista_render::{Blend, GraphicsApi, TextureId};

/// Particle system, its program and sprite, and the shooters that feed it.
#[derive(Debug)]
pub struct Fountain {
    program: ParticleProgram,
    system: ParticleSystem,
    texture: TextureId,
    shooters: Vec<ParticleShooter>,
}

impl Fountain {
    pub fn new(
        api: &mut dyn GraphicsApi,
        assets: &dyn AssetSource,
        config: &FountainConfig,
    ) -> Result<Self, SceneError> {
        let mut program = ParticleProgram::new(assets)?;
        program.initialize(api)?;
        let system = ParticleSystem::new(api, config.capacity)?;
        let texture = api.create_texture_2d(&assets.image(names::PARTICLE_TEXTURE)?)?;

        let shooters = config
            .shooters
            .iter()
            .enumerate()
            .map(|(i, s)| {
                ParticleShooter::new(
                    s.position,
                    config.direction,
                    s.color,
                    config.angle_variance,
                    config.speed_variance,
                    config.seed.wrapping_add(i as u64),
                )
                .with_rate(config.particles_per_second)
            })
            .collect();

        Ok(Self {
            program,
            system,
            texture,
            shooters,
        })
    }

    pub fn live_count(&self) -> usize {
        self.system.live_count()
    }

    pub fn system(&self) -> &ParticleSystem {
        &self.system
    }

    /// Emit whatever each shooter has due at `time`. All shooters together
    /// write at most one ring's worth per frame.
    pub fn update(&mut self, api: &mut dyn GraphicsApi, time: f32) -> usize {
        let mut budget = self.system.capacity();
        for shooter in &mut self.shooters {
            budget -= shooter.emit_at_most(api, &mut self.system, time, budget);
        }
        self.system.capacity() - budget
    }

    pub fn delete(mut self, api: &mut dyn GraphicsApi) {
        self.program.delete(api);
        self.system.delete(api);
        api.delete_texture(self.texture);
    }

    /// Draw with depth writes off and additive blending, then put both back.
    pub fn draw(
        &self,
        api: &mut dyn GraphicsApi,
        view_projection: &Mat4,
        time: f32,
    ) -> Result<(), ProgramError> {
        api.set_depth_mask(false);
        api.set_blend(Some(Blend::ADDITIVE));

        self.program.use_program(api)?;
        self.program
            .set_uniforms(api, view_projection, time, self.texture)?;
        self.system.bind_data(api, &self.program)?;
        self.system.draw(api);

        api.set_blend(None);
        api.set_depth_mask(true);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vista_assets::BuiltinAssets;
    use vista_render::{Command, RecordingApi};

    fn fountain(api: &mut RecordingApi) -> Fountain {
        Fountain::new(api, &BuiltinAssets::new(), &FountainConfig::default()).unwrap()
    }

    #[test]
    fn three_shooters_at_sixty_per_second() {
        let mut api = RecordingApi::new();
        let mut f = fountain(&mut api);
        assert_eq!(f.update(&mut api, 1.0), 180);
        assert_eq!(f.live_count(), 180);
    }

    #[test]
    fn a_stalled_frame_writes_one_ring_at_most() {
        let mut api = RecordingApi::new();
        let config = FountainConfig {
            capacity: 100,
            ..FountainConfig::default()
        };
        let mut f = Fountain::new(&mut api, &BuiltinAssets::new(), &config).unwrap();
        api.take_commands();

        assert_eq!(f.update(&mut api, 600.0), 100);
        let uploads = api
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::UpdateVertexBuffer { .. }))
            .count();
        assert_eq!(uploads, 100);
        assert_eq!(f.live_count(), 100);
    }

    #[test]
    fn delete_releases_program_buffer_and_sprite() {
        let mut api = RecordingApi::new();
        let f = fountain(&mut api);
        assert_eq!(
            (api.program_count(), api.buffer_count(), api.texture_count()),
            (1, 1, 1)
        );
        f.delete(&mut api);
        assert_eq!(
            (api.program_count(), api.buffer_count(), api.texture_count()),
            (0, 0, 0)
        );
    }

    #[test]
    fn shooters_keep_their_colours() {
        let mut api = RecordingApi::new();
        let mut f = fountain(&mut api);
        f.update(&mut api, 0.5);
        let colours: Vec<_> = (0..f.live_count())
            .map(|s| f.system().particle(s).unwrap().color)
            .collect();
        let defaults = FountainConfig::default();
        for shooter in &defaults.shooters {
            assert!(colours.contains(&shooter.color));
        }
    }

    #[test]
    fn draw_restores_depth_and_blend() {
        let mut api = RecordingApi::new();
        let mut f = fountain(&mut api);
        f.update(&mut api, 0.5);
        api.take_commands();
        f.draw(&mut api, &Mat4::IDENTITY, 0.5).unwrap();

        let cmds = api.commands();
        assert_eq!(cmds[0], Command::DepthMask(false));
        assert_eq!(cmds[1], Command::Blend(Some(Blend::ADDITIVE)));
        let n = cmds.len();
        assert_eq!(cmds[n - 2], Command::Blend(None));
        assert_eq!(cmds[n - 1], Command::DepthMask(true));
    }
}
