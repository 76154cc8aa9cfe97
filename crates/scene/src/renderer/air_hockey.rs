use super::{CLEAR_COLOR, FrameStats, FrameTime, SurfaceRenderer, SurfaceState};
use crate::config::AirHockeyConfig;
use crate::error::SceneError;
use crate::objects::{Mallet, Table};
use crate::program::{ColorProgram, TextureProgram};
use glam::{Mat4, Vec3};
use vista_assets::{AssetSource, names};
use vista_render::{DepthFunc, GraphicsApi, TextureId};

#[derive(Debug)]
struct Surface {
    texture_program: TextureProgram,
    color_program: ColorProgram,
    table: Table,
    mallets: Mallet,
    texture: TextureId,
}

impl Surface {
    fn delete(mut self, api: &mut dyn GraphicsApi) {
        self.texture_program.delete(api);
        self.color_program.delete(api);
        self.table.delete(api);
        self.mallets.delete(api);
        api.delete_texture(self.texture);
    }
}

/// A textured table tilted away from the viewer with two mallets on it.
///
/// Everything lies in one plane, so depth testing is left permissive and
/// draw order decides what ends up on top.
#[derive(Debug)]
pub struct AirHockeyRenderer {
    config: AirHockeyConfig,
    matrix: Mat4,
    surface: Option<Surface>,
    state: SurfaceState,
    stats: FrameStats,
}

impl AirHockeyRenderer {
    pub fn new(config: AirHockeyConfig) -> Self {
        Self {
            config,
            matrix: Mat4::IDENTITY,
            surface: None,
            state: SurfaceState::Uninitialized,
            stats: FrameStats::default(),
        }
    }

    pub fn model(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -self.config.distance))
            * Mat4::from_rotation_x((-self.config.tilt_degrees).to_radians())
    }

    /// Projection times model, fixed between resizes.
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }
}

impl SurfaceRenderer for AirHockeyRenderer {
    fn name(&self) -> &'static str {
        "air-hockey"
    }

    fn state(&self) -> SurfaceState {
        self.state
    }

    fn stats(&self) -> FrameStats {
        self.stats
    }

    fn on_surface_created(
        &mut self,
        api: &mut dyn GraphicsApi,
        assets: &dyn AssetSource,
    ) -> Result<(), SceneError> {
        let _span = tracing::info_span!("surface_created", scene = "air-hockey").entered();
        self.on_surface_destroyed(api);
        api.set_depth_func(DepthFunc::Always);
        api.set_cull_face(false);

        let mut texture_program = TextureProgram::new(assets)?;
        texture_program.initialize(api)?;
        let mut color_program = ColorProgram::new(assets)?;
        color_program.initialize(api)?;
        let texture = api.create_texture_2d(&assets.image(names::AIR_HOCKEY_SURFACE)?)?;

        self.surface = Some(Surface {
            texture_program,
            color_program,
            table: Table::new(api),
            mallets: Mallet::new(api),
            texture,
        });
        self.state = SurfaceState::SurfaceReady;
        tracing::info!("air hockey scene ready");
        Ok(())
    }

    fn on_surface_destroyed(&mut self, api: &mut dyn GraphicsApi) {
        if let Some(surface) = self.surface.take() {
            surface.delete(api);
            tracing::debug!(scene = "air-hockey", "surface resources released");
        }
        self.state = SurfaceState::Uninitialized;
    }

    fn on_surface_changed(&mut self, api: &mut dyn GraphicsApi, width: u32, height: u32) {
        api.viewport(width, height);
        self.matrix = self.config.projection.matrix(width, height) * self.model();
        self.stats.width = width;
        self.stats.height = height;
    }

    fn on_draw_frame(
        &mut self,
        api: &mut dyn GraphicsApi,
        time: FrameTime,
    ) -> Result<(), SceneError> {
        let surface = self.surface.as_ref().ok_or(SceneError::SurfaceNotReady)?;
        api.clear(CLEAR_COLOR);

        surface.texture_program.use_program(api)?;
        surface
            .texture_program
            .set_uniforms(api, &self.matrix, surface.texture)?;
        surface.table.bind_data(api, &surface.texture_program)?;
        surface.table.draw(api);

        surface.color_program.use_program(api)?;
        surface.color_program.set_uniforms(api, &self.matrix)?;
        surface.mallets.bind_data(api, &surface.color_program)?;
        surface.mallets.draw(api);

        self.stats.record_frame(time);
        self.state = SurfaceState::Rendering;
        Ok(())
    }

    /// The table is fixed; drags are ignored.
    fn handle_touch_drag(&mut self, _dx: f32, _dy: f32) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use vista_assets::BuiltinAssets;
    use vista_render::{Command, Primitive, RecordingApi};

    fn ready(api: &mut RecordingApi) -> AirHockeyRenderer {
        let mut r = AirHockeyRenderer::new(AirHockeyConfig::default());
        r.on_surface_created(api, &BuiltinAssets::new()).unwrap();
        r.on_surface_changed(api, 720, 1280);
        api.take_commands();
        r
    }

    #[test]
    fn table_then_mallets() {
        let mut api = RecordingApi::new();
        let mut r = ready(&mut api);
        r.on_draw_frame(&mut api, FrameTime::from_secs(0.0)).unwrap();
        let draws: Vec<_> = api.draws().cloned().collect();
        assert_eq!(
            draws,
            [
                Command::DrawArrays {
                    primitive: Primitive::TriangleFan,
                    first: 0,
                    count: 6
                },
                Command::DrawArrays {
                    primitive: Primitive::Points,
                    first: 0,
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn matrix_is_projection_translate_then_tilt() {
        let mut api = RecordingApi::new();
        let r = ready(&mut api);
        let want = Mat4::perspective_rh(45f32.to_radians(), 720.0 / 1280.0, 1.0, 10.0)
            * Mat4::from_translation(Vec3::new(0.0, 0.0, -2.5))
            * Mat4::from_rotation_x((-60f32).to_radians());
        assert!(r.matrix().abs_diff_eq(want, 1e-6));
    }

    #[test]
    fn table_centre_lands_in_front_of_the_eye() {
        let r = AirHockeyRenderer::new(AirHockeyConfig::default());
        let centre = r.model().transform_point3(Vec3::ZERO);
        assert_eq!(centre, Vec3::new(0.0, 0.0, -2.5));
    }

    #[test]
    fn recreating_keeps_resource_counts_flat() {
        let mut api = RecordingApi::new();
        let mut r = ready(&mut api);
        let live = (api.program_count(), api.buffer_count(), api.texture_count());
        assert_eq!(live, (2, 2, 1));
        for _ in 0..3 {
            r.on_surface_created(&mut api, &BuiltinAssets::new()).unwrap();
        }
        assert_eq!(
            (api.program_count(), api.buffer_count(), api.texture_count()),
            live
        );
        r.on_surface_destroyed(&mut api);
        assert_eq!(api.program_count() + api.buffer_count() + api.texture_count(), 0);
    }

    #[test]
    fn drag_does_not_change_the_matrix() {
        let mut api = RecordingApi::new();
        let mut r = ready(&mut api);
        let before = r.matrix();
        r.handle_touch_drag(500.0, 500.0);
        assert_eq!(r.matrix(), before);
    }
}
