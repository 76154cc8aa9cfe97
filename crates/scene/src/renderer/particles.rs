use super::{CLEAR_COLOR, FrameStats, FrameTime, Fountain, SurfaceRenderer, SurfaceState};
use crate::camera::OrbitCamera;
use crate::config::ParticlesConfig;
use crate::error::SceneError;
use glam::Mat4;
use vista_assets::AssetSource;
use vista_render::GraphicsApi;

/// The fountain on its own against a black background.
#[derive(Debug)]
pub struct ParticlesRenderer {
    config: ParticlesConfig,
    camera: OrbitCamera,
    projection: Mat4,
    fountain: Option<Fountain>,
    state: SurfaceState,
    stats: FrameStats,
}

impl ParticlesRenderer {
    pub fn new(config: ParticlesConfig) -> Self {
        let camera = OrbitCamera::new(config.camera.eye_offset, config.camera.drag_sensitivity);
        Self {
            config,
            camera,
            projection: Mat4::IDENTITY,
            fountain: None,
            state: SurfaceState::Uninitialized,
            stats: FrameStats::default(),
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.camera.view()
    }
}

impl SurfaceRenderer for ParticlesRenderer {
    fn name(&self) -> &'static str {
        "particles"
    }

    fn state(&self) -> SurfaceState {
        self.state
    }

    fn stats(&self) -> FrameStats {
        let mut stats = self.stats;
        stats.live_particles = self.fountain.as_ref().map_or(0, Fountain::live_count);
        stats
    }

    fn on_surface_created(
        &mut self,
        api: &mut dyn GraphicsApi,
        assets: &dyn AssetSource,
    ) -> Result<(), SceneError> {
        let _span = tracing::info_span!("surface_created", scene = "particles").entered();
        self.on_surface_destroyed(api);
        api.set_cull_face(false);
        self.fountain = Some(Fountain::new(api, assets, &self.config.fountain)?);
        self.state = SurfaceState::SurfaceReady;
        tracing::info!(
            shooters = self.config.fountain.shooters.len(),
            capacity = self.config.fountain.capacity,
            "particles scene ready"
        );
        Ok(())
    }

    fn on_surface_destroyed(&mut self, api: &mut dyn GraphicsApi) {
        if let Some(fountain) = self.fountain.take() {
            fountain.delete(api);
            tracing::debug!(scene = "particles", "surface resources released");
        }
        self.state = SurfaceState::Uninitialized;
    }

    fn on_surface_changed(&mut self, api: &mut dyn GraphicsApi, width: u32, height: u32) {
        api.viewport(width, height);
        self.projection = self.config.camera.projection.matrix(width, height);
        self.stats.width = width;
        self.stats.height = height;
    }

    fn on_draw_frame(
        &mut self,
        api: &mut dyn GraphicsApi,
        time: FrameTime,
    ) -> Result<(), SceneError> {
        let view_projection = self.view_projection();
        let fountain = self.fountain.as_mut().ok_or(SceneError::SurfaceNotReady)?;

        api.clear(CLEAR_COLOR);
        fountain.update(api, time.elapsed);
        fountain.draw(api, &view_projection, time.elapsed)?;

        self.stats.record_frame(time);
        self.state = SurfaceState::Rendering;
        Ok(())
    }

    fn handle_touch_drag(&mut self, dx: f32, dy: f32) {
        self.camera.handle_drag(dx, dy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use vista_assets::BuiltinAssets;
    use vista_render::{Command, RecordingApi};

    fn ready(api: &mut RecordingApi) -> ParticlesRenderer {
        let mut r = ParticlesRenderer::new(ParticlesConfig::default());
        r.on_surface_created(api, &BuiltinAssets::new()).unwrap();
        r.on_surface_changed(api, 1000, 1000);
        api.take_commands();
        r
    }

    #[test]
    fn projection_uses_near_ten_far_plane() {
        let mut api = RecordingApi::new();
        let r = ready(&mut api);
        let want = Mat4::perspective_rh(45f32.to_radians(), 1.0, 1.0, 10.0)
            * Mat4::from_translation(Vec3::new(0.0, -1.5, -5.0));
        assert!(r.view_projection().abs_diff_eq(want, 1e-6));
    }

    #[test]
    fn live_count_grows_with_time_until_capacity() {
        let mut api = RecordingApi::new();
        let mut r = ready(&mut api);
        r.on_draw_frame(&mut api, FrameTime::from_secs(1.0)).unwrap();
        assert_eq!(r.stats().live_particles, 180);
        r.on_draw_frame(&mut api, FrameTime::from_secs(100.0)).unwrap();
        assert_eq!(r.stats().live_particles, 10_000);
    }

    #[test]
    fn frame_uploads_new_particles_before_drawing() {
        let mut api = RecordingApi::new();
        let mut r = ready(&mut api);
        r.on_draw_frame(&mut api, FrameTime::from_secs(0.5)).unwrap();

        let cmds = api.commands();
        let first_upload = cmds
            .iter()
            .position(|c| matches!(c, Command::UpdateVertexBuffer { .. }))
            .unwrap();
        let draw = cmds.iter().position(Command::is_draw).unwrap();
        assert!(first_upload < draw);
        assert_eq!(api.draws().count(), 1);
    }

    #[test]
    fn destroyed_surface_refuses_to_draw() {
        let mut api = RecordingApi::new();
        let mut r = ready(&mut api);
        r.on_surface_destroyed(&mut api);
        assert_eq!(r.state(), SurfaceState::Uninitialized);
        assert_eq!(api.program_count(), 0);
        assert!(matches!(
            r.on_draw_frame(&mut api, FrameTime::from_secs(1.0)),
            Err(SceneError::SurfaceNotReady)
        ));
    }

    #[test]
    fn drag_rotates_the_view() {
        let mut r = ParticlesRenderer::new(ParticlesConfig::default());
        let before = r.view_projection();
        r.handle_touch_drag(0.0, 400.0);
        assert_ne!(before, r.view_projection());
    }
}
