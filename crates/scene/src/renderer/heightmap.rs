use super::{
    CLEAR_COLOR, DrawPass, FrameStats, FrameTime, Fountain, SurfaceRenderer, SurfaceState,
};
use crate::camera::OrbitCamera;
use crate::config::HeightmapConfig;
use crate::error::{ProgramError, SceneError};
use crate::objects::{Heightmap, Skybox};
use crate::program::{HeightmapProgram, SkyboxProgram};
use glam::Mat4;
use vista_assets::{AssetSource, names};
use vista_render::{DepthFunc, GraphicsApi, TextureId};

/// Everything built when the surface is created.
#[derive(Debug)]
struct Surface {
    heightmap_program: HeightmapProgram,
    heightmap: Heightmap,
    skybox_program: SkyboxProgram,
    skybox: Skybox,
    skybox_texture: TextureId,
    fountain: Fountain,
}

/// Terrain under a skybox with a particle fountain in the middle.
#[derive(Debug)]
pub struct HeightmapRenderer {
    config: HeightmapConfig,
    camera: OrbitCamera,
    projection: Mat4,
    model: Mat4,
    surface: Option<Surface>,
    state: SurfaceState,
    stats: FrameStats,
}

impl HeightmapRenderer {
    pub fn new(config: HeightmapConfig) -> Self {
        let camera = OrbitCamera::new(config.camera.eye_offset, config.camera.drag_sensitivity);
        let model = Mat4::from_scale(config.terrain_scale);
        Self {
            config,
            camera,
            projection: Mat4::IDENTITY,
            model,
            surface: None,
            state: SurfaceState::Uninitialized,
            stats: FrameStats::default(),
        }
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }
}

impl SurfaceRenderer for HeightmapRenderer {
    fn name(&self) -> &'static str {
        "heightmap"
    }

    fn state(&self) -> SurfaceState {
        self.state
    }

    fn stats(&self) -> FrameStats {
        let mut stats = self.stats;
        stats.live_particles = self
            .surface
            .as_ref()
            .map_or(0, |s| s.fountain.live_count());
        stats
    }

    fn on_surface_created(
        &mut self,
        api: &mut dyn GraphicsApi,
        assets: &dyn AssetSource,
    ) -> Result<(), SceneError> {
        let _span = tracing::info_span!("surface_created", scene = "heightmap").entered();
        self.on_surface_destroyed(api);

        api.set_depth_func(DepthFunc::Less);
        api.set_depth_mask(true);
        api.set_cull_face(true);

        let mut heightmap_program = HeightmapProgram::new(assets)?;
        heightmap_program.initialize(api)?;
        let heightmap = Heightmap::new(api, &assets.image(names::HEIGHTMAP)?)?;

        let mut skybox_program = SkyboxProgram::new(assets)?;
        skybox_program.initialize(api)?;
        let skybox = Skybox::new(api);
        let skybox_texture = api.create_cube_map(&assets.cube_map(names::SKYBOX_FACES)?)?;

        let fountain = Fountain::new(api, assets, &self.config.fountain)?;

        let (w, h) = heightmap.dimensions();
        tracing::info!(terrain = %format!("{w}x{h}"), "heightmap scene ready");

        self.surface = Some(Surface {
            heightmap_program,
            heightmap,
            skybox_program,
            skybox,
            skybox_texture,
            fountain,
        });
        self.state = SurfaceState::SurfaceReady;
        Ok(())
    }

    fn on_surface_destroyed(&mut self, api: &mut dyn GraphicsApi) {
        if let Some(surface) = self.surface.take() {
            surface.delete(api);
            tracing::debug!(scene = "heightmap", "surface resources released");
        }
        self.state = SurfaceState::Uninitialized;
    }

    fn on_surface_changed(&mut self, api: &mut dyn GraphicsApi, width: u32, height: u32) {
        api.viewport(width, height);
        self.projection = self.config.camera.projection.matrix(width, height);
        self.stats.width = width;
        self.stats.height = height;
        tracing::debug!(width, height, "surface changed");
    }

    fn on_draw_frame(
        &mut self,
        api: &mut dyn GraphicsApi,
        time: FrameTime,
    ) -> Result<(), SceneError> {
        let surface = self.surface.as_mut().ok_or(SceneError::SurfaceNotReady)?;
        let view = self.camera.view();

        api.clear(CLEAR_COLOR);
        for pass in DrawPass::ORDER {
            match pass {
                DrawPass::Terrain => {
                    surface.draw_terrain(api, &(self.projection * view * self.model))?
                }
                DrawPass::Skybox => {
                    surface.draw_skybox(api, &(self.projection * self.camera.rotation_only()))?
                }
                DrawPass::Particles => {
                    surface.fountain.update(api, time.elapsed);
                    surface
                        .fountain
                        .draw(api, &(self.projection * view), time.elapsed)?;
                }
            }
        }

        self.stats.record_frame(time);
        self.state = SurfaceState::Rendering;
        Ok(())
    }

    fn handle_touch_drag(&mut self, dx: f32, dy: f32) {
        self.camera.handle_drag(dx, dy);
    }
}

impl Surface {
    fn delete(mut self, api: &mut dyn GraphicsApi) {
        self.heightmap_program.delete(api);
        self.heightmap.delete(api);
        self.skybox_program.delete(api);
        self.skybox.delete(api);
        api.delete_texture(self.skybox_texture);
        self.fountain.delete(api);
    }

    fn draw_terrain(&self, api: &mut dyn GraphicsApi, mvp: &Mat4) -> Result<(), ProgramError> {
        self.heightmap_program.use_program(api)?;
        self.heightmap_program.set_uniforms(api, mvp)?;
        self.heightmap.bind_data(api, &self.heightmap_program)?;
        self.heightmap.draw(api);
        Ok(())
    }

    /// The cube sits on the far plane, so it needs `LessEqual` to pass
    /// against a cleared depth buffer.
    fn draw_skybox(&self, api: &mut dyn GraphicsApi, mvp: &Mat4) -> Result<(), ProgramError> {
        api.set_depth_func(DepthFunc::LessEqual);
        self.skybox_program.use_program(api)?;
        self.skybox_program
            .set_uniforms(api, mvp, self.skybox_texture)?;
        self.skybox.bind_data(api, &self.skybox_program)?;
        self.skybox.draw(api);
        api.set_depth_func(DepthFunc::Less);
        Ok(())
    }
}
