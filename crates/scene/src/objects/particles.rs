use crate::error::{GeometryError, ProgramError};
use crate::program::ParticleProgram;
use crate::vertex_array::VertexArray;
use glam::{EulerRot, Quat, Vec3};
use vista_common::{BYTES_PER_FLOAT, Color, SplitMix64};
use vista_render::{GraphicsApi, Primitive};

const POSITION_COMPONENT_COUNT: usize = 3;
const COLOR_COMPONENT_COUNT: usize = 3;
const VECTOR_COMPONENT_COUNT: usize = 3;
const PARTICLE_START_TIME_COMPONENT_COUNT: usize = 1;

const TOTAL_COMPONENT_COUNT: usize = POSITION_COMPONENT_COUNT
    + COLOR_COMPONENT_COUNT
    + VECTOR_COMPONENT_COUNT
    + PARTICLE_START_TIME_COMPONENT_COUNT;

const STRIDE: u32 = TOTAL_COMPONENT_COUNT as u32 * BYTES_PER_FLOAT;

/// Downward pull: displacement is `t² / GRAVITY_DIVISOR`.
const GRAVITY_DIVISOR: f32 = 8.0;

/// One particle as stored in the system's vertex data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub color: Color,
    pub direction: Vec3,
    pub start_time: f32,
}

impl Particle {
    /// Where the particle is at `time`, matching the particle vertex shader.
    pub fn position_at(&self, time: f32) -> Vec3 {
        let elapsed = time - self.start_time;
        let mut p = self.position + self.direction * elapsed;
        p.y -= elapsed * elapsed / GRAVITY_DIVISOR;
        p
    }

    fn write(&self, out: &mut [f32; TOTAL_COMPONENT_COUNT]) {
        let c = self.color.to_vec3();
        *out = [
            self.position.x,
            self.position.y,
            self.position.z,
            c.x,
            c.y,
            c.z,
            self.direction.x,
            self.direction.y,
            self.direction.z,
            self.start_time,
        ];
    }
}

/// Fixed-capacity ring of particles.
///
/// Once full, each new particle overwrites the oldest slot.
#[derive(Debug)]
pub struct ParticleSystem {
    vertex_array: VertexArray,
    capacity: usize,
    live: usize,
    next: usize,
}

impl ParticleSystem {
    pub fn new(api: &mut dyn GraphicsApi, capacity: usize) -> Result<Self, GeometryError> {
        if capacity == 0 {
            return Err(GeometryError::ZeroCapacity);
        }
        Ok(Self {
            vertex_array: VertexArray::new(api, vec![0.0; capacity * TOTAL_COMPONENT_COUNT]),
            capacity,
            live: 0,
            next: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn live_count(&self) -> usize {
        self.live
    }

    pub fn add_particle(&mut self, api: &mut dyn GraphicsApi, particle: &Particle) {
        let slot = self.next;
        self.next = (self.next + 1) % self.capacity;
        self.live = (self.live + 1).min(self.capacity);

        let mut floats = [0.0; TOTAL_COMPONENT_COUNT];
        particle.write(&mut floats);
        self.vertex_array
            .update(api, slot * TOTAL_COMPONENT_COUNT, &floats);
    }

    /// Read a stored particle back out of the vertex data.
    pub fn particle(&self, slot: usize) -> Option<Particle> {
        if slot >= self.live {
            return None;
        }
        let d = &self.vertex_array.data()
            [slot * TOTAL_COMPONENT_COUNT..(slot + 1) * TOTAL_COMPONENT_COUNT];
        let channel = |v: f32| (v * 255.0).round() as u8;
        Some(Particle {
            position: Vec3::new(d[0], d[1], d[2]),
            color: Color::rgb(channel(d[3]), channel(d[4]), channel(d[5])),
            direction: Vec3::new(d[6], d[7], d[8]),
            start_time: d[9],
        })
    }

    pub fn bind_data(
        &self,
        api: &mut dyn GraphicsApi,
        program: &ParticleProgram,
    ) -> Result<(), ProgramError> {
        let mut offset = 0;
        let attributes = [
            (
                program.position_attribute_location()?,
                POSITION_COMPONENT_COUNT,
            ),
            (program.color_attribute_location()?, COLOR_COMPONENT_COUNT),
            (
                program.direction_vector_attribute_location()?,
                VECTOR_COMPONENT_COUNT,
            ),
            (
                program.particle_start_time_attribute_location()?,
                PARTICLE_START_TIME_COMPONENT_COUNT,
            ),
        ];
        for (location, count) in attributes {
            self.vertex_array
                .set_vertex_attrib_pointer(api, offset, location, count as u32, STRIDE);
            offset += count;
        }
        Ok(())
    }

    pub fn draw(&self, api: &mut dyn GraphicsApi) {
        api.draw_arrays(Primitive::Points, 0, self.live as u32);
    }

    pub fn delete(self, api: &mut dyn GraphicsApi) {
        self.vertex_array.delete(api);
    }
}

/// Emits particles from a fixed point in a jittered direction.
///
/// Emission is time-driven: by time `t` the shooter has produced
/// `floor(particles_per_second * t)` particles in total, however the frames
/// fall. Particles that would overwrite each other within one frame are
/// counted but never written.
#[derive(Debug, Clone)]
pub struct ParticleShooter {
    position: Vec3,
    direction: Vec3,
    color: Color,
    angle_variance: f32,
    speed_variance: f32,
    particles_per_second: f32,
    rng: SplitMix64,
    emitted: u64,
}

impl ParticleShooter {
    pub fn new(
        position: Vec3,
        direction: Vec3,
        color: Color,
        angle_variance: f32,
        speed_variance: f32,
        seed: u64,
    ) -> Self {
        Self {
            position,
            direction,
            color,
            angle_variance,
            speed_variance,
            particles_per_second: 60.0,
            rng: SplitMix64::new(seed),
            emitted: 0,
        }
    }

    pub fn with_rate(mut self, particles_per_second: f32) -> Self {
        self.particles_per_second = particles_per_second.max(0.0);
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Emit however many particles are due at `current_time`, writing at
    /// most one ring's worth. Returns the number written.
    pub fn emit(
        &mut self,
        api: &mut dyn GraphicsApi,
        system: &mut ParticleSystem,
        current_time: f32,
    ) -> usize {
        let limit = system.capacity();
        self.emit_at_most(api, system, current_time, limit)
    }

    /// Like [`ParticleShooter::emit`] but writes at most `limit` particles.
    /// Everything due is still counted as emitted.
    pub fn emit_at_most(
        &mut self,
        api: &mut dyn GraphicsApi,
        system: &mut ParticleSystem,
        current_time: f32,
        limit: usize,
    ) -> usize {
        let due = self.due(current_time);
        self.emitted += due;
        let count = due.min(limit as u64) as usize;
        if (count as u64) < due {
            tracing::trace!(due, written = count, "emission clamped to ring capacity");
        }
        self.add_particles(api, system, current_time, count);
        count
    }

    /// Particles owed at `current_time` beyond those already emitted.
    fn due(&self, current_time: f32) -> u64 {
        let total = (f64::from(self.particles_per_second) * f64::from(current_time.max(0.0)))
            .floor();
        if !total.is_finite() {
            return 0;
        }
        (total as u64).saturating_sub(self.emitted)
    }

    /// Add exactly `count` particles stamped with `current_time`.
    pub fn add_particles(
        &mut self,
        api: &mut dyn GraphicsApi,
        system: &mut ParticleSystem,
        current_time: f32,
        count: usize,
    ) {
        for _ in 0..count {
            let direction = self.jittered_direction();
            system.add_particle(
                api,
                &Particle {
                    position: self.position,
                    color: self.color,
                    direction,
                    start_time: current_time,
                },
            );
        }
    }

    fn jittered_direction(&mut self) -> Vec3 {
        let mut jitter = || ((self.rng.next_f32() - 0.5) * self.angle_variance).to_radians();
        let (ax, ay, az) = (jitter(), jitter(), jitter());
        let rotation = Quat::from_euler(EulerRot::XYZ, ax, ay, az);
        let speed = 1.0 + self.rng.next_f32() * self.speed_variance;
        rotation * self.direction * speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vista_assets::BuiltinAssets;
    use vista_render::{Command, RecordingApi};

    fn particle(start_time: f32) -> Particle {
        Particle {
            position: Vec3::new(1.0, 0.0, 0.0),
            color: Color::rgb(255, 50, 5),
            direction: Vec3::new(0.0, 0.5, 0.0),
            start_time,
        }
    }

    fn shooter() -> ParticleShooter {
        ParticleShooter::new(
            Vec3::ZERO,
            Vec3::new(0.0, 0.5, 0.0),
            Color::rgb(25, 255, 25),
            5.0,
            1.0,
            42,
        )
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = ParticleSystem::new(&mut RecordingApi::new(), 0).unwrap_err();
        assert!(matches!(err, GeometryError::ZeroCapacity));
    }

    #[test]
    fn particle_round_trips_through_vertex_data() {
        let mut api = RecordingApi::new();
        let mut system = ParticleSystem::new(&mut api, 4).unwrap();
        system.add_particle(&mut api, &particle(1.5));
        assert_eq!(system.particle(0), Some(particle(1.5)));
        assert_eq!(system.particle(1), None);
    }

    #[test]
    fn full_ring_overwrites_oldest() {
        let mut api = RecordingApi::new();
        let mut system = ParticleSystem::new(&mut api, 3).unwrap();
        for t in 0..5 {
            system.add_particle(&mut api, &particle(t as f32));
        }
        assert_eq!(system.live_count(), 3);
        let times: Vec<f32> = (0..3)
            .map(|s| system.particle(s).unwrap().start_time)
            .collect();
        assert_eq!(times, vec![3.0, 4.0, 2.0]);
    }

    #[test]
    fn draw_covers_live_particles_only() {
        let mut api = RecordingApi::new();
        let mut program = ParticleProgram::new(&BuiltinAssets::new()).unwrap();
        program.initialize(&mut api).unwrap();
        let mut system = ParticleSystem::new(&mut api, 10).unwrap();
        system.add_particle(&mut api, &particle(0.0));
        system.add_particle(&mut api, &particle(0.1));
        program.use_program(&mut api).unwrap();
        system.bind_data(&mut api, &program).unwrap();
        system.draw(&mut api);
        assert_eq!(
            api.commands().last(),
            Some(&Command::DrawArrays {
                primitive: Primitive::Points,
                first: 0,
                count: 2,
            })
        );
    }

    #[test]
    fn position_follows_direction_and_gravity() {
        let p = particle(1.0);
        assert_eq!(p.position_at(1.0), p.position);
        let at = p.position_at(3.0);
        assert!((at.x - 1.0).abs() < 1e-6);
        assert!((at.y - (0.5 * 2.0 - 4.0 / 8.0)).abs() < 1e-6);
    }

    #[test]
    fn emission_is_exact_at_any_frame_rate() {
        for fps in [30u32, 60, 144] {
            let mut api = RecordingApi::new();
            let mut system = ParticleSystem::new(&mut api, 10_000).unwrap();
            let mut s = shooter().with_rate(60.0);
            let mut total = 0;
            for frame in 1..=10 * fps {
                total += s.emit(&mut api, &mut system, frame as f32 / fps as f32);
            }
            assert_eq!(total, 600, "{fps} fps");
            assert_eq!(system.live_count(), 600);
        }
    }

    #[test]
    fn fractional_rates_accumulate_between_frames() {
        let mut api = RecordingApi::new();
        let mut system = ParticleSystem::new(&mut api, 100).unwrap();
        let mut s = shooter().with_rate(1.0);
        let counts: Vec<usize> = [0.5, 1.0, 1.5, 2.0, 2.5]
            .iter()
            .map(|t| s.emit(&mut api, &mut system, *t))
            .collect();
        assert_eq!(counts, vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn emission_is_capped_at_capacity() {
        let mut api = RecordingApi::new();
        let mut system = ParticleSystem::new(&mut api, 50).unwrap();
        let mut s = shooter().with_rate(100.0);
        s.emit(&mut api, &mut system, 2.0);
        assert_eq!(system.live_count(), 50);
    }

    #[test]
    fn a_long_stall_writes_one_ring_at_most() {
        let mut api = RecordingApi::new();
        let mut system = ParticleSystem::new(&mut api, 50).unwrap();
        let mut s = shooter().with_rate(60.0);
        api.take_commands();

        assert_eq!(s.emit(&mut api, &mut system, 3600.0), 50);
        let uploads = api
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::UpdateVertexBuffer { .. }))
            .count();
        assert_eq!(uploads, 50);

        // The skipped backlog is not owed later.
        assert_eq!(s.emit(&mut api, &mut system, 3601.0), 50);
        assert_eq!(s.emit(&mut api, &mut system, 3601.5), 30);
    }

    #[test]
    fn emit_at_most_respects_its_limit() {
        let mut api = RecordingApi::new();
        let mut system = ParticleSystem::new(&mut api, 100).unwrap();
        let mut s = shooter().with_rate(60.0);
        assert_eq!(s.emit_at_most(&mut api, &mut system, 1.0, 10), 10);
        assert_eq!(system.live_count(), 10);
        assert_eq!(s.emit_at_most(&mut api, &mut system, 1.5, 100), 30);
    }

    #[test]
    fn deleting_the_system_releases_its_buffer() {
        let mut api = RecordingApi::new();
        let system = ParticleSystem::new(&mut api, 10).unwrap();
        assert_eq!(api.buffer_count(), 1);
        system.delete(&mut api);
        assert_eq!(api.buffer_count(), 0);
    }

    #[test]
    fn repeated_time_emits_nothing() {
        let mut api = RecordingApi::new();
        let mut system = ParticleSystem::new(&mut api, 100).unwrap();
        let mut s = shooter();
        s.emit(&mut api, &mut system, 1.0);
        assert_eq!(s.emit(&mut api, &mut system, 1.0), 0);
    }

    #[test]
    fn jitter_stays_within_variance() {
        let mut s = shooter();
        let base = Vec3::new(0.0, 0.5, 0.0);
        for _ in 0..500 {
            let d = s.jittered_direction();
            let speed = d.length() / base.length();
            assert!((1.0..=2.0).contains(&speed));
            // Three axes of at most 2.5 degrees each.
            assert!(d.angle_between(base).to_degrees() < 7.5);
        }
    }

    #[test]
    fn same_seed_same_directions() {
        let mut a = shooter();
        let mut b = shooter();
        for _ in 0..10 {
            assert_eq!(a.jittered_direction(), b.jittered_direction());
        }
    }
}
