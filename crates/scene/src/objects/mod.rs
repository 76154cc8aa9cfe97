//! Geometry objects. Each owns its vertex data, binds its attributes to the
//! matching program and issues its own draw call.

mod heightmap;
mod mallet;
mod particles;
mod skybox;
mod table;

pub use heightmap::Heightmap;
pub use mallet::Mallet;
pub use particles::{Particle, ParticleShooter, ParticleSystem};
pub use skybox::Skybox;
pub use table::Table;
