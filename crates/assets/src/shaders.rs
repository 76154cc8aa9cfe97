//! Builtin WGSL sources, one constant per stage.
//!
//! Every vertex stage declares the shared uniform block at group 0, binding 0.
//! `u_Viewport` is written by the backend; point-sprite stages use it to
//! expand each point into a screen-aligned quad of six vertices.

/// Terrain: colour blends from grass to stone with height.
pub const HEIGHTMAP_VERTEX: &str = r#"
struct Uniforms {
    u_Matrix: mat4x4<f32>,
    u_Time: f32,
    u_Viewport: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) a_Position: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) v_Color: vec3<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.v_Color = mix(
        vec3<f32>(0.180, 0.467, 0.153),
        vec3<f32>(0.660, 0.670, 0.680),
        in.a_Position.y,
    );
    out.clip_position = uniforms.u_Matrix * vec4<f32>(in.a_Position, 1.0);
    return out;
}
"#;

pub const HEIGHTMAP_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(in.v_Color, 1.0);
}
"#;

/// Skybox: `xyww` pins every fragment to the far plane.
pub const SKYBOX_VERTEX: &str = r#"
struct Uniforms {
    u_Matrix: mat4x4<f32>,
    u_Time: f32,
    u_Viewport: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) a_Position: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) v_Position: vec3<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    // Cube maps use a left-handed lookup.
    out.v_Position = vec3<f32>(in.a_Position.xy, -in.a_Position.z);
    let clip = uniforms.u_Matrix * vec4<f32>(in.a_Position, 1.0);
    out.clip_position = clip.xyww;
    return out;
}
"#;

pub const SKYBOX_FRAGMENT: &str = r#"
@group(0) @binding(1)
var u_TextureUnit: texture_cube<f32>;
@group(0) @binding(2)
var u_Sampler: sampler;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(u_TextureUnit, u_Sampler, in.v_Position);
}
"#;

/// Particles: position is integrated on the GPU from start time, direction
/// and a constant downward pull.
pub const PARTICLE_VERTEX: &str = r#"
struct Uniforms {
    u_Matrix: mat4x4<f32>,
    u_Time: f32,
    u_Viewport: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

const POINT_SIZE: f32 = 25.0;

struct VertexInput {
    @builtin(vertex_index) corner: u32,
    @location(0) a_Position: vec3<f32>,
    @location(1) a_Color: vec3<f32>,
    @location(2) a_DirectionVector: vec3<f32>,
    @location(3) a_ParticleStartTime: f32,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) v_Color: vec3<f32>,
    @location(1) v_ElapsedTime: f32,
    @location(2) v_PointCoord: vec2<f32>,
};

fn quad_corner(index: u32) -> vec2<f32> {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    return corners[index % 6u];
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let elapsed = uniforms.u_Time - in.a_ParticleStartTime;
    var position = in.a_Position + in.a_DirectionVector * elapsed;
    position.y = position.y - elapsed * elapsed / 8.0;

    let center = uniforms.u_Matrix * vec4<f32>(position, 1.0);
    let corner = quad_corner(in.corner);
    let offset = corner * POINT_SIZE / uniforms.u_Viewport * center.w;
    out.clip_position = vec4<f32>(center.xy + offset, center.zw);
    out.v_Color = in.a_Color;
    out.v_ElapsedTime = elapsed;
    out.v_PointCoord = corner * vec2<f32>(0.5, -0.5) + vec2<f32>(0.5, 0.5);
    return out;
}
"#;

pub const PARTICLE_FRAGMENT: &str = r#"
@group(0) @binding(1)
var u_TextureUnit: texture_2d<f32>;
@group(0) @binding(2)
var u_Sampler: sampler;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let sprite = textureSample(u_TextureUnit, u_Sampler, in.v_PointCoord);
    return vec4<f32>(in.v_Color / max(in.v_ElapsedTime, 0.001), 1.0) * sprite;
}
"#;

/// Textured 2D geometry (the air hockey table).
pub const TEXTURE_VERTEX: &str = r#"
struct Uniforms {
    u_Matrix: mat4x4<f32>,
    u_Time: f32,
    u_Viewport: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) a_Position: vec2<f32>,
    @location(1) a_TextureCoordinates: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) v_TextureCoordinates: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.v_TextureCoordinates = in.a_TextureCoordinates;
    out.clip_position = uniforms.u_Matrix * vec4<f32>(in.a_Position, 0.0, 1.0);
    return out;
}
"#;

pub const TEXTURE_FRAGMENT: &str = r#"
@group(0) @binding(1)
var u_TextureUnit: texture_2d<f32>;
@group(0) @binding(2)
var u_Sampler: sampler;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(u_TextureUnit, u_Sampler, in.v_TextureCoordinates);
}
"#;

/// Per-vertex coloured points (the mallets).
pub const COLOR_VERTEX: &str = r#"
struct Uniforms {
    u_Matrix: mat4x4<f32>,
    u_Time: f32,
    u_Viewport: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

const POINT_SIZE: f32 = 10.0;

struct VertexInput {
    @builtin(vertex_index) corner: u32,
    @location(0) a_Position: vec2<f32>,
    @location(1) a_Color: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) v_Color: vec3<f32>,
};

fn quad_corner(index: u32) -> vec2<f32> {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    return corners[index % 6u];
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let center = uniforms.u_Matrix * vec4<f32>(in.a_Position, 0.0, 1.0);
    let offset = quad_corner(in.corner) * POINT_SIZE / uniforms.u_Viewport * center.w;
    out.clip_position = vec4<f32>(center.xy + offset, center.zw);
    out.v_Color = in.a_Color;
    return out;
}
"#;

pub const COLOR_FRAGMENT: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(in.v_Color, 1.0);
}
"#;
