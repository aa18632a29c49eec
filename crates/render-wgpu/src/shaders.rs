/// Uniform block shared by both shaders; mirrors `FrameUniforms`.
const FRAME_UNIFORMS: &str = r#"
struct Frame {
    view_proj: mat4x4<f32>,
    eye: vec4<f32>,
    ambient: vec4<f32>,
    spot_position: vec4<f32>,
    spot_direction: vec4<f32>,
    spot_cone: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;
"#;

const MESH_BODY: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) color: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = frame.view_proj * world_pos;
    out.world_position = world_pos.xyz;
    out.world_normal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;
    out.color = instance.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.world_normal);

    // Hemispheric: full sky colour facing the sky direction, black facing away.
    let hemi = (0.5 + 0.5 * dot(n, frame.ambient.xyz)) * frame.ambient.w;

    // Spot cone with cosine-power falloff.
    let to_frag = normalize(in.world_position - frame.spot_position.xyz);
    let cos_angle = dot(to_frag, frame.spot_direction.xyz);
    var spot = 0.0;
    if (cos_angle >= frame.spot_cone.x) {
        let falloff = pow(max(cos_angle, 0.0), frame.spot_direction.w);
        let facing = max(dot(n, -to_frag), 0.0);
        spot = falloff * facing * frame.spot_position.w;
    }

    return vec4<f32>(in.color.rgb * (hemi + spot), in.color.a);
}
"#;

const GRID_BODY: &str = r#"
struct GridVertex {
    @location(0) position: vec3<f32>,
};

@vertex
fn vs_grid(vertex: GridVertex) -> @builtin(position) vec4<f32> {
    return frame.view_proj * vec4<f32>(vertex.position, 1.0);
}

@fragment
fn fs_grid() -> @location(0) vec4<f32> {
    return vec4<f32>(0.35, 0.35, 0.35, 1.0);
}
"#;

/// WGSL for lit meshes: ground slab and room meshes, opaque or blended.
pub fn mesh_shader() -> String {
    format!("{FRAME_UNIFORMS}{MESH_BODY}")
}

/// WGSL for the ground grid lines.
pub fn grid_shader() -> String {
    format!("{FRAME_UNIFORMS}{GRID_BODY}")
}
