// ============================================================================
// GPU SHADERS — WGSL kept inline for containment
// ============================================================================

// ============================================================================
// TILE KERNEL — group-shared tile load + box filter, with id visualisation
// ============================================================================
//
// Each 32x32 group cooperatively loads its tile plus a MAX_RADIUS apron into
// workgroup memory (edge-clamped), then every thread averages a
// (2r+1)^2 window from shared memory.  When a visualise flag is set the
// thread writes the corresponding identifier as a colour instead.
//
// Bindings are looked up by variable name (SourceTexture, ResultTexture,
// Params), so their @binding numbers may change without touching Rust code.
pub const TILES_SHADER: &str = r#"
const THREADS: u32 = 32u;
const MAX_RADIUS: i32 = 5;
const TILE: u32 = 42u;          // THREADS + 2 * MAX_RADIUS
const TILE_LEN: u32 = 1764u;    // TILE * TILE

struct TileParams {
    kernel_size: i32,
    visualize_dispatch_thread_id: u32,
    visualize_group_id: u32,
    visualize_group_thread_id: u32,
    visualize_group_index: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
};

@group(0) @binding(0) var SourceTexture: texture_2d<f32>;
@group(0) @binding(1) var ResultTexture: texture_storage_2d<rgba32float, write>;
@group(0) @binding(2) var<uniform> Params: TileParams;

var<workgroup> tile: array<vec4<f32>, TILE_LEN>;

@compute @workgroup_size(32, 32, 1)
fn K_Tiles(
    @builtin(global_invocation_id) dispatch_id: vec3<u32>,
    @builtin(workgroup_id) group_id: vec3<u32>,
    @builtin(local_invocation_id) group_thread_id: vec3<u32>,
    @builtin(local_invocation_index) group_index: u32,
    @builtin(num_workgroups) group_count: vec3<u32>,
) {
    let dims = vec2<i32>(textureDimensions(SourceTexture));
    let origin = vec2<i32>(group_id.xy * THREADS) - vec2<i32>(MAX_RADIUS);

    // 1764 texels, 1024 threads: two rounds cover the tile.
    for (var pass_idx = 0u; pass_idx < 2u; pass_idx = pass_idx + 1u) {
        let i = group_index + pass_idx * THREADS * THREADS;
        if (i < TILE_LEN) {
            let offset = vec2<i32>(i32(i % TILE), i32(i / TILE));
            let coord = clamp(origin + offset, vec2<i32>(0), dims - vec2<i32>(1));
            tile[i] = textureLoad(SourceTexture, coord, 0);
        }
    }
    workgroupBarrier();

    let pixel = vec2<i32>(dispatch_id.xy);
    if (pixel.x >= dims.x || pixel.y >= dims.y) {
        return;
    }

    let r = clamp(Params.kernel_size, 0, MAX_RADIUS);
    let center = vec2<i32>(group_thread_id.xy) + vec2<i32>(MAX_RADIUS);
    var sum = vec4<f32>(0.0);
    for (var dy = -r; dy <= r; dy = dy + 1) {
        for (var dx = -r; dx <= r; dx = dx + 1) {
            let p = center + vec2<i32>(dx, dy);
            sum = sum + tile[u32(p.y) * TILE + u32(p.x)];
        }
    }
    let taps = f32((2 * r + 1) * (2 * r + 1));
    var color = sum / taps;

    if (Params.visualize_dispatch_thread_id != 0u) {
        color = vec4<f32>(vec2<f32>(dispatch_id.xy) / vec2<f32>(dims), 0.0, 1.0);
    } else if (Params.visualize_group_id != 0u) {
        let groups = vec2<f32>(max(group_count.xy, vec2<u32>(1u)));
        color = vec4<f32>(vec2<f32>(group_id.xy) / groups, 0.0, 1.0);
    } else if (Params.visualize_group_thread_id != 0u) {
        color = vec4<f32>(vec2<f32>(group_thread_id.xy) / f32(THREADS), 0.0, 1.0);
    } else if (Params.visualize_group_index != 0u) {
        let v = f32(group_index) / f32(THREADS * THREADS);
        color = vec4<f32>(v, v, v, 1.0);
    }

    textureStore(ResultTexture, pixel, color);
}
"#;
