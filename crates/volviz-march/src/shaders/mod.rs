//! WGSL shader sources for GPU compute pipelines.
//! These are used by the wgpu backend when the `wgpu` feature is enabled.

#![allow(dead_code)] // Shaders used by wgpu backend

/// Per-pixel ray march over a tile atlas.
///
/// Bindings: packed RGBA8 atlas, packed R8 mask (4 texels per word),
/// RGBA32F output, frame parameters.
pub const RAYMARCH: &str = r#"
struct Params {
    inv_mv: mat4x4<f32>,
    clip_min: vec4<f32>,   // xyz box, w = near clip
    clip_max: vec4<f32>,   // xyz box, w = far clip
    tone: vec4<f32>,       // density, brightness, gamma_min, gamma_max
    misc: vec4<f32>,       // gamma_scale, mask_alpha, ortho_thickness, ortho_scale
    view: vec4<f32>,       // tan_half_fov, aspect, tstep, opacity exponent
    dims: vec4<u32>,       // width, height, steps, flags (1 = ortho, 2 = mip)
    tiles: vec4<u32>,      // tile_w, tile_h, depth, atlas_cols
    atlas: vec4<u32>,      // atlas_w, atlas_h, 0, 0
}

@group(0) @binding(0) var<storage, read> atlas: array<u32>;
@group(0) @binding(1) var<storage, read> mask: array<u32>;
@group(0) @binding(2) var<storage, read_write> dst: array<vec4<f32>>;
@group(0) @binding(3) var<uniform> params: Params;

const MAX_STEPS: u32 = 512u;

struct SliceSample {
    color: vec4<f32>,
    mask: f32,
}

fn pcg_hash(v: u32) -> u32 {
    let state = v * 747796405u + 2891336453u;
    let word = ((state >> ((state >> 28u) + 4u)) ^ state) * 277803737u;
    return (word >> 22u) ^ word;
}

fn dither(px: u32, py: u32) -> f32 {
    let h = pcg_hash(px ^ pcg_hash(py));
    return f32(h >> 8u) / 16777216.0;
}

fn pow0(base: f32, e: f32) -> f32 {
    if base <= 0.0 { return 0.0; }
    return pow(base, e);
}

fn glsl_mod(x: f32, y: f32) -> f32 {
    return x - y * floor(x / y);
}

fn atlas_texel(x: u32, y: u32) -> vec4<f32> {
    return unpack4x8unorm(atlas[y * params.atlas.x + x]);
}

fn mask_texel(x: u32, y: u32) -> f32 {
    let i = y * params.atlas.x + x;
    let word = mask[i / 4u];
    return f32((word >> ((i % 4u) * 8u)) & 0xffu) / 255.0;
}

fn fetch_slice(z: u32, s: f32, t: f32) -> SliceSample {
    let tw = params.tiles.x;
    let th = params.tiles.y;
    let cols = params.tiles.w;
    let ox = (z % cols) * tw;
    let oy = (z / cols) * th;

    let fx = clamp(s * f32(tw) - 0.5, 0.0, f32(tw - 1u));
    let fy = clamp(t * f32(th) - 0.5, 0.0, f32(th - 1u));
    let x0 = u32(floor(fx));
    let y0 = u32(floor(fy));
    let x1 = min(x0 + 1u, tw - 1u);
    let y1 = min(y0 + 1u, th - 1u);
    let wx = fx - f32(x0);
    let wy = fy - f32(y0);

    let c_top = mix(atlas_texel(ox + x0, oy + y0), atlas_texel(ox + x1, oy + y0), wx);
    let c_bot = mix(atlas_texel(ox + x0, oy + y1), atlas_texel(ox + x1, oy + y1), wx);
    let m_top = mix(mask_texel(ox + x0, oy + y0), mask_texel(ox + x1, oy + y0), wx);
    let m_bot = mix(mask_texel(ox + x0, oy + y1), mask_texel(ox + x1, oy + y1), wx);
    return SliceSample(mix(c_top, c_bot, wy), mix(m_top, m_bot, wy));
}

fn sample_volume(pos: vec3<f32>) -> vec4<f32> {
    if any(pos < vec3<f32>(0.0)) || any(pos > vec3<f32>(1.0)) {
        return vec4<f32>(0.0);
    }
    let depth = params.tiles.z;
    let z = pos.z * (f32(depth) + 0.0001);
    let zfloor = floor(z);
    let frac = z - zfloor;
    let z0 = min(u32(zfloor), depth - 1u);
    let z1 = min(z0 + 1u, depth - 1u);

    let t = 1.0 - pos.y;
    let s0 = fetch_slice(z0, pos.x, t);
    let s1 = fetch_slice(z1, pos.x, t);

    var m = mix(s0.mask, s1.mask, frac);
    m = mix(m, 1.0, params.misc.y);
    let col = mix(s0.color, s1.color, frac);
    return vec4<f32>(col.rgb * m, col.a);
}

fn transfer(c: vec4<f32>) -> vec4<f32> {
    let x = max(c.r, max(c.g, c.b));
    let gmin = params.tone.z;
    let span = params.tone.w - gmin;
    var xi = 0.0;
    if span > 0.0 {
        xi = clamp((x - gmin) / span, 0.0, 1.0);
    } else if x >= gmin {
        xi = 1.0;
    }
    return vec4<f32>(c.rgb, clamp(pow0(xi, params.misc.x), 0.0, 1.0));
}

fn accumulate(col_in: vec4<f32>, s: f32, acc: vec4<f32>) -> vec4<f32> {
    let a = 1.0 - pow0(1.0 - col_in.a, s);
    let col = clamp(vec4<f32>(col_in.rgb * a, a), vec4<f32>(0.0), vec4<f32>(1.0));
    return col * (1.0 - acc.a) + acc;
}

fn accumulate_max(col: vec4<f32>, acc: vec4<f32>) -> vec4<f32> {
    return vec4<f32>(max(acc.rgb, col.rgb * col.a), max(acc.a, col.a));
}

@compute @workgroup_size(16, 16)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let w = params.dims.x;
    let h = params.dims.y;
    let px = id.x;
    let py = id.y;
    if px >= w || py >= h { return; }
    let idx = py * w + px;

    let u = (f32(px) + 0.5) / f32(w);
    let v = 1.0 - (f32(py) + 0.5) / f32(h);
    let nx = 2.0 * u - 1.0;
    let ny = 2.0 * v - 1.0;
    let aspect = params.view.y;

    var ro: vec3<f32>;
    var rd: vec3<f32>;
    if (params.dims.w & 1u) != 0u {
        let s = params.misc.w;
        rd = (params.inv_mv * vec4<f32>(0.0, 0.0, -2.0, 0.0)).xyz;
        ro = (params.inv_mv * vec4<f32>(nx * s * aspect, ny * s, 1.0, 1.0)).xyz;
    } else {
        let th = params.view.x;
        ro = (params.inv_mv * vec4<f32>(0.0, 0.0, 0.0, 1.0)).xyz;
        let through = (params.inv_mv * vec4<f32>(nx * th * aspect, ny * th, -1.0, 1.0)).xyz;
        rd = normalize(through - ro);
    }

    let inv_r = vec3<f32>(1.0) / rd;
    let tbot = inv_r * (params.clip_min.xyz - ro);
    let ttop = inv_r * (params.clip_max.xyz - ro);
    let tmin = min(ttop, tbot);
    let tmax = max(ttop, tbot);
    let tnear = max(max(tmin.x, tmin.y), tmin.z);
    let tfar = min(min(tmax.x, tmax.y), tmax.z);
    if !(tfar > tnear) {
        dst[idx] = vec4<f32>(0.0);
        return;
    }

    let tbegin = max(tnear, params.clip_min.w);
    let tend = tfar;
    let tstep = params.view.z;
    let s = params.view.w;

    var r = 0.0;
    if params.tiles.z > 1u {
        r = 0.5 - dither(px, py);
    }
    let overflow = glsl_mod(r * tstep - tend, tstep);
    var t = tbegin + overflow + r * tstep;

    let mip = (params.dims.w & 2u) != 0u;
    var acc = vec4<f32>(0.0);
    for (var i = 0u; i < MAX_STEPS; i = i + 1u) {
        let pos = ro + rd * t + vec3<f32>(0.5);
        var col = transfer(sample_volume(pos));
        col = vec4<f32>(col.rgb * params.tone.y, col.a);
        if mip {
            acc = accumulate_max(col, acc);
        } else {
            col.a = col.a * params.tone.x;
            acc = accumulate(col, s, acc);
        }
        t = t + tstep;
        if t > tend || t > tbegin + params.clip_max.w { break; }
        if acc.a >= 1.0 { break; }
    }

    dst[idx] = clamp(acc, vec4<f32>(0.0), vec4<f32>(1.0));
}
"#;
