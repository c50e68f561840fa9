// wayfinder_core/src/utils/easing.rs

/// Quadratic ease-out: fast start, decelerating to rest at `t = 1`.
/// The input is clamped to `[0, 1]`.
pub fn ease_out_quad(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * (2.0 - t)
}

/// A triangle wave that rises 0 -> 1 over one half-cycle and falls back over the next.
pub fn triangle_wave(elapsed: f64, half_cycle: f64) -> f64 {
    if half_cycle <= 0.0 {
        return 0.0;
    }
    let phase = (elapsed / half_cycle).max(0.0);
    let cycle = phase.floor();
    let frac = phase - cycle;
    if (cycle as u64) % 2 == 0 {
        frac
    } else {
        1.0 - frac
    }
}
