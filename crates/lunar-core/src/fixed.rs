use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// `done / total` as a ratio clamped to [0, 1]. A zero total is complete.
pub fn ratio(done: u64, total: u64) -> Fixed64 {
    if total == 0 || done >= total {
        return Fixed64::ONE;
    }
    Fixed64::from_num(done) / Fixed64::from_num(total)
}

/// Convert Fixed64 to f64. Use only for display, never in the sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}
