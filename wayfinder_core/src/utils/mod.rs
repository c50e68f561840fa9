// wayfinder_core/src/utils/mod.rs

pub mod angles;
pub mod easing;
