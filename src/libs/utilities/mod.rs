// Helpers shared across the crate.

pub mod binary;
pub mod misc_utils;
pub mod platform;
pub mod timestamps;
