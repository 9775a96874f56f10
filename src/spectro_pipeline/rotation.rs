//! Image rotation module
//!
//! The analysis only measures tilt; turning the pixels is delegated to an [`ImageRotator`].

mod rotator;
mod cpu_rotator;

pub use rotator::ImageRotator;
pub use cpu_rotator::CpuRotator;
