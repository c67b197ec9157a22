//! Peripheral drivers that only depend on `embedded-hal` traits

pub mod xpt2046;
