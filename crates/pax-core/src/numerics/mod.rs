pub mod convolution;
pub mod grid;

pub use convolution::{
    adjoint_valid, convolve_valid, gaussian_kernel, gaussian_smooth, valid_convolution_length,
};
pub use grid::{log_spaced, uniform_axis, uniform_axis_over};
