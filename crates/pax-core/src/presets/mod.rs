pub mod photoemission;
pub mod rixs;

pub use photoemission::resolve_broadening;
pub use rixs::resolve_source;
