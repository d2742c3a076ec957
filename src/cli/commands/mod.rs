//! CLI command implementations.

mod config;
mod doctor;
mod montage;

pub use config::run_config;
pub use doctor::run_doctor;
pub use montage::run_montage;
