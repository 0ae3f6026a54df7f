pub mod analyze;
pub mod check_config;
pub mod extract;
pub mod status;
