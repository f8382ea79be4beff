pub mod export_service;
pub mod session_service;
pub mod step_tracker;
