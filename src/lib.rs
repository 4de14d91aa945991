pub mod config;
pub mod errors;
pub mod logging;
pub mod orchestrator;
pub mod progress;
pub mod steps;
pub mod ui;
