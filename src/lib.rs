pub mod advisor;
pub mod catalog;
pub mod config;
pub mod error;
pub mod lane;
pub mod packer;
pub mod planner;
pub mod plate;
pub mod render;
pub mod types;
