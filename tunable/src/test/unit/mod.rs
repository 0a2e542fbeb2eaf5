pub mod config;
pub mod trial;
