pub mod config;
pub mod constants;
pub mod error;
pub mod graph;
pub mod rspec;
pub mod validation;
