pub mod cli;
pub mod demo;
pub mod forest_core;
pub mod forest_runtime;
