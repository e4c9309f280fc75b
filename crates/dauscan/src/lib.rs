// Module structure for the dauscan active-user scanner.

// Core pipeline
pub mod logs;
pub mod store;

// Process surface
pub mod cli;
pub mod conf;
pub mod runtime;
