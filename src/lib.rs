pub mod cli;
pub mod commands;
pub mod consensus;
pub mod gaps;
pub mod graph;
pub mod utils;
