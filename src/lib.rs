pub mod cli;
pub mod config;
pub mod data_paths;
pub mod display;
pub mod errors;
pub mod logging;
pub mod market;
pub mod portfolio;
pub mod watchlist;
