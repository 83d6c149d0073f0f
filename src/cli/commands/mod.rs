//! CLI Commands module
//!
//! Each command follows a consistent pattern with dedicated Args and
//! Command structs.

// Command modules
pub mod favorites;
pub mod quote;
pub mod version;
pub mod watch;
