//! sqlrun - Run SQL statements through a containerized database client.
//!
//! This library exposes the core modules for use by the binary and in
//! integration tests.

pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod init;
pub mod logging;
pub mod payload;
pub mod preflight;
pub mod runner;
pub mod runtime;
