//! Integration tests for sqlrun.

pub mod config_test;
pub mod docker_test;
pub mod init_test;
pub mod runner_test;
