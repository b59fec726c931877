//! Integration tests for the groundwork CLI
//!
//! These run the compiled binary end-to-end with `assert_cmd`. They exercise
//! argument parsing and configuration validation only — nothing here reaches
//! the network or spawns terraform, because validation fails first.

mod cli_tests;
