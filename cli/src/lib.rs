//! Groundwork CLI library — exposes modules for integration testing.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod app;
pub mod assets;
pub mod cli;
pub mod cloud;
pub mod commands;
pub mod domain;
pub mod output;
pub mod terraform;
