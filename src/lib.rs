//! devpanel - a terminal control panel for an HTTP-controlled embedded device.
//!
//! This library exposes the core modules for the binary and for integration tests.

pub mod activity;
pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod connection;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod headless;
pub mod logging;
pub mod persistence;
pub mod tui;
