//! Integration tests for devpanel.

pub mod headless_test;
pub mod http_transport_test;
pub mod panel_test;
pub mod persistence_test;
