//! Connection management for devpanel.
//!
//! Tracks the device endpoint, probes it for liveness and remembers the last good one.

pub mod manager;

pub use manager::{
    ConnectionManager, ConnectionState, DeviceStatus, ProbeOutcome, ProbeSuccess, CERTIFICATE_HINT,
};
