//! TUI widgets for devpanel.

pub mod header;
pub mod input;
pub mod log;
pub mod sidebar;
pub mod spinner;
