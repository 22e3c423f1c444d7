//! Help text for panel commands.

/// Command summary logged by the `help` command and shown in the TUI sidebar.
pub const HELP_TEXT: &str = r#"Connection:
  connect [host] [port] [--https|--http]
  connect host=... port=... https=true|false
  reconnect        - Probe the current device again
  status           - Show endpoint and connection state

Device:
  led on|off|toggle [--post]
  joke             - Ask the device for a joke
  oled clear
  oled text <text...>
  gpio <pin> <0|1>
  send <METHOD> <path> [json body]

Panel:
  clear            - Clear the activity log
  help             - Show this help message
  quit, exit       - Exit the application

Keyboard shortcuts:
  Ctrl/Cmd+Enter   - Connect / reconnect
  Ctrl/Cmd+L       - Clear the log
  Ctrl+C, Ctrl+Q   - Exit application
  ↑/↓              - Input history
  PgUp/PgDn        - Scroll the log"#;

/// One-line hint logged when the TUI starts.
pub const SHORTCUT_TIP: &str = "Tip: Ctrl+Enter connects, Ctrl+L clears the log";
