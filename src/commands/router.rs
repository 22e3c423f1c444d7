//! Command parsing and routing for devpanel.
//!
//! Parses a typed input line into a structured [`Command`]. Malformed input (unknown
//! command, missing pin, bad JSON, ...) is rejected here as a validation error, before
//! anything reaches the device.

use super::tokenizer::{tokenize_spanned, Spanned, Token};
use crate::device::api::{parse_pin, GpioLevel, LedAction, OledCommand};
use crate::device::HttpMethod;
use crate::error::{PanelError, Result};

/// Arguments for the connect command. Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectArgs {
    /// Device host or IP address.
    pub host: Option<String>,
    /// Port text as typed; empty selects the scheme default.
    pub port: Option<String>,
    /// `Some(true)` for https, `Some(false)` for http.
    pub secure: Option<bool>,
}

impl ConnectArgs {
    pub fn is_empty(&self) -> bool {
        self.host.is_none() && self.port.is_none() && self.secure.is_none()
    }
}

/// Parsed command with arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Configure the endpoint (when arguments are given) and probe it.
    Connect(ConnectArgs),
    /// Probe the current endpoint again.
    Reconnect,
    /// Switch the LED.
    Led {
        action: LedAction,
        method: HttpMethod,
    },
    /// Ask the device to fetch a joke.
    Joke,
    /// Clear the OLED or show text on it.
    Oled(OledCommand),
    /// Drive a GPIO pin.
    Gpio { pin: u8, level: GpioLevel },
    /// Call an arbitrary endpoint.
    Custom {
        method: HttpMethod,
        path: String,
        body: Option<serde_json::Value>,
    },
    /// Log the current endpoint and connection state.
    Status,
    /// Clear the activity log.
    ClearLog,
    /// Log the command summary.
    Help,
    /// Exit the application.
    Quit,
}

/// Command router for parsing user input.
pub struct CommandRouter;

impl CommandRouter {
    /// Parses one input line. A leading `/` is accepted and ignored.
    pub fn parse(input: &str) -> Result<Command> {
        let input = input.trim();
        let input = input.strip_prefix('/').unwrap_or(input);

        let tokens = tokenize_spanned(input);
        let Some((head, args)) = tokens.split_first() else {
            return Err(PanelError::validation("Empty command"));
        };
        let Some(name) = head.token.as_word() else {
            return Err(unknown(&head.token.to_text()));
        };

        match name.to_lowercase().as_str() {
            "connect" => Self::parse_connect(args),
            "reconnect" => Ok(Command::Reconnect),
            "led" => Self::parse_led(args),
            "joke" => Ok(Command::Joke),
            "oled" => Self::parse_oled(input, args),
            "gpio" => Self::parse_gpio(args),
            "send" | "custom" => Self::parse_send(input, args),
            "status" => Ok(Command::Status),
            "clear" | "cls" => Ok(Command::ClearLog),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(unknown(other)),
        }
    }

    /// `connect [host] [port] [--https|--http]`, or `host=`, `port=`, `https=`.
    fn parse_connect(args: &[Spanned]) -> Result<Command> {
        let mut parsed = ConnectArgs::default();
        let mut positional = 0;

        for arg in args {
            match &arg.token {
                Token::KeyValue { key, value } => match key.to_lowercase().as_str() {
                    "host" | "ip" => parsed.host = Some(value.clone()),
                    "port" => parsed.port = Some(value.clone()),
                    "https" | "secure" => parsed.secure = Some(parse_bool(key, value)?),
                    _ => {
                        return Err(PanelError::validation(format!(
                            "Unknown connect option '{key}'. Expected host=, port= or https="
                        )))
                    }
                },
                Token::Flag(_) if arg.token.is_flag("https") => parsed.secure = Some(true),
                Token::Flag(_) if arg.token.is_flag("http") => parsed.secure = Some(false),
                Token::Flag(flag) => {
                    return Err(PanelError::validation(format!(
                        "Unknown connect flag '--{flag}'. Expected --https or --http"
                    )))
                }
                Token::Word(word) => {
                    match positional {
                        0 => parsed.host = Some(word.clone()),
                        1 => parsed.port = Some(word.clone()),
                        _ => {
                            return Err(PanelError::validation(format!(
                                "Unexpected connect argument '{word}'"
                            )))
                        }
                    }
                    positional += 1;
                }
            }
        }

        Ok(Command::Connect(parsed))
    }

    /// `led on|off|toggle [--post]`
    fn parse_led(args: &[Spanned]) -> Result<Command> {
        let mut action = None;
        let mut method = HttpMethod::Get;

        for arg in args {
            match &arg.token {
                Token::Flag(_) if arg.token.is_flag("post") => method = HttpMethod::Post,
                Token::Word(word) if action.is_none() => action = Some(LedAction::parse(word)?),
                other => {
                    return Err(PanelError::validation(format!(
                        "Unexpected led argument '{}'",
                        other.to_text()
                    )))
                }
            }
        }

        let action = action.ok_or_else(|| {
            PanelError::validation("LED action is required (on, off or toggle)")
        })?;
        Ok(Command::Led { action, method })
    }

    /// `oled clear` or `oled text <text...>`
    ///
    /// The text is kept as typed, spacing included. A single quoted token is unquoted.
    fn parse_oled(input: &str, args: &[Spanned]) -> Result<Command> {
        let Some((sub, rest)) = args.split_first() else {
            return Err(PanelError::validation(
                "OLED command is required (clear or text <text>)",
            ));
        };

        match sub.token.to_text().to_lowercase().as_str() {
            "clear" => Ok(Command::Oled(OledCommand::Clear)),
            "text" | "show" => {
                let text = match rest {
                    [only] => only.token.to_text(),
                    _ => input[sub.end..].trim().to_string(),
                };
                Ok(Command::Oled(OledCommand::text(text)?))
            }
            other => Err(PanelError::validation(format!(
                "Unknown OLED command '{other}'. Expected clear or text"
            ))),
        }
    }

    /// `gpio <pin> <level>`, or `pin=` and `level=`.
    fn parse_gpio(args: &[Spanned]) -> Result<Command> {
        let mut pin = None;
        let mut level = None;

        for arg in args {
            match &arg.token {
                Token::KeyValue { key, value } if key == "pin" => pin = Some(parse_pin(value)?),
                Token::KeyValue { key, value } if key == "level" => {
                    level = Some(GpioLevel::parse(value)?)
                }
                Token::Word(word) if pin.is_none() => pin = Some(parse_pin(word)?),
                Token::Word(word) if level.is_none() => level = Some(GpioLevel::parse(word)?),
                other => {
                    return Err(PanelError::validation(format!(
                        "Unexpected gpio argument '{}'",
                        other.to_text()
                    )))
                }
            }
        }

        let pin = pin.ok_or_else(|| PanelError::validation("GPIO pin number is required"))?;
        let level =
            level.ok_or_else(|| PanelError::validation("GPIO level is required (0 or 1)"))?;
        Ok(Command::Gpio { pin, level })
    }

    /// `send <METHOD> <path> [json]`. The JSON body is taken verbatim from the rest of
    /// the line.
    fn parse_send(input: &str, args: &[Spanned]) -> Result<Command> {
        let (method, path) = match args {
            [method, path, ..] => (method, path),
            _ => {
                return Err(PanelError::validation(
                    "Usage: send <METHOD> <path> [json body]",
                ))
            }
        };

        let method = HttpMethod::parse(&method.token.to_text())?;
        let path = crate::device::api::custom_path(&path.token.to_text())?;

        let raw_body = input[args[1].end..].trim();
        let body = if raw_body.is_empty() {
            None
        } else {
            Some(serde_json::from_str(raw_body).map_err(|e| {
                PanelError::validation(format!("Request body is not valid JSON: {e}"))
            })?)
        };

        Ok(Command::Custom { method, path, body })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(PanelError::validation(format!(
            "Invalid value for {key}: '{value}'. Expected true or false"
        ))),
    }
}

fn unknown(name: &str) -> PanelError {
    PanelError::validation(format!(
        "Unknown command '{name}'. Type 'help' for available commands"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> Command {
        CommandRouter::parse(input).unwrap()
    }

    fn parse_err(input: &str) -> String {
        CommandRouter::parse(input).unwrap_err().to_string()
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse("reconnect"), Command::Reconnect);
        assert_eq!(parse("joke"), Command::Joke);
        assert_eq!(parse("status"), Command::Status);
        assert_eq!(parse("clear"), Command::ClearLog);
        assert_eq!(parse("help"), Command::Help);
        assert_eq!(parse("quit"), Command::Quit);
        assert_eq!(parse("exit"), Command::Quit);
    }

    #[test]
    fn test_case_insensitive_and_slash_prefix() {
        assert_eq!(parse("/JOKE"), Command::Joke);
        assert_eq!(parse("  Help "), Command::Help);
    }

    #[test]
    fn test_empty_and_unknown() {
        assert!(parse_err("   ").contains("Empty command"));
        assert!(parse_err("blink").contains("Unknown command 'blink'"));
    }

    #[test]
    fn test_parse_connect_positional() {
        assert_eq!(
            parse("connect 192.168.1.50 80"),
            Command::Connect(ConnectArgs {
                host: Some("192.168.1.50".into()),
                port: Some("80".into()),
                secure: None,
            })
        );
    }

    #[test]
    fn test_parse_connect_without_args() {
        let Command::Connect(args) = parse("connect") else {
            panic!("expected connect");
        };
        assert!(args.is_empty());
    }

    #[test]
    fn test_parse_connect_key_values_and_flags() {
        assert_eq!(
            parse("connect host=dev.local port= --https"),
            Command::Connect(ConnectArgs {
                host: Some("dev.local".into()),
                port: Some(String::new()),
                secure: Some(true),
            })
        );
        assert_eq!(
            parse("connect dev https=false"),
            Command::Connect(ConnectArgs {
                host: Some("dev".into()),
                port: None,
                secure: Some(false),
            })
        );
    }

    #[test]
    fn test_parse_connect_rejects_junk() {
        assert!(CommandRouter::parse("connect a 1 extra").is_err());
        assert!(CommandRouter::parse("connect --tls").is_err());
        assert!(CommandRouter::parse("connect https=maybe").is_err());
        assert!(CommandRouter::parse("connect user=x").is_err());
    }

    #[test]
    fn test_parse_led() {
        assert_eq!(
            parse("led on"),
            Command::Led {
                action: LedAction::On,
                method: HttpMethod::Get
            }
        );
        assert_eq!(
            parse("led toggle --post"),
            Command::Led {
                action: LedAction::Toggle,
                method: HttpMethod::Post
            }
        );
        assert!(CommandRouter::parse("led").is_err());
        assert!(CommandRouter::parse("led blink").is_err());
    }

    #[test]
    fn test_parse_oled() {
        assert_eq!(parse("oled clear"), Command::Oled(OledCommand::Clear));
        assert_eq!(
            parse("oled text Hello world"),
            Command::Oled(OledCommand::Text("Hello world".into()))
        );
        assert_eq!(
            parse(r#"oled text "a  b""#),
            Command::Oled(OledCommand::Text("a  b".into()))
        );
        assert_eq!(
            parse(r#"oled text say "hi" x=1"#),
            Command::Oled(OledCommand::Text(r#"say "hi" x=1"#.into()))
        );
        assert!(parse_err("oled text").contains("Text to display is required"));
        assert!(CommandRouter::parse("oled").is_err());
    }

    #[test]
    fn test_oled_text_keeps_spacing() {
        let Command::Oled(oled) = parse("oled text a   b  ") else {
            panic!("expected oled command");
        };
        assert_eq!(oled, OledCommand::Text("a   b".into()));
        assert_eq!(oled.path(), "/api/oled?text=a+++b");
    }

    #[test]
    fn test_parse_gpio() {
        assert_eq!(
            parse("gpio 5 1"),
            Command::Gpio {
                pin: 5,
                level: GpioLevel::High
            }
        );
        assert_eq!(
            parse("gpio pin=2 level=low"),
            Command::Gpio {
                pin: 2,
                level: GpioLevel::Low
            }
        );
        assert!(parse_err("gpio").contains("pin number is required"));
        assert!(parse_err("gpio 5").contains("level is required"));
        assert!(CommandRouter::parse("gpio x 1").is_err());
    }

    #[test]
    fn test_parse_send() {
        assert_eq!(
            parse("send get api/status"),
            Command::Custom {
                method: HttpMethod::Get,
                path: "/api/status".into(),
                body: None,
            }
        );
        assert_eq!(
            parse(r#"send POST /api/config {"name": "a b", "n": 2}"#),
            Command::Custom {
                method: HttpMethod::Post,
                path: "/api/config".into(),
                body: Some(serde_json::json!({"name": "a b", "n": 2})),
            }
        );
    }

    #[test]
    fn test_parse_send_errors() {
        assert!(parse_err("send GET").contains("Usage"));
        assert!(parse_err("send FETCH /x").contains("Unsupported HTTP method"));
        assert!(parse_err("send POST /x {oops").contains("not valid JSON"));
    }
}
