//! Inbound operator console messages.
//!
//! Each line from the console is one JSON object:
//!
//! ```text
//! {"command": "set_frequency", "value": 45}
//! {"command": "STOP"}
//! ```
//!
//! `value` may be a number or a numeric string and defaults to 0.

use hermod_common::control::command::Command;
use hermod_common::control::error::MessageError;
use serde::Deserialize;
use serde_json::Value;

/// Raw shape of an inbound line.
#[derive(Debug, Deserialize)]
struct InboundMessage {
    command: String,
    #[serde(default)]
    value: Option<Value>,
}

/// Parse one console line into a `Command`.
///
/// # Command names
///
/// | Name                   | Command                                   |
/// |------------------------|-------------------------------------------|
/// | `motor_power`          | `Start` if the integer part of value is 1, else `Stop` |
/// | `START` / `STOP`       | `Start` / `Stop`                          |
/// | `speed_limit`          | `SetSpeedLimit(value)`                    |
/// | `set_frequency`        | `SetThrottle(value)`                      |
/// | `brake` / `brake_level`| `SetBrake(value)`                         |
///
/// # Errors
/// `MessageError::Malformed` for invalid JSON, a missing `command`, or a
/// non-numeric `value`; `MessageError::UnknownCommand` for any other name.
pub fn parse_command(line: &str) -> Result<Command, MessageError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(MessageError::Malformed("empty line".to_string()));
    }

    let msg: InboundMessage =
        serde_json::from_str(trimmed).map_err(|e| MessageError::Malformed(e.to_string()))?;

    let command = match msg.command.as_str() {
        "START" => Command::Start,
        "STOP" => Command::Stop,
        "motor_power" => {
            if numeric_value(&msg)?.trunc() == 1.0 {
                Command::Start
            } else {
                Command::Stop
            }
        }
        "speed_limit" => Command::SetSpeedLimit(numeric_value(&msg)?),
        "set_frequency" => Command::SetThrottle(numeric_value(&msg)?),
        "brake" | "brake_level" => Command::SetBrake(numeric_value(&msg)?),
        other => return Err(MessageError::UnknownCommand(other.to_string())),
    };
    Ok(command)
}

fn numeric_value(msg: &InboundMessage) -> Result<f64, MessageError> {
    match &msg.value {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| {
            MessageError::Malformed(format!("'{}' value out of range", msg.command))
        }),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| {
            MessageError::Malformed(format!("'{}' value {s:?} is not a number", msg.command))
        }),
        Some(other) => Err(MessageError::Malformed(format!(
            "'{}' value {other} is not a number",
            msg.command
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_stop_names() {
        assert_eq!(parse_command(r#"{"command":"START"}"#).unwrap(), Command::Start);
        assert_eq!(parse_command(r#"{"command":"STOP"}"#).unwrap(), Command::Stop);
    }

    #[test]
    fn test_motor_power() {
        assert_eq!(
            parse_command(r#"{"command":"motor_power","value":1}"#).unwrap(),
            Command::Start
        );
        assert_eq!(
            parse_command(r#"{"command":"motor_power","value":1.7}"#).unwrap(),
            Command::Start
        );
        assert_eq!(
            parse_command(r#"{"command":"motor_power","value":0}"#).unwrap(),
            Command::Stop
        );
        assert_eq!(
            parse_command(r#"{"command":"motor_power"}"#).unwrap(),
            Command::Stop
        );
    }

    #[test]
    fn test_valued_commands() {
        assert_eq!(
            parse_command(r#"{"command":"speed_limit","value":250}"#).unwrap(),
            Command::SetSpeedLimit(250.0)
        );
        assert_eq!(
            parse_command(r#"{"command":"set_frequency","value":"45.5"}"#).unwrap(),
            Command::SetThrottle(45.5)
        );
        assert_eq!(
            parse_command(r#"{"command":"brake","value":50}"#).unwrap(),
            Command::SetBrake(50.0)
        );
        assert_eq!(
            parse_command(r#"{"command":"brake_level","value":20}"#).unwrap(),
            Command::SetBrake(20.0)
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse_command(r#"{"command":"warp","value":9}"#),
            Err(MessageError::UnknownCommand("warp".to_string()))
        );
        // Names are case-sensitive.
        assert!(matches!(
            parse_command(r#"{"command":"start"}"#),
            Err(MessageError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_malformed_lines() {
        for line in [
            "",
            "not json",
            r#"{"value": 3}"#,
            r#"{"command":"brake","value":"hard"}"#,
            r#"{"command":"brake","value":[1]}"#,
        ] {
            assert!(
                matches!(parse_command(line), Err(MessageError::Malformed(_))),
                "line {line:?} should be malformed"
            );
        }
    }
}
