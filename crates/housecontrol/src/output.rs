//! Output formatting: human text or JSON, with optional color.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde_json::Value;

use crate::cli::{ColorMode, OutputFormat};

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Render `data` in the chosen format; `text_fn` handles the text case.
pub fn render<T>(format: OutputFormat, data: &T, text_fn: impl Fn(&T) -> String) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Text => text_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
    }
}

pub fn render_json<T: serde::Serialize>(data: &T, compact: bool) -> String {
    let result = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    result.unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {e}\"}}"))
}

/// Print to stdout; a closed pipe ends output quietly.
pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// One `label: value` line, value highlighted when color is on.
pub fn field(label: &str, value: &Value, color: bool) -> String {
    let text = describe(value);
    if color {
        format!("{:<12} {}", format!("{label}:").bold(), text.cyan())
    } else {
        format!("{:<12} {text}", format!("{label}:"))
    }
}

/// Short text for an opaque status value.
fn describe(value: &Value) -> String {
    match value {
        Value::Null => "unknown".into(),
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => format!("{k}={s}"),
                other => format!("{k}={other}"),
            })
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}

/// Confirmation line for a completed command.
pub fn done(message: &str, color: bool) -> String {
    if color {
        format!("{} {message}", "✓".green())
    } else {
        format!("✓ {message}")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn objects_render_as_key_value_pairs() {
        assert_eq!(
            field("alarm", &json!({ "mode": "away", "ready": true }), false),
            "alarm:       mode=away ready=true"
        );
        assert_eq!(field("garage", &Value::Null, false), "garage:      unknown");
    }

    #[test]
    fn compact_json_is_one_line() {
        assert_eq!(render_json(&json!({ "a": 1 }), true), r#"{"a":1}"#);
    }
}
