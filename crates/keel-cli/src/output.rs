//! Shared output layer: human text or stable JSON for every command.

use serde::Serialize;
use std::io::{self, Write};

/// The two output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text.
    Human,
    /// Machine-readable JSON (one object per result, or a JSON array).
    Json,
}

/// A uniform error shape for JSON consumers.
#[derive(Debug, Serialize)]
pub struct CliError<'a> {
    pub error: &'a str,
    pub code: &'a str,
}

/// Render a value: JSON in JSON mode, the closure's text otherwise.
///
/// # Errors
///
/// Returns an error when serialization or the write fails.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut handle, value)?;
            writeln!(handle)?;
        }
        OutputMode::Human => human(value, &mut handle)?,
    }
    Ok(())
}

/// Render a one-line success message.
///
/// # Errors
///
/// Returns an error when the write fails.
pub fn render_success(mode: OutputMode, message: &str) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            println!("{}", serde_json::json!({ "ok": true, "message": message }));
        }
        OutputMode::Human => println!("{message}"),
    }
    Ok(())
}

/// Render an error to stderr in the selected mode.
pub fn render_error(mode: OutputMode, error: &CliError<'_>) {
    match mode {
        OutputMode::Json => {
            if let Ok(body) = serde_json::to_string(error) {
                eprintln!("{body}");
            }
        }
        OutputMode::Human => eprintln!("error[{}]: {}", error.code, error.error),
    }
}

/// Render a left-aligned key/value line in human output.
///
/// # Errors
///
/// Returns an error when the write fails.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

#[cfg(test)]
mod tests {
    use super::{pretty_kv, OutputMode};

    #[test]
    fn modes_compare() {
        assert_ne!(OutputMode::Human, OutputMode::Json);
    }

    #[test]
    fn kv_lines_align() {
        let mut buf = Vec::new();
        pretty_kv(&mut buf, "code", "ENG-0001").expect("write");
        let line = String::from_utf8(buf).expect("utf8");
        assert!(line.starts_with("code:"));
        assert!(line.contains("ENG-0001"));
    }
}
