//! Styled terminal output with theme-aware colors.
//!
//! Status lines go to stderr, streamed text to stdout. Colors adapt to the
//! terminal background and are disabled by `NO_COLOR` or when the stream is
//! not a terminal.

use std::io::{self, IsTerminal, Write};

use gemini_chat_protocol::StreamEvent;

/// Check if colors should be disabled based on NO_COLOR env var.
fn colors_disabled() -> bool {
    std::env::var("NO_COLOR")
        .map(|v| !v.is_empty() && v != "0" && v.to_lowercase() != "false")
        .unwrap_or(false)
}

fn use_colors(stderr: bool) -> bool {
    let is_terminal = if stderr {
        io::stderr().is_terminal()
    } else {
        io::stdout().is_terminal()
    };
    is_terminal && !colors_disabled()
}

/// ANSI color codes for light terminal backgrounds.
mod light_theme {
    pub const ERROR: &str = "\x1b[38;2;217;61;61m";
    pub const WARNING: &str = "\x1b[38;2;201;154;46m";
    pub const INFO: &str = "\x1b[38;2;0;100;160m";
    pub const DIM: &str = "\x1b[38;2;100;100;100m";
}

/// ANSI color codes for dark terminal backgrounds.
mod dark_theme {
    pub const ERROR: &str = "\x1b[38;2;255;107;107m";
    pub const WARNING: &str = "\x1b[38;2;255;200;87m";
    pub const INFO: &str = "\x1b[38;2;72;202;228m";
    pub const DIM: &str = "\x1b[38;2;130;154;177m";
}

const RESET: &str = "\x1b[0m";

/// Detect a light terminal background from COLORFGBG ("fg;bg").
///
/// Defaults to dark.
fn is_light_theme() -> bool {
    std::env::var("COLORFGBG")
        .ok()
        .and_then(|v| v.rsplit(';').next().and_then(|bg| bg.parse::<u8>().ok()))
        .is_some_and(|bg| bg >= 7)
}

/// Message type for styled output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Error,
    Warning,
    Info,
    Dim,
}

impl MessageType {
    fn icon(&self) -> &'static str {
        match self {
            MessageType::Error => "[ERROR]",
            MessageType::Warning => "[WARN]",
            MessageType::Info => "[INFO]",
            MessageType::Dim => "-",
        }
    }

    fn color(&self) -> &'static str {
        let light = is_light_theme();
        match (self, light) {
            (MessageType::Error, true) => light_theme::ERROR,
            (MessageType::Error, false) => dark_theme::ERROR,
            (MessageType::Warning, true) => light_theme::WARNING,
            (MessageType::Warning, false) => dark_theme::WARNING,
            (MessageType::Info, true) => light_theme::INFO,
            (MessageType::Info, false) => dark_theme::INFO,
            (MessageType::Dim, true) => light_theme::DIM,
            (MessageType::Dim, false) => dark_theme::DIM,
        }
    }
}

/// Wrap `text` in the color for `msg_type` when `colored`.
fn paint(msg_type: MessageType, text: &str, colored: bool) -> String {
    if colored {
        format!("{}{}{}", msg_type.color(), text, RESET)
    } else {
        text.to_string()
    }
}

fn format_line(msg_type: MessageType, message: &str, colored: bool) -> String {
    paint(
        msg_type,
        &format!("{} {}", msg_type.icon(), message),
        colored,
    )
}

fn print_styled(msg_type: MessageType, message: &str) {
    let line = format_line(msg_type, message, use_colors(true));
    let _ = writeln!(io::stderr(), "{line}");
}

/// Print an error message to stderr.
pub fn print_error(message: &str) {
    print_styled(MessageType::Error, message);
}

/// Print a warning message to stderr.
pub fn print_warning(message: &str) {
    print_styled(MessageType::Warning, message);
}

/// Print an info message to stderr.
pub fn print_info(message: &str) {
    print_styled(MessageType::Info, message);
}

/// Print a dimmed message to stderr.
pub fn print_dim(message: &str) {
    print_styled(MessageType::Dim, message);
}

/// Renders a streaming turn to stdout as events arrive.
///
/// Thoughts are dimmed and only shown when enabled. A blank line separates
/// the thought section from the answer.
#[derive(Debug)]
pub struct LiveView {
    show_thoughts: bool,
    colored: bool,
    in_thought: bool,
}

impl LiveView {
    pub fn new(show_thoughts: bool) -> Self {
        Self {
            show_thoughts,
            colored: use_colors(false),
            in_thought: false,
        }
    }

    /// Text to write for `event`, if any.
    fn render(&mut self, event: &StreamEvent) -> Option<String> {
        match event {
            StreamEvent::Thought(text) if self.show_thoughts => {
                self.in_thought = true;
                Some(paint(MessageType::Dim, text, self.colored))
            }
            StreamEvent::Thought(_) => None,
            StreamEvent::Message(text) if self.in_thought => {
                self.in_thought = false;
                Some(format!("\n\n{text}"))
            }
            StreamEvent::Message(text) => Some(text.clone()),
            StreamEvent::End(_) | StreamEvent::Error(_) => {
                self.in_thought = false;
                Some("\n".to_string())
            }
        }
    }

    /// Write `event` to stdout and flush.
    pub fn show(&mut self, event: &StreamEvent) {
        if let Some(text) = self.render(event) {
            let mut stdout = io::stdout().lock();
            let _ = write!(stdout, "{text}");
            let _ = stdout.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn plain(show_thoughts: bool) -> LiveView {
        LiveView {
            show_thoughts,
            colored: false,
            in_thought: false,
        }
    }

    #[test]
    fn test_message_type_icons() {
        assert_eq!(MessageType::Error.icon(), "[ERROR]");
        assert_eq!(MessageType::Warning.icon(), "[WARN]");
        assert_eq!(MessageType::Info.icon(), "[INFO]");
        assert_eq!(MessageType::Dim.icon(), "-");
    }

    #[test]
    fn test_format_line_without_color() {
        assert_eq!(
            format_line(MessageType::Error, "boom", false),
            "[ERROR] boom"
        );
    }

    #[test]
    fn test_format_line_with_color_resets() {
        let line = format_line(MessageType::Info, "hi", true);
        assert!(line.starts_with("\x1b["));
        assert!(line.ends_with(RESET));
        assert!(line.contains("[INFO] hi"));
    }

    #[test]
    fn test_live_view_separates_thoughts_from_answer() {
        let mut view = plain(true);
        let rendered: Vec<Option<String>> = [
            StreamEvent::Thought("x".into()),
            StreamEvent::Thought("y".into()),
            StreamEvent::Message("z".into()),
            StreamEvent::Message("!".into()),
            StreamEvent::done(),
        ]
        .iter()
        .map(|e| view.render(e))
        .collect();

        assert_eq!(
            rendered,
            vec![
                Some("x".to_string()),
                Some("y".to_string()),
                Some("\n\nz".to_string()),
                Some("!".to_string()),
                Some("\n".to_string()),
            ]
        );
    }

    #[test]
    fn test_live_view_hides_thoughts() {
        let mut view = plain(false);
        assert_eq!(view.render(&StreamEvent::Thought("x".into())), None);
        assert_eq!(
            view.render(&StreamEvent::Message("z".into())),
            Some("z".to_string())
        );
    }
}
