//! Plain-text rendering of command errors

use std::backtrace::BacktraceStatus;

use unicode_width::UnicodeWidthStr;

/// One parsed backtrace frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Demangled function path
    pub function: String,
    /// `file:line:column`, when known
    pub location: Option<String>,
}

/// Render an error as its message, its cause chain, and a trimmed stack trace
///
/// Frames are only shown when a backtrace was captured (`RUST_BACKTRACE` or
/// `RUST_LIB_BACKTRACE` set). Frames whose path starts with one of `filters`
/// are hidden and at most `max_frames` are listed.
#[must_use]
pub fn render_error(error: &anyhow::Error, max_frames: usize, filters: &[String]) -> String {
    let mut lines = vec![format!("Error: {error}")];
    for cause in error.chain().skip(1) {
        lines.push(format!("  caused by: {cause}"));
    }

    let backtrace = error.backtrace();
    if backtrace.status() == BacktraceStatus::Captured {
        let frames: Vec<Frame> = parse_backtrace(&backtrace.to_string())
            .into_iter()
            .filter(|frame| !is_filtered(&frame.function, filters))
            .collect();

        if !frames.is_empty() && max_frames > 0 {
            lines.push(String::new());
            lines.push("Stack trace:".to_string());

            let shown = &frames[..frames.len().min(max_frames)];
            let longest = shown
                .iter()
                .map(|frame| frame.function.width())
                .max()
                .unwrap_or(0);

            for frame in shown {
                match &frame.location {
                    Some(location) => {
                        let pad = longest - frame.function.width();
                        lines.push(format!(
                            "  at {}{} {location}",
                            frame.function,
                            " ".repeat(pad)
                        ));
                    }
                    None => lines.push(format!("  at {}", frame.function)),
                }
            }

            if frames.len() > shown.len() {
                lines.push(format!(
                    "... remaining {} frames omitted ...",
                    frames.len() - shown.len()
                ));
            }
        }
    }

    lines.join("\n")
}

/// Parse the text form of a `std::backtrace::Backtrace`
#[must_use]
pub fn parse_backtrace(text: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();

    for line in text.lines() {
        let line = line.trim_start();

        if let Some((index, function)) = line.split_once(": ")
            && !index.is_empty()
            && index.bytes().all(|b| b.is_ascii_digit())
        {
            frames.push(Frame {
                function: function.trim().to_string(),
                location: None,
            });
        } else if let Some(location) = line.strip_prefix("at ")
            && let Some(frame) = frames.last_mut()
        {
            frame.location = Some(location.trim().to_string());
        }
    }

    frames
}

fn is_filtered(function: &str, filters: &[String]) -> bool {
    let path = function.trim_start_matches('<');
    filters.iter().any(|prefix| {
        path.strip_prefix(prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    })
}
