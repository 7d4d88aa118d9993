//! Plain-text rendering of history items

use chrono::{DateTime, Local, Utc};
use unicode_width::UnicodeWidthStr;

use super::error_block::render_error;
use super::item::{HistoryItem, ItemKind};

/// Settings which affect how an item is rendered
#[derive(Debug, Clone, Copy)]
pub struct RenderSettings<'a> {
    /// Available width in columns
    pub width: usize,
    /// Reference time for deciding whether to show the date
    pub now: DateTime<Utc>,
    /// Maximum number of stack frames shown for an error
    pub max_stack_frames: usize,
    /// Module prefixes hidden from stack frames
    pub stack_frame_filters: &'a [String],
}

/// Render one history item as a block of lines
///
/// The header holds the kind prefix and line, with the duration and start
/// time right-aligned. Output and any error follow, then a blank spacer line.
#[must_use]
pub fn render_item(item: &HistoryItem, settings: &RenderSettings<'_>) -> String {
    let mut lines = Vec::with_capacity(4);

    match item.kind {
        ItemKind::HistoryRestored => {
            let label = format!("-- {} ", item.line);
            let fill = settings.width.saturating_sub(label.width());
            lines.push(format!("{label}{}", "-".repeat(fill)));
        }
        ItemKind::Command | ItemKind::InternalError => {
            let prefix = if item.kind == ItemKind::Command { "> " } else { "!! " };
            let header = format!("{prefix}{}", item.line);
            let time = time_label(item, settings.now);
            let gap = settings
                .width
                .saturating_sub(header.width() + time.width())
                .max(1);
            lines.push(format!("{header}{}{time}", " ".repeat(gap)));
        }
    }

    let output = if item.output.is_empty() {
        item.streaming_output.trim_end()
    } else {
        item.output.as_str()
    };
    if !output.is_empty() {
        lines.push(output.to_string());
    }

    if let Some(error) = &item.error {
        let block = render_error(
            error,
            settings.max_stack_frames,
            settings.stack_frame_filters,
        );
        if !block.is_empty() {
            lines.push(block);
        }
    }

    lines.push(String::new());
    lines.join("\n")
}

fn time_label(item: &HistoryItem, now: DateTime<Utc>) -> String {
    let started = item.started.with_timezone(&Local);
    let mut label = if item.started < now - chrono::Duration::hours(24) {
        started.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        started.format("%H:%M:%S").to_string()
    };

    if let Some(duration) = item.duration() {
        label = format!("({}ms) {label}", duration.num_milliseconds());
    }
    label
}
