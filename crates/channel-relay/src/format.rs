//! Pure event formatting: prefix + message body + suffix + error dump.
//!
//! The formatter also provides the static-overhead helper the clipper's
//! budget math is built on: `formatting_overhead` is the formatted length
//! minus the raw message length, i.e. everything the configuration wraps
//! around the message text.

use crate::config::RelayConfig;
use crate::constants::FENCE;
use crate::event::LogEvent;

/// Zero-width spaces break the fence run without changing what a reader
/// sees, keeping message text from closing the surrounding code block.
fn sanitize_fences(message: &str) -> String {
    message.replace(FENCE, "`\u{200B}`\u{200B}`\u{200B}")
}

fn truncate_chars(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text,
    }
}

fn render_parts(event: &LogEvent, config: &RelayConfig) -> String {
    let mut out = String::new();

    if let Some(prefixer) = &config.prefixer {
        out.push_str(&prefixer(event, config));
    }
    if let Some(message) = event.message.as_deref() {
        if config.use_code_blocks {
            out.push_str(&sanitize_fences(message));
        } else if let Some(escaper) = &config.escaper {
            out.push_str(&escaper(message));
        } else {
            out.push_str(message);
        }
    }
    if let Some(suffixer) = &config.suffixer {
        out.push_str(&suffixer(event, config));
    }
    if let Some(error) = &event.error {
        out.push('\n');
        out.push_str(&error.render());
    }

    out
}

/// Formats the event into the display line destined for a message body,
/// hard-clamped at `clip_budget` characters.
pub(crate) fn format_event(event: &LogEvent, config: &RelayConfig, clip_budget: usize) -> String {
    truncate_chars(render_parts(event, config), clip_budget)
}

/// Character count of the formatted display line.
pub(crate) fn formatted_len(event: &LogEvent, config: &RelayConfig, clip_budget: usize) -> usize {
    format_event(event, config, clip_budget).chars().count()
}

/// Characters the configuration adds around the raw message text: prefix,
/// suffix, error dump, and any escaping inflation. Computed from the
/// unclamped rendering so oversized decorations are detected rather than
/// hidden by the clamp; recomputed per piece by the clipper since the
/// prefix may depend on event content.
pub(crate) fn formatting_overhead(event: &LogEvent, config: &RelayConfig) -> usize {
    render_parts(event, config)
        .chars()
        .count()
        .saturating_sub(event.message_chars())
}
