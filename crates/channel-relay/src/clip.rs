//! Clipping: splitting an oversized event into a bounded chain of pieces
//! whose formatted length each fits the per-message budget.
//!
//! The split is an explicit operation returning new values; the head piece
//! retains the leading cut of the message and each continuation carries the
//! overflow, further split while still oversized. The error dump rides with
//! the head piece only, so continuation overhead is recomputed per piece.

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::event::LogEvent;
use crate::format::formatting_overhead;

/// Splits `message` after `count` characters, on a character boundary.
fn split_at_chars(message: String, count: usize) -> (String, String) {
    match message.char_indices().nth(count) {
        Some((byte_index, _)) => {
            let tail = message[byte_index..].to_string();
            let mut head = message;
            head.truncate(byte_index);
            (head, tail)
        }
        None => (message, String::new()),
    }
}

fn truncate_to_chars(message: String, count: usize) -> String {
    split_at_chars(message, count).0
}

/// Splits `event` into the head piece followed by up to `max_continuations`
/// continuation events, each fitting `budget` characters once formatted.
///
/// Fails with [`RelayError::FormattingOverflow`] when a piece's decoration
/// overhead alone reaches the budget, and with
/// [`RelayError::ClippingExhausted`] when the continuation cap is reached
/// with oversized text remaining. Both cases degrade to truncation instead
/// when `truncate_oversize` is configured.
pub(crate) fn split_to_budget(
    event: LogEvent,
    config: &RelayConfig,
    budget: usize,
    max_continuations: usize,
) -> Result<Vec<LogEvent>, RelayError> {
    let mut pieces = Vec::new();
    let mut current = event;
    let mut produced = 0;

    loop {
        let overhead = formatting_overhead(&current, config);
        if current.message_chars() + overhead < budget {
            break;
        }

        if overhead >= budget {
            if config.truncate_oversize {
                // The formatter's hard clamp bounds whatever this piece can
                // still show; nothing left to split.
                break;
            }
            return Err(RelayError::FormattingOverflow { overhead, budget });
        }

        let cutoff = budget - overhead;

        if produced == max_continuations {
            if config.truncate_oversize {
                if let Some(message) = current.message.take() {
                    current.message = Some(truncate_to_chars(message, cutoff));
                }
                break;
            }
            return Err(RelayError::ClippingExhausted {
                budget,
                max_pieces: max_continuations + 1,
            });
        }

        let message = current.message.take().unwrap_or_default();
        let (head, tail) = split_at_chars(message, cutoff);
        current.message = Some(head);

        if tail.is_empty() {
            break;
        }

        let next = current.continuation(tail);
        pieces.push(current);
        current = next;
        produced += 1;
    }

    pieces.push(current);
    Ok(pieces)
}
