//! The message stack: the ordered set of log events being assembled into
//! one outbound message, with the bin-fitting arithmetic and the renderer
//! that turns a stack into a channel-ready body.
//!
//! # Fitting arithmetic
//!
//! `can_fit` sums the formatted length of every stacked item plus the
//! structural overhead the renderer will add: fence markers and the
//! highlight tag when code blocks are on, one joining newline per line,
//! per-line level markers when colorized, and the extra fence pair a
//! link-isolated line costs. A configurable safety margin is reserved on
//! top for channel-protocol framing.

use std::collections::HashSet;

use crate::config::RelayConfig;
use crate::constants::{COLOR_TAG, FENCE, LINE_MARKER_LEN, URL_RE};
use crate::event::LogEvent;
use crate::format::{format_event, formatted_len};

/// Ordered collection of events destined for one outbound message.
/// Insertion order is rendering order; an event id already present is not
/// re-added.
#[derive(Debug, Default)]
pub(crate) struct MessageStack {
    items: Vec<LogEvent>,
    ids: HashSet<u64>,
}

impl MessageStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
        self.ids.clear();
    }

    /// Adds an event; returns false when the same event is already stacked.
    pub(crate) fn push(&mut self, event: LogEvent) -> bool {
        if !self.ids.insert(event.id()) {
            return false;
        }
        self.items.push(event);
        true
    }

    /// Whether `candidate` fits this stack within the sink's per-message
    /// ceiling, accounting for all structural overhead the renderer adds.
    pub(crate) fn can_fit(
        &self,
        candidate: &LogEvent,
        config: &RelayConfig,
        clip_budget: usize,
        sink_max: usize,
    ) -> bool {
        let mut sum: usize = self
            .items
            .iter()
            .map(|item| formatted_len(item, config, clip_budget))
            .sum();

        if config.use_code_blocks {
            sum += FENCE.len() * 2;
            sum += self.items.len() + 1;
        } else {
            sum += self.items.len().saturating_sub(1);
        }

        if config.colored {
            sum += COLOR_TAG.len();
            sum += LINE_MARKER_LEN * self.items.len();
        }

        if config.split_blocks_for_links {
            sum += FENCE.len() * 2;
            sum += 2;
            if config.colored {
                sum += COLOR_TAG.len();
            }
        }

        sum + formatted_len(candidate, config, clip_budget) + config.safety_margin <= sink_max
    }

    /// Renders the stack into one message body.
    ///
    /// Lines containing a URL are isolated outside the shared fence when
    /// link splitting is enabled, closing and reopening the surrounding
    /// block around them so the link stays clickable. Degenerate empty
    /// fences left by isolation at the body's edges are stripped, and runs
    /// of blank lines are collapsed.
    pub(crate) fn render(&self, config: &RelayConfig, clip_budget: usize) -> String {
        let tag = if config.colored { COLOR_TAG } else { "" };

        let mut lines = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let isolate = config.split_blocks_for_links
                && item
                    .message
                    .as_deref()
                    .map_or(false, |message| URL_RE.is_match(message));

            let mut formatted = format_event(item, config, clip_budget);

            if isolate {
                if !config.allow_link_embeds {
                    formatted = URL_RE.replace_all(&formatted, "<$0>").into_owned();
                }
                lines.push(format!("{FENCE}\n{formatted}\n{FENCE}{tag}"));
            } else {
                if config.colored {
                    formatted = format!("{} {}", item.level.symbol(), formatted);
                }
                lines.push(formatted);
            }
        }

        let joined = lines.join("\n");
        let mut full = if config.use_code_blocks {
            format!("{FENCE}{tag}\n{joined}{FENCE}")
        } else {
            joined
        };

        if config.use_code_blocks {
            full = full.replace(&format!("{FENCE}{tag}{FENCE}"), "");
            full = full.replace(&format!("{FENCE}{tag}\n{FENCE}"), "");
        }

        while full.contains("\n\n") {
            full = full.replace("\n\n", "\n");
        }

        full
    }
}
