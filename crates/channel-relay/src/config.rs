//! Relay configuration: formatting hooks, accepted levels, logger name
//! mappings, message transformers, and the numeric framing budgets.
//!
//! Configuration is supplied once at construction and is read-only for the
//! lifetime of the relay; every flush cycle sees a consistent snapshot.
//!
//! # Rule ordering
//!
//! Logger mappings and message transformers are evaluated in insertion
//! order. Logger resolution stops at the first matching prefix. Message
//! transformation runs in two passes: any matching transformer whose mapper
//! returns `None` drops the event entirely, otherwise all matching mappers
//! are applied in order, each seeing the previous one's output.

use std::sync::Arc;

use crate::constants::{
    DEFAULT_BATCH_TOTAL_BUDGET, DEFAULT_CLIP_HEADROOM, DEFAULT_SAFETY_MARGIN,
};
use crate::event::{LogEvent, LogLevel};

/// Hook producing a prefix or suffix for a formatted event line.
pub type EventDecoratorFn = dyn Fn(&LogEvent, &RelayConfig) -> String + Send + Sync;

/// Maps a matched logger name to its display name; `None` drops the event.
pub type LoggerNameMapperFn = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Selects which events a message transformer applies to.
pub type EventPredicateFn = dyn Fn(&LogEvent) -> bool + Send + Sync;

/// Rewrites message text; `None` drops the event entirely.
pub type MessageMapperFn = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Escapes message text for the channel's markup when code-block rendering
/// is disabled. The escaping rules themselves belong to the hosting
/// application; the relay only applies the hook.
pub type EscaperFn = dyn Fn(&str) -> String + Send + Sync;

/// Configuration for a `ChannelRelay`.
pub struct RelayConfig {
    /// Prefix hook; defaults to `"[LEVEL logger] "` with the resolved
    /// logger name.
    pub prefixer: Option<Arc<EventDecoratorFn>>,
    /// Suffix hook; default none.
    pub suffixer: Option<Arc<EventDecoratorFn>>,
    /// Colorize output with per-line level markers and a highlight tag.
    pub colored: bool,
    /// Wrap each outbound message body in a code fence.
    pub use_code_blocks: bool,
    /// Render lines containing a URL outside the shared fenced block so the
    /// link stays clickable. Costs extra framing overhead per message.
    pub split_blocks_for_links: bool,
    /// When link isolation is active, whether the channel may render link
    /// previews. When false, isolated URLs are wrapped in `<...>`.
    pub allow_link_embeds: bool,
    /// Truncate pieces that cannot be reduced under budget instead of
    /// surfacing a fatal clipping error.
    pub truncate_oversize: bool,
    /// Markdown escaping hook, applied only when `use_code_blocks` is off.
    pub escaper: Option<Arc<EscaperFn>>,
    /// Levels accepted into the pipeline; events at other levels are
    /// dropped at processing time.
    pub levels: Vec<LogLevel>,
    /// Total-character budget for the burst of messages produced from one
    /// oversized event; bounds continuation count.
    pub batch_total_budget: usize,
    /// Characters reserved for channel-protocol framing when fitting an
    /// item into a stack.
    pub safety_margin: usize,
    /// Headroom subtracted from the sink's per-message ceiling to obtain
    /// the clipping budget.
    pub clip_headroom: usize,
    /// Ordered logger-name mappings; the first matching prefix wins. Use
    /// the `map_logger_name*` helpers to populate.
    pub logger_mappings: Vec<(String, Arc<LoggerNameMapperFn>)>,
    /// Ordered message transformers, evaluated in insertion order during
    /// the flush cycle.
    pub message_transformers: Vec<(Arc<EventPredicateFn>, Arc<MessageMapperFn>)>,
}

fn friendly_name(name: &str) -> String {
    name.rsplit('.').next().unwrap_or(name).to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            prefixer: Some(Arc::new(|event: &LogEvent, config: &RelayConfig| {
                let logger = config
                    .resolve_logger_name(&event.logger)
                    .unwrap_or_else(|| event.logger.clone());
                format!("[{} {}] ", event.level.as_str(), logger)
            })),
            suffixer: None,
            colored: true,
            use_code_blocks: true,
            split_blocks_for_links: false,
            allow_link_embeds: true,
            truncate_oversize: false,
            escaper: None,
            levels: LogLevel::all().to_vec(),
            batch_total_budget: DEFAULT_BATCH_TOTAL_BUDGET,
            safety_margin: DEFAULT_SAFETY_MARGIN,
            clip_headroom: DEFAULT_CLIP_HEADROOM,
            logger_mappings: Vec::new(),
            message_transformers: Vec::new(),
        }
    }
}

impl RelayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether events at `level` are accepted into the pipeline.
    pub fn accepts_level(&self, level: LogLevel) -> bool {
        self.levels.contains(&level)
    }

    /// Maps logger names starting with `prefix` to a fixed friendly name.
    ///
    /// ```
    /// # use channel_relay::RelayConfig;
    /// let mut config = RelayConfig::new();
    /// config.map_logger_name("net.dv8tion.jda", "JDA");
    /// assert_eq!(config.resolve_logger_name("net.dv8tion.jda.internal"), Some("JDA".into()));
    /// ```
    pub fn map_logger_name(&mut self, prefix: impl Into<String>, friendly: impl Into<String>) {
        let friendly = friendly.into();
        self.logger_mappings
            .push((prefix.into(), Arc::new(move |_| Some(friendly.clone()))));
    }

    /// Maps logger names starting with `prefix` through `mapper`. Returning
    /// `None` from the mapper drops events from that logger.
    pub fn map_logger_name_with(
        &mut self,
        prefix: impl Into<String>,
        mapper: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) {
        self.logger_mappings.push((prefix.into(), Arc::new(mapper)));
    }

    /// Maps logger names starting with `prefix` to their last dot-separated
    /// segment, turning `your.app.modules.Worker` into `Worker`.
    pub fn map_logger_name_friendly(&mut self, prefix: impl Into<String>) {
        self.logger_mappings
            .push((prefix.into(), Arc::new(|name| Some(friendly_name(name)))));
    }

    /// Like [`map_logger_name_friendly`](Self::map_logger_name_friendly),
    /// then passes the friendly segment through `mapper`.
    pub fn map_logger_name_friendly_with(
        &mut self,
        prefix: impl Into<String>,
        mapper: impl Fn(String) -> String + Send + Sync + 'static,
    ) {
        self.logger_mappings.push((
            prefix.into(),
            Arc::new(move |name| Some(mapper(friendly_name(name)))),
        ));
    }

    /// Resolves a logger name through the configured mappings. The first
    /// mapping whose prefix matches wins; `None` means events from this
    /// logger are dropped. Unmapped names resolve to themselves.
    pub fn resolve_logger_name(&self, name: &str) -> Option<String> {
        for (prefix, mapper) in &self.logger_mappings {
            if name.starts_with(prefix.as_str()) {
                return mapper(name);
            }
        }
        Some(name.to_string())
    }

    /// Registers a message transformer. Transformers run in insertion order
    /// during the flush cycle; a matching mapper returning `None` drops the
    /// event entirely.
    pub fn add_message_transformer(
        &mut self,
        predicate: impl Fn(&LogEvent) -> bool + Send + Sync + 'static,
        mapper: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) {
        self.message_transformers
            .push((Arc::new(predicate), Arc::new(mapper)));
    }
}
