//! Framing constants and default budgets for channel message assembly.
//!
//! The numeric values here mirror the framing costs of the target chat
//! channel (fence markers, syntax-highlight tag, per-line color markers)
//! and the default budgets the relay operates under. The budgets are
//! defaults, not law: `RelayConfig` exposes each of them so deployments can
//! match the framing costs of their actual channel.

use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;

/// Code-fence marker used to open and close a preformatted block.
pub(crate) const FENCE: &str = "```";

/// Syntax-highlight tag applied to fenced blocks when colorized rendering is
/// enabled. The `diff` language colors lines by their first character, which
/// is what the per-line level markers rely on.
pub(crate) const COLOR_TAG: &str = "diff";

/// Character cost of the per-line level marker (`"- "`, `"! "`, ...) that
/// colorized rendering prepends to every non-isolated line.
pub(crate) const LINE_MARKER_LEN: usize = 2;

/// Default total-character budget for one burst of messages produced from a
/// single oversized event. Together with the sink's per-message ceiling this
/// bounds how many continuation pieces the clipper may produce.
pub const DEFAULT_BATCH_TOTAL_BUDGET: usize = 10_000;

/// Default number of characters reserved for channel-protocol framing on top
/// of the computed structural overhead when fitting an item into a stack.
pub const DEFAULT_SAFETY_MARGIN: usize = 5;

/// Default headroom subtracted from the sink's per-message ceiling to obtain
/// the clipping budget, leaving room for the level marker and joining
/// newline of the piece itself.
pub const DEFAULT_CLIP_HEADROOM: usize = 20;

/// Default period between scheduled flush cycles.
pub const DEFAULT_FLUSH_PERIOD: Duration = Duration::from_millis(1500);

/// How long `FlushScheduler::shutdown` waits for an in-flight tick and the
/// final flush before giving up. A timeout here is tolerated; losing the
/// last tidbit of output is acceptable during shutdown.
pub(crate) const SHUTDOWN_WAIT: Duration = Duration::from_secs(5);

lazy_static! {
    /// Matches `http`/`https` URLs. Capture group 1 holds everything after
    /// the scheme, so a `$1` replacement de-links the URL while keeping the
    /// readable remainder. Used for link isolation, embed suppression, and
    /// the content-blocked delivery retry.
    pub(crate) static ref URL_RE: Regex = Regex::new(
        r"https?://((?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z0-9][a-zA-Z0-9-]{0,61}[a-zA-Z0-9]:?\d*/?[a-zA-Z0-9_/\-#.]*\??[a-zA-Z0-9\-_~:/?#\[\]@!$&'()*+,;=%.]*)"
    )
    .expect("URL pattern must compile");

    /// Matches ANSI color escape sequences so console-oriented producer
    /// output can be relayed as plain text.
    pub(crate) static ref ANSI_RE: Regex =
        Regex::new("\u{1B}\\[[\\d;]*m").expect("ANSI pattern must compile");
}
