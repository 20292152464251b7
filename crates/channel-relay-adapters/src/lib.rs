//! Producer adapters for the channel relay.
//!
//! The relay core consumes [`channel_relay::LogEvent`]s; these adapters
//! convert framework-native output into that type and call `enqueue`. Each
//! adapter is registered explicitly by the hosting application; there is no
//! runtime probing for logging frameworks and no global process state is
//! replaced.
//!
//! - [`RelayLayer`]: a `tracing-subscriber` layer mirroring tracing events
//!   into the relay.
//! - [`RelayWriter`]: an injectable `io::Write` implementation that relays
//!   complete lines, for code that emits console-style output through a
//!   writer it lets you choose.

mod layer;
mod writer;

pub use layer::RelayLayer;
pub use writer::RelayWriter;
