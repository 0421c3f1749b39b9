//! Named-event pub/sub
//!
//! Resolvers own an [`EventBus`] and publish [`UPDATE_EVENT`] on it whenever a
//! watched template changes. Consumers holding compiled or cached templates
//! subscribe and drop their copy of the named template.
//!
//! ```text
//!   notify thread          EventBus                listeners
//!   ─────────────          ────────                ─────────
//!   file changed ──► emit("update", name) ──► cache eviction
//!                                         ──► CLI printer
//! ```
//!
//! Emission is synchronous and ordered: listeners run on the emitting thread
//! in the order they subscribed.

mod bus;

pub use bus::{EventBus, Listener, ListenerId, UPDATE_EVENT};
