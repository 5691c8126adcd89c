//! Actor+Relay primitives for the map page.
//!
//! Browser callbacks only ever `send` into a [`Relay`]. One [`Actor`] owns the map
//! viewer and drains the relay streams sequentially, so handlers never interleave.
//! Relays follow the `{source}_{event}_relay` naming pattern.

pub mod actor;
pub mod relay;

pub use actor::Actor;
pub use relay::{Relay, relay};
