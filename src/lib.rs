//! Client-side caching core for the Flux infinite canvas.
//!
//! | Module | Role |
//! |---|---|
//! | [`viewport`] | Pan/zoom camera and canvas geometry |
//! | [`coords`] | Cell, fetch-chunk and heatmap-chunk coordinates |
//! | [`mapper`] | Pure viewport → cell range / chunk set mapping |
//! | [`state`] | Cell, heatmap, lock and stats caches behind [`state::FluxStore`] |
//! | [`fetch`] | Deduplicated, throttled loaders for cells and heat |
//! | [`net`] | REST transport, realtime channel, wire types |
//! | [`input`] | Pointer/keyboard/wheel → viewport mutations |
//! | [`client`] | [`client::FluxClient`], wiring it all together |

pub mod client;
pub mod config;
pub mod consts;
pub mod coords;
pub mod fetch;
pub mod input;
pub mod mapper;
pub mod net;
pub mod state;
pub mod viewport;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use client::FluxClient;
pub use config::ClientConfig;
