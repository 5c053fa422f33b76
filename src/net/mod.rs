//! Network surfaces: the REST transport, the realtime channel, and the wire
//! types they share.

pub mod api;
pub mod realtime;
pub mod types;
