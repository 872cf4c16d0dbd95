//! Flutter-facing bindings for the liability audit core.

pub mod api;
