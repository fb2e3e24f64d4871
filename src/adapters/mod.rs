// Adapters layer: concrete implementations of the domain ports (http, identity, notifications).

pub mod http;
pub mod identity;
pub mod notify;
