//! Infrastructure for the network listener.

pub mod tls;

pub use tls::{acceptor, build_server_config};
