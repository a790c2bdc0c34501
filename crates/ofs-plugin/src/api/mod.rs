//! Volume plugin protocol served over a Unix socket.

pub mod server;
pub mod types;

pub use server::app;
