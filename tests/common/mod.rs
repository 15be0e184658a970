//! Integration test common infrastructure.
//!
//! Spawns eurekad instances and talks to them over HTTP.

pub mod client;
pub mod server;

#[allow(unused_imports)]
pub use client::ApiClient;
#[allow(unused_imports)]
pub use server::TestServer;
