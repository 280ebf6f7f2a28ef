//! MCP server over the memory store.
//! Binary entry point lives in main.rs; the reusable request handler is here.

mod server;

pub use server::Server;
