//! Habitual server: HTTP API, MCP server and the background reconciler
//! around [`habitual_core`].

pub mod api;
pub mod mcp;
pub mod scheduler;

pub use habitual_core::{db, models};
