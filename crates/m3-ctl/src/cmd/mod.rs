//! CLI command modules.

pub mod http;
pub mod peers;
pub mod resolve;
pub mod status;
