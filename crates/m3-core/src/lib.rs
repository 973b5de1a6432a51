//! m3-core — shared configuration, peer-identifier codec and address resolution.
//! All other m3 crates depend on this one.

pub mod config;
pub mod peer_id;
pub mod resolve;

pub use peer_id::{MultihashCodec, PeerIdCodec};
pub use resolve::{resolve, AliasError};
