//! m3 integration tests.
//!
//! Everything runs in-process: the swarm is the scripted `FakeSwarm`, and
//! forwarding tests use real loopback sockets only.
//!
//!   cargo test --test integration

mod infra;

mod admission;
mod discovery;
mod forwarding;
mod resolution;
