//! Integration tests for Layer 4: Runtime
//!
//! Tests for the script host, command dispatch, bootstrap loading, and
//! actor workers, driven through a core world.

mod bootstrap;
mod dispatch;
mod faults;
mod fixture;
mod playthrough;
mod workers;
