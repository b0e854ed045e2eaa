//! End-to-end tests over the public API and the `cmdgate` binary.

pub mod cli_test;
pub mod dispatch_test;
pub mod permissions_test;
pub mod reload_test;
