//! Integration tests: file round trips, directory reconciliation, CLI parsing

mod cli_contracts;
mod roundtrip;
mod watch;
