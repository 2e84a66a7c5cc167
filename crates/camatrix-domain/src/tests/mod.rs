//! Test support and test suites for the domain crate.

mod mocks;
