//! Integration tests

mod e2e_test;
mod reconnect_test;
