//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod tasks;

use crn_toolbox::{DataPacket, InPort};
use std::time::Duration;

/// Upper bound for any wait that is expected to succeed
pub fn test_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Receive a packet that is expected to arrive
pub fn expect_packet(port: &InPort) -> DataPacket {
    port.receive(test_timeout())
        .expect("receive cancelled")
        .expect("no packet within timeout")
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}
