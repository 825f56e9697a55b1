//! Queue and flush loop integration tests
//!
//! Tests for the bounded queue under concurrent producers and for the
//! scheduled flush loop driven by virtual time.

mod bounded_queue;
