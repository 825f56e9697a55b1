//! End-to-end pipeline tests
//!
//! Requests go through the full middleware chain into in-memory sinks.

mod end_to_end;
mod response_capture;
