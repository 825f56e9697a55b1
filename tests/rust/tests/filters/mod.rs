//! Body teeing and performance filter tests

mod performance_filter;
mod request_capture;
