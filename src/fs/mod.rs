//! Filesystem utilities for the instance guard.
//!
//! Markers are published atomically and exclusively so that concurrent
//! starters can never observe a partially written marker.

pub mod atomic;

pub use atomic::publish_exclusive;
