//! ABOUTME: Core error type, time helpers and tracing setup
//! ABOUTME: Foundation crate used by all other antidb components

pub mod error;
pub mod telemetry;
pub mod time;

pub use error::{Error, Result};
pub use time::{upload_date_segment, utc_now};
