//! Loan Triage — classify, extract and route loan-servicing emails.

pub mod classifier;
pub mod config;
pub mod error;
pub mod inbox;
pub mod pipeline;
pub mod sink;
pub mod taxonomy;
