//! isupipe read-path cache.
//!
//! A process-wide, in-memory mirror of the livestreaming service's relational
//! tables. Every entity cache is rebuilt by a full reload from the store; the
//! HTTP layer only ever reads from it.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
