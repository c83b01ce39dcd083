// src/lib.rs

//! Scano: external security posture scanner for web origins.
//!
//! `core::scanner::Scanner::scan` is the entry point. It normalizes and
//! guards the target, runs the header, TLS, DNS and optional endpoint probes
//! concurrently, and returns a `ScanReport` that the `report` renderers and
//! the `api` layer consume.

pub mod api;
pub mod core;
pub mod logging;
pub mod report;
