//! Test fixtures for dispatch-geo.
//!
//! Provides:
//! - Real Paris / Île-de-France delivery locations
//! - An in-process HTTP stub that stands in for the mapping web service

#![allow(dead_code)]

pub mod paris_locations;
pub mod stub_server;

pub use paris_locations::*;
pub use stub_server::*;
