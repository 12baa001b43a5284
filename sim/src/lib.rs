//! Deterministic simulation host for vesture.
//!
//! This crate provides:
//!
//! - [`SimHost`], an in-memory [`engine::Host`] that records every effect
//! - [`SimCatalog`], a rule-based [`engine::Catalog`] with no data files
//! - [`display`], which drives one creation pass through a [`engine::StateListener`]
//! - Sample fixtures for tests, benches and scenario replay
//!
//! # Design Principles
//!
//! - **Reproducible** - No clocks, no randomness, handles allocated in order.
//! - **Observable** - Every host effect is logged and inspectable.

mod catalog;
mod fixtures;
mod host;
mod pass;

pub use catalog::{SimCatalog, RESTRICTED_SUBSTITUTE};
pub use fixtures::{armor, human_sample, weapon};
pub use host::{Effect, SimHost, SimObject};
pub use pass::display;
