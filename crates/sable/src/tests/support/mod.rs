//! Test harness utilities for the start-up behavioural suite.

mod doubles;
mod timeline;
mod world;

pub use world::{TestWorld, world};
