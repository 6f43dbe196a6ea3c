//! Integration tests for the pfx crates.
//!
//! End-to-end checks that run the built-in effects through the slicer and
//! the tiled renderer together:
//!
//! - `slicing`: coverage and disjointness of slices, the minimal first tile
//! - `determinism`: parallel output against in-order serial rendering
//! - `lifecycle`: abort, fault surfacing, progress ordering
//! - `scenarios`: fixed inputs with known outputs, config-driven renders

#[cfg(test)]
mod determinism;
#[cfg(test)]
mod lifecycle;
#[cfg(test)]
mod scenarios;
#[cfg(test)]
mod slicing;
