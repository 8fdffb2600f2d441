//! # Shared Types Crate
//!
//! This crate contains the primitive types shared across the Tempo-Chain
//! consensus crates.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Cross-crate primitives are defined here.
//! - **No Crypto**: Validated key types and hashing live in `shared-crypto`;
//!   this crate stays dependency-free.

pub mod entities;

pub use entities::*;
