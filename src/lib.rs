//! Reconstructs a compilable C++-style SDK from a running game engine
//! process's reflection metadata: attach to a target, decode its interned
//! name pool and object table, rebuild the shape of every reflected class,
//! struct, enum, and function, and emit headers a consumer can compile
//! against.
//!
//! This crate is the reconstruction engine only. Process discovery, the
//! live memory backend, and the final CLI wiring are external
//! collaborators built around the [`reader::MemoryReader`] trait boundary.

pub mod context;
pub mod errors;
pub mod flags;
pub mod ident;
pub mod model;
pub mod names;
pub mod objects;
pub mod offsets;
pub mod package;
pub mod pointer_probe;
pub mod reader;
pub mod refgraph;
pub mod render;
pub mod resolver;
pub mod sizefix;

pub use context::Context;
pub use reader::{Addr, MemoryReader};
