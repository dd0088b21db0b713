//! Declarative dataflow engine.
//!
//! Nodes are instantiated from a graph document through a [`registry::Registry`]
//! and wired together by named channels. Every node zip-joins its inputs,
//! applies a transformation and broadcasts the result to its outputs, closing
//! them once its inputs are exhausted.

extern crate self as assembly;

pub mod core;
pub mod engine;
pub mod nodes;
pub mod observability;
pub mod registry;

pub use anyhow;
pub use assembly_macros::node_sub;
