//! Domain Hierarchy - Slash-delimited namespace nodes
//!
//! This library provides immutable hierarchy nodes with slash-delimited paths,
//! single-level wildcard support, and ancestor-or-self matching.

pub mod hierarchy_node;

pub use hierarchy_node::*;
