//! Filtrations as nested partitions of an outcome index set.
//!
//! Purpose
//! - Store the information structure of a finite process: the root cell holds
//!   every outcome, each child cell refines its parent, leaves are the finest
//!   cells.
//! - Give the constraint builder deterministic pre-order access to the cells at
//!   each depth.
//!
//! Why this design
//! - Nodes live in a flat arena and refer to each other by `NodeId`, so there
//!   are no ownership cycles and traversal order is a pure function of
//!   insertion order.
//! - Trees are built once; the only structural transformation
//!   (`generate::pull_up_children`) produces a fresh tree.
//!
//! Code cross-refs: `process::Process`, `constraints::build_constraints`.

mod tree;

pub use tree::{FiltrationNode, FiltrationTree, NodeId};
