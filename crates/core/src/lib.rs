//! reblang-core: the tagged value cell
//!
//! This crate holds the one type every other crate in the workspace is
//! built on: [`Cell`], a fixed-size record able to represent every
//! datatype the language knows about, at any quoting depth, without
//! allocating anything itself. Everything dynamic (blocks, strings,
//! objects, actions, ...) is a [`NodeId`] stored *inside* a cell's
//! payload; the node table itself lives one crate up, in `reblang-runtime`,
//! because walking and marking it requires knowing about frames and
//! contexts that this crate deliberately knows nothing about.
//!
//! # Modules
//!
//! - `kind`: the datatype discriminant and the built-in kind table.
//! - `cell`: the `Cell` struct, its flags, and quoting operations.

pub mod cell;
pub mod kind;

pub use cell::{Cell, CellFlags, EqMode, Extra, NodeId, Payload};
pub use kind::{Kind, MAX_KIND, QUOTE_SHIFT};
