//! # Usda - A crate for writing and reading USD-style .usda scene description
//!
//! ## Example
//!
//! ```ignore
//! use usda::{PrimPath, Stage, ValueType};
//!
//! /// Builds a tiny document and saves it
//! fn main() -> std::io::Result<()> {
//!     let mut stage = Stage::create_new("./scene.usd");
//!
//!     let root = stage.define(&PrimPath::new("/root"));
//!     root.create_attribute("count", ValueType::Int);
//!
//!     let child = stage.define(&PrimPath::new("/root/child"));
//!     child
//!         .create_relationship("parent")
//!         .set_targets(vec![PrimPath::new("/root")]);
//!
//!     stage.save()
//! }
//! ```
//!
//! ## The .usda file
//!
//! A `.usda` file is the text form of a scene description document: a tree of *prims*
//! (named, typed nodes, here always plain `Scope`s) where each prim carries typed
//! *attributes*, path-valued *relationships* and optionally *references* to other
//! documents. The file starts with a `#usda 1.0` header, may declare layer metadata such
//! as a default prim, and then nests `def` blocks:
//!
//! ```ignore
//! #usda 1.0
//! (
//!     defaultPrim = "reference"
//! )
//!
//! def Scope "reference"
//! {
//!     custom float test
//! }
//! ```
//!
//! ## This crate
//!
//! This crate provides three things that work together:
//!
//! - a runtime (`Stage`, `Prim`) to build and inspect a document tree in memory,
//! - a deterministic writer that serializes a stage into the text form, and
//! - a parser that reads the same text form back.
//!
//! The writer is a pure function of the stage's contents, so generating the same
//! hierarchy twice produces byte-identical files. That property is what makes the crate
//! useful for producing stress-test and regression fixtures, like the deeply nested
//! stage built by the `stage_builder` binary.
//!
//! ### Usage tips
//!
//! Prims are defined through their full path, and defining a path creates any missing
//! ancestors along the way, so `stage.define(&PrimPath::new("/a/b/c"))` is enough to get
//! a three-level hierarchy. Defining an existing path hands back the existing prim,
//! which makes it cheap to navigate and extend a tree in any order.
//!
//! ### Warnings
//!
//! This crate is meant to be used with trusted documents. While no unsafety is expected
//! from reading a malicious file, parse errors are reported but the runtime is somewhat
//! panic happy on API misuse: invalid path syntax, invalid identifiers and value-type
//! mismatches all panic rather than return a `Result`. You are meant to know what you
//! are authoring ahead of time. Parsing and I/O, where failure is a normal outcome,
//! return errors instead.
//!
//! ### Limitations
//!
//! Only the subset of the format the writer emits is supported: `Scope`-style prim
//! definitions, `custom` attribute and relationship declarations, prim references and
//! the `defaultPrim`/`doc` layer metadata. Composition is not implemented — references
//! are authored and written out, but never resolved or chased into other files. The
//! binary `.usdc` format is not supported at all; feeding one to `Stage::open` fails
//! with a missing-header error.

pub mod parsers;
pub mod path;
pub mod runtime;
pub mod value;

mod writer;

pub use path::PrimPath;
pub use runtime::{Attribute, Prim, Property, Reference, Relationship, Stage};
pub use value::{Value, ValueType};
