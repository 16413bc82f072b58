//! Tree construction.
//!
//! Implements [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction):
//! all twenty-three insertion modes, the rules for foreign content, foster
//! parenting and the adoption agency algorithm. The tree itself lives behind
//! a [`TreeSink`].

/// The "in body" insertion mode and the adoption agency algorithm.
mod body;
/// Tree builder state, stacks and insertion helpers.
mod core;
/// The rules for parsing tokens in foreign content.
mod foreign;
/// SVG and MathML name and attribute fix-ups.
pub mod foreign_content;
/// Insertion modes outside the body and tables.
mod modes;
/// DOCTYPE-driven quirks mode selection.
pub mod quirks;
/// The output sink trait.
pub mod sink;
/// Table and select insertion modes.
mod table;
/// Element categories.
pub mod tags;

pub use self::core::{FragmentContext, InsertionMode, TreeBuilder};
pub use sink::{DocumentMode, Flow, SinkResult, TreeSink};
