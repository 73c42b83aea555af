//! Generic typed property trees.
//!
//! Every decoded record, whatever its wire format, is flattened into a
//! [`PropertyTreeNode`]: a terminal [`PropertyValue`] with a [`Formatter`],
//! or an object/array container of named children.

mod formatter;
mod node;
mod value;

pub use formatter::{Formatter, SymbolTable};
pub use node::PropertyTreeNode;
pub use value::PropertyValue;
