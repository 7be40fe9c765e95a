//! Core circuit representation and exact symbolic algebra for rtds.
//!
//! This crate provides the two-terminal component model, the component
//! arena that the analysis pipeline reduces and expands in place, and the
//! [`Expr`] rational-function type every voltage, current and component
//! value is expressed in.

pub mod circuit;
pub mod component;
pub mod error;
pub mod expr;
pub mod node;
pub mod units;

pub use circuit::{Circuit, ComponentId};
pub use component::{Component, ComponentKind, Origin};
pub use error::{Error, Result};
pub use expr::{Expr, Symbol};
pub use node::NodeLabel;
