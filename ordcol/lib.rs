//! In-memory ordered associative containers backed by a B+-tree engine with
//! per-node subtree counts, giving O(log N) positional/rank access in
//! addition to the usual O(log N) key lookup.
//!
//! The two public facades are [`OrderedSet`] and [`OrderedDict`]; both share
//! the same underlying engine and accept a configurable comparator and
//! duplicate-key bias.

mod arena;
mod bias;
mod engine;
mod error;
mod iter;
mod node;

pub mod dict;
pub mod set;

pub use bias::Bias;
pub use dict::{KeysView, OrderedDict, ValuesView};
pub use error::{Error, Result};
pub use iter::{Backward, Forward, Range};
pub use set::OrderedSet;
