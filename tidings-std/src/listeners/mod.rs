//! Standard listener implementations.

pub mod actions;

pub use actions::ActionTable;
