//! Command-line surface: argument definitions, dispatch into [`Action`]s,
//! and the actions themselves.

pub mod actions;
pub mod commands;
pub mod dispatch;

pub use actions::Action;
