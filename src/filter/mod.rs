//! # Filter Module
//!
//! Filters are cross-cutting pre/post hooks a controller declares around its actions.
//!
//! A controller returns [`FilterSpec`]s from [`Controller::filters`](crate::Controller::filters);
//! each spec names a constructor in the [`FilterRegistry`] and carries its arguments. For every
//! dispatch the registry instantiates a [`FilterChain`], which the dispatcher runs in two
//! phases:
//!
//! - **pre**, before the action. A filter returning [`Flow::Halt`] stops the chain and the
//!   action is skipped. This is a deliberate short-circuit, not an error.
//! - **post**, after the action (or after a halted pre phase). Halting here only stops the
//!   remaining post filters.
//!
//! Filters whose [`Filter::applies_to`] rejects the current action are skipped in both phases.

mod core;
mod scope;

pub use core::{Filter, FilterChain, FilterFactory, FilterRegistry, FilterSpec, Flow, Phase};
pub use scope::ActionScope;
