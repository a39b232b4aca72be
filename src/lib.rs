//! Rounded corners and matching drop shadows for compositor-managed windows.
//!
//! The [`actor::decorator::Decorator`] reacts to window lifecycle events coming
//! from a [`sys::compositor::Compositor`] and keeps a rounded-corner effect and
//! a shadow actor in sync with each decorated window.

pub mod actor;
pub mod common;
pub mod model;
pub mod sys;
