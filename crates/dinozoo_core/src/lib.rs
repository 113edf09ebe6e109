//! Core utilities for dinozoo.
//!
//! This crate provides foundational types shared by the GraphQL layers:
//! - `span`: Source location tracking and line/column mapping
//! - `diagnostics`: Error reporting

pub mod diagnostics;
pub mod span;

pub use diagnostics::{Diagnostic, DiagnosticBag};
pub use span::{LineIndex, Location, Span};
