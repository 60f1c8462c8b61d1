//! Chamber Narrative: a branching dialogue engine.
//!
//! Authored chambers are directed graphs of dialogue nodes keyed by
//! (context, variant). A [`Catalog`](core::catalog::Catalog) loads and
//! validates them once; the [`engine`](core::engine) then moves a
//! [`SessionState`](core::session::SessionState) through a graph one choice
//! at a time, without side effects.

pub mod core;
pub mod schema;
