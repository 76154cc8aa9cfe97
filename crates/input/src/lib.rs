//! Touch-surface input: pointer press, move and release become drag deltas.
//!
//! # Invariants
//! - Scenes consume [`Drag`] deltas, never raw window events.
//! - A move without a preceding press yields nothing.

pub mod drag;

pub use drag::{Drag, DragTracker, PointerEvent};

pub fn crate_info() -> &'static str {
    "vista-input v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("input"));
    }
}
