//! Console output for the sample run.
//!
//! - [`terminal`] - VM summaries, connection hints, errors and phase banners

mod terminal;

pub use terminal::{connect_hint, format_error, format_vm, print_error, print_phase, print_vm};
