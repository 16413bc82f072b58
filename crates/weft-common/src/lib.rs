//! Shared infrastructure for the weft parser crates.
//!
//! - **Diagnostics** - severity, position, the [`diagnostic::DiagnosticSink`]
//!   trait and the shared [`diagnostic::Reporter`] handle
//! - **Console output** - [`ConsoleSink`] prints diagnostics in color

pub mod diagnostic;

pub use diagnostic::{
    ConsoleSink, Diagnostic, DiagnosticLog, DiagnosticSink, Position, Reporter, Severity, Stage,
};
