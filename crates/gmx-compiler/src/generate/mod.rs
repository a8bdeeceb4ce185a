//! Code generation: resolved AST to a standalone Go server program.
//!
//! The emission is a mechanical mapping - models become structs with
//! storage metadata and a validation routine, services become env-backed
//! config records, script functions become routed handlers, and the
//! template/style payloads are embedded as constants. Runtime scaffolding
//! (CSRF middleware, template plumbing, server boot) is appended verbatim
//! from [`runtime`].

mod golang;
mod runtime;


pub use golang::generate;
