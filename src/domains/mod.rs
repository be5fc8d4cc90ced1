//! Domains module containing business logic organized by bounded contexts.
//!
//! The server only has one domain today: tools, from manifest loading down
//! to invocation dispatch.

pub mod tools;
