//! `shopdesk-auth`: the authenticated principal as seen by the core.
//!
//! Authentication and authorization policy live outside the core. The ledger
//! and order services only record who caused a change; this crate gives that
//! "who" a type.

pub mod principal;
pub mod roles;

pub use principal::{Principal, PrincipalId};
pub use roles::Role;
