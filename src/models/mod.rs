//! Data models for registry entities.
//!
//! This module contains the data structures shared across the crate:
//!
//! - `Victim`: a census record with identity, descriptive fields, and
//!   a verification flag
//! - `VictimPatch`: the partial update applied by a verification toggle
//! - `UserProfile`, `AuthUser`, `Role`: the account model behind the
//!   admin-approval gate

pub mod user;
pub mod victim;

pub use user::{AuthUser, Role, UserProfile};
pub use victim::{Victim, VictimPatch};
