//! The edit workflow: proposal construction, voting, application, and
//! the background pieces that keep the queue moving.
//!
//! [`service::EditService`] is the single entry point. Each mutating
//! operation runs inside one database transaction; the per-entity
//! processors in [`tag`], [`performer`], [`studio`], and [`scene`] build
//! payloads at proposal time and replay them at apply time.

pub mod error;
pub mod input;
pub mod mutator;
pub mod performer;
pub mod promotion;
pub mod scene;
pub mod service;
pub mod studio;
pub mod tag;
pub mod user;
pub mod validate;

pub use error::EditError;
pub use service::{EditService, ModerationPolicy};
pub use user::EditUser;
