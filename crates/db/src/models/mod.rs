//! Row models and DTOs.
//!
//! Each submodule holds a `FromRow` + `Serialize` struct matching the
//! table row, plus any insert DTOs the repositories need. Enum-valued
//! columns (edit status, operation, vote type) are stored as TEXT and
//! exposed through typed accessors that parse on demand.

pub mod edit;
pub mod image;
pub mod performer;
pub mod scene;
pub mod site;
pub mod studio;
pub mod tag;
pub mod user;
