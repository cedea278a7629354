//! Repository structs, one per aggregate.
//!
//! All methods take `&mut PgConnection` so callers choose the
//! transaction boundary.

pub mod edit_repo;
pub mod image_repo;
pub mod performer_repo;
pub mod scene_repo;
pub mod site_repo;
pub mod studio_repo;
pub mod tag_repo;
pub mod user_repo;

pub use edit_repo::EditRepo;
pub use image_repo::ImageRepo;
pub use performer_repo::PerformerRepo;
pub use scene_repo::SceneRepo;
pub use site_repo::SiteRepo;
pub use studio_repo::StudioRepo;
pub use tag_repo::TagRepo;
pub use user_repo::UserRepo;
