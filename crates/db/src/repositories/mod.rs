//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod project_repo;
pub mod share_repo;
pub mod track_file_repo;
pub mod track_repo;
pub mod track_version_repo;
pub mod user_preference_repo;
pub mod user_repo;

pub use project_repo::ProjectRepo;
pub use share_repo::ShareRepo;
pub use track_file_repo::TrackFileRepo;
pub use track_repo::TrackRepo;
pub use track_version_repo::TrackVersionRepo;
pub use user_preference_repo::UserPreferenceRepo;
pub use user_repo::UserRepo;
