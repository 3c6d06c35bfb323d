//! Core persistence layer for schoolbook.
//! Owns the School -> Student -> Address model, its SQLite schema and the
//! repositories that enforce cascade and orphan-removal rules.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;

pub use config::{AppConfig, ConfigError, Profile};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::address::{Address, AddressId};
pub use model::school::{Location, School, SchoolId};
pub use model::student::{Student, StudentId};
pub use repo::address_repo::{AddressRepository, SqliteAddressRepository};
pub use repo::school_repo::{SchoolRepository, SqliteSchoolRepository};
pub use repo::student_repo::{SqliteStudentRepository, StudentRepository};
pub use repo::{RepoError, RepoResult};
pub use seed::{run_startup_seed, sample_school, seed_sample_school};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
