//! Collection managers and the normalization migration job
//!
//! - [`CollectionManager`]: one backend plus event emission
//! - [`DualCollectionManager`]: knowledge + optional reflection
//! - [`normalize_data`]: batch re-normalization of stored text

pub mod dual;
pub mod migration;
pub mod single;

pub use dual::{CollectionKind, DualCollectionInfo, DualCollectionManager, HalfInfo};
pub use migration::{
    normalize_data, MigrationOptions, MigrationReport, MigrationStatus, FINGERPRINT_FIELD,
    NORMALIZED_TEXT_FIELD, TEXT_FIELD,
};
pub use single::CollectionManager;
