//! Storage backends
//!
//! A backend owns one collection: its [`AnnIndex`](crate::ann::AnnIndex),
//! the payload of every record, connection state and optional on-disk
//! persistence. Two variants exist:
//!
//! | Variant              | Filters                | ANN stats |
//! |----------------------|------------------------|-----------|
//! | [`BasicBackend`]     | equality               | no        |
//! | [`EnhancedBackend`]  | equality, range, `any` | yes       |

pub mod backend;
pub mod basic;
pub mod collection;
pub mod enhanced;
pub mod persistence;

use std::sync::Arc;

use mnemos_core::{BackendKind, StorageConfig};

pub use backend::{CollectionBackend, FilterSupport, StorageBackend};
pub use basic::{BasicBackend, EqualityOnly};
pub use collection::{validate_collection_name, CollectionStore};
pub use enhanced::{EnhancedBackend, FullFilters};
pub use persistence::{CollectionLayout, LoadOutcome, PersistedState};

/// Create the backend variant named by `config.backend`
///
/// The backend starts disconnected.
pub fn create_backend(config: StorageConfig) -> Arc<dyn StorageBackend> {
    match config.backend {
        BackendKind::Basic => Arc::new(BasicBackend::new(config)),
        BackendKind::Enhanced => Arc::new(EnhancedBackend::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_backend_variant() {
        let basic = create_backend(StorageConfig::new("a", 2).with_backend(BackendKind::Basic));
        assert_eq!(basic.kind(), BackendKind::Basic);
        assert!(!basic.is_connected());

        let enhanced = create_backend(StorageConfig::new("b", 2));
        assert_eq!(enhanced.kind(), BackendKind::Enhanced);
        enhanced.connect().unwrap();
        assert!(enhanced.is_connected());
        assert_eq!(enhanced.info().name, "b");
    }
}
