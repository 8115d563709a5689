//! Enhanced backend: equality, range and set-membership filters plus ANN
//! statistics

use mnemos_core::{BackendKind, MetadataFilter, VectorResult};

use super::backend::{CollectionBackend, FilterSupport};

/// Accepts every filter operator
#[derive(Debug, Clone, Copy)]
pub struct FullFilters;

impl FilterSupport for FullFilters {
    const KIND: BackendKind = BackendKind::Enhanced;
    const ANN_STATS: bool = true;

    fn check(_filter: &MetadataFilter) -> VectorResult<()> {
        Ok(())
    }
}

/// Storage backend with full filtering and ANN statistics
pub type EnhancedBackend = CollectionBackend<FullFilters>;
