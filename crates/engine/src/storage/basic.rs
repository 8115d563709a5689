//! Basic backend: equality filters only, no ANN statistics

use mnemos_core::{BackendKind, FilterOp, MetadataFilter, VectorError, VectorResult};

use super::backend::{CollectionBackend, FilterSupport};

/// Accepts only `Eq` conditions
#[derive(Debug, Clone, Copy)]
pub struct EqualityOnly;

impl FilterSupport for EqualityOnly {
    const KIND: BackendKind = BackendKind::Basic;
    const ANN_STATS: bool = false;

    fn check(filter: &MetadataFilter) -> VectorResult<()> {
        if filter.is_equality_only() {
            return Ok(());
        }
        match filter
            .conditions()
            .iter()
            .find(|c| !matches!(c.op, FilterOp::Eq(_)))
        {
            Some(c) => Err(VectorError::InvalidFilter(format!(
                "basic backend supports equality filters only, got '{}' on field '{}'",
                c.op.name(),
                c.field
            ))),
            None => Ok(()),
        }
    }
}

/// Storage backend with equality-only filtering
pub type BasicBackend = CollectionBackend<EqualityOnly>;
