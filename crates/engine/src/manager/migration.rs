//! Bulk re-normalization of stored records
//!
//! [`normalize_data`] walks a collection in batches, re-normalizes each
//! record's source text with the current config, re-embeds it and writes
//! vector and payload back through `update`. Records whose stored
//! fingerprint already matches the config are skipped unless `force` is
//! set, so running the job twice is cheap.
//!
//! The job is best-effort: the first error aborts the remaining batches
//! and is reported in the [`MigrationReport`]; batches already written
//! stay written.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use mnemos_core::{Embedder, NormalizationConfig, Payload, VectorError, VectorResult};
use mnemos_normalize::Normalizer;

use crate::storage::StorageBackend;

/// Payload field holding the raw source text
pub const TEXT_FIELD: &str = "text";
/// Payload field holding the normalized text that was embedded
pub const NORMALIZED_TEXT_FIELD: &str = "normalized_text";
/// Payload field holding the fingerprint of the config used
pub const FINGERPRINT_FIELD: &str = "normalization_fingerprint";

const DEFAULT_BATCH_SIZE: usize = 100;

/// Tuning for [`normalize_data`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOptions {
    /// Records per batch, must be > 0
    pub batch_size: usize,
    /// Reprocess records whose fingerprint already matches
    pub force: bool,
    /// Payload field holding the source text
    pub text_field: String,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        MigrationOptions {
            batch_size: DEFAULT_BATCH_SIZE,
            force: false,
            text_field: TEXT_FIELD.to_string(),
        }
    }
}

impl MigrationOptions {
    /// Set the batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set `force`
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Read source text from `field`
    pub fn with_text_field(mut self, field: impl Into<String>) -> Self {
        self.text_field = field.into();
        self
    }
}

/// Outcome of a migration run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationStatus {
    /// Every batch completed
    Success,
    /// Aborted; see the report message
    Failure,
}

impl MigrationStatus {
    /// Lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            MigrationStatus::Success => "success",
            MigrationStatus::Failure => "failure",
        }
    }
}

/// Summary returned by [`normalize_data`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    /// Outcome
    pub status: MigrationStatus,
    /// Human-readable summary or the triggering error
    pub message: String,
    /// Records re-embedded and written back
    pub processed: usize,
    /// Records left unchanged (fingerprint match or no source text)
    pub skipped: usize,
    /// Zero-based batch that failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_batch: Option<usize>,
}

impl MigrationReport {
    fn failure(message: impl Into<String>) -> Self {
        MigrationReport {
            status: MigrationStatus::Failure,
            message: message.into(),
            processed: 0,
            skipped: 0,
            failed_batch: None,
        }
    }

    /// Whether the run completed
    pub fn is_success(&self) -> bool {
        self.status == MigrationStatus::Success
    }
}

enum Outcome {
    Processed,
    Skipped,
}

fn migrate_record(
    backend: &dyn StorageBackend,
    embedder: &dyn Embedder,
    normalizer: &Normalizer,
    options: &MigrationOptions,
    id: &mnemos_core::RecordId,
) -> VectorResult<Outcome> {
    // Deleted since the id list was taken
    let Some(record) = backend.get(id)? else {
        return Ok(Outcome::Skipped);
    };
    let Some(text) = record.payload.get(&options.text_field).and_then(JsonValue::as_str) else {
        return Ok(Outcome::Skipped);
    };
    let current = record.payload.get(FINGERPRINT_FIELD).and_then(JsonValue::as_str);
    if !options.force && current == Some(normalizer.fingerprint()) {
        return Ok(Outcome::Skipped);
    }

    let normalized = normalizer.normalize(text);
    let vector = embedder.embed(&normalized)?;

    let mut payload: Payload = record.payload;
    payload.insert(NORMALIZED_TEXT_FIELD.to_string(), JsonValue::String(normalized));
    payload.insert(
        FINGERPRINT_FIELD.to_string(),
        JsonValue::String(normalizer.fingerprint().to_string()),
    );
    backend.update(id, &vector, payload)?;
    Ok(Outcome::Processed)
}

/// Re-normalize and re-embed every record in `backend`
///
/// Fails fast, without touching the collection, when `embedder` or
/// `config` is absent or `batch_size` is zero. Errors never escape as
/// `Err`; they are reported with [`MigrationStatus::Failure`].
pub fn normalize_data(
    backend: &dyn StorageBackend,
    embedder: Option<&dyn Embedder>,
    config: Option<&NormalizationConfig>,
    options: &MigrationOptions,
) -> MigrationReport {
    let Some(embedder) = embedder else {
        return MigrationReport::failure("normalize_data requires an embedder");
    };
    let Some(config) = config else {
        return MigrationReport::failure("normalize_data requires a normalization config");
    };
    if options.batch_size == 0 {
        return MigrationReport::failure("batch_size must be > 0");
    }

    let ids = match backend.ids() {
        Ok(ids) => ids,
        Err(e) => return MigrationReport::failure(e.to_string()),
    };
    let normalizer = Normalizer::new(config.clone());
    let batches = ids.chunks(options.batch_size).len();
    info!(
        target: "mnemos::normalize",
        collection = backend.name(),
        records = ids.len(),
        batches,
        force = options.force,
        fingerprint = normalizer.fingerprint(),
        "Normalization started"
    );

    let mut processed = 0usize;
    let mut skipped = 0usize;
    for (batch, chunk) in ids.chunks(options.batch_size).enumerate() {
        for id in chunk {
            match migrate_record(backend, embedder, &normalizer, options, id) {
                Ok(Outcome::Processed) => processed += 1,
                Ok(Outcome::Skipped) => skipped += 1,
                Err(e) => {
                    warn!(
                        target: "mnemos::normalize",
                        collection = backend.name(),
                        batch,
                        id = %id,
                        error = %e,
                        "Normalization aborted"
                    );
                    return MigrationReport {
                        status: MigrationStatus::Failure,
                        message: failure_message(batch, &e),
                        processed,
                        skipped,
                        failed_batch: Some(batch),
                    };
                }
            }
        }
        debug!(
            target: "mnemos::normalize",
            collection = backend.name(),
            batch,
            processed,
            skipped,
            "Batch normalized"
        );
    }

    info!(
        target: "mnemos::normalize",
        collection = backend.name(),
        processed,
        skipped,
        "Normalization finished"
    );
    MigrationReport {
        status: MigrationStatus::Success,
        message: format!("Normalized {} records ({} unchanged)", processed, skipped),
        processed,
        skipped,
        failed_batch: None,
    }
}

fn failure_message(batch: usize, error: &VectorError) -> String {
    format!("batch {} failed: {}", batch, error)
}
