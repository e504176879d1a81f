//! Session document merge engine
//!
//! Session state lives in the shared key-value store as one JSON document
//! per transaction identifier. Form submissions are layered into the
//! document's `form_data` map and submission receipts into its
//! `formSubmissions` map; all other top-level fields (domain/version
//! metadata written by upstream services) pass through opaquely.
//!
//! Writes are read-modify-write cycles that replace the whole document.
//! There is no concurrency control by default: two submissions for the same
//! transaction can interleave and the later write wins. Merges can be
//! serialized per transaction id with [`SessionService::with_serialized_merges`].

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::error::{ServerError, ServerResult};
use formgate_session_store::SessionStore;

/// Receipt recorded for a completed form submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub submitted: bool,
    pub submission_id: String,
    /// RFC 3339 timestamp of the submission
    pub timestamp: String,
    #[serde(
        rename = "formUrl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub form_url: Option<String>,
}

/// The per-transaction session document
///
/// Only `form_data` and `formSubmissions` are typed; every other top-level
/// field round-trips untouched through the flattened map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionDocument {
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub form_data: Map<String, Value>,

    #[serde(
        rename = "formSubmissions",
        default,
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub form_submissions: HashMap<String, SubmissionReceipt>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Composite store key for a submission receipt
///
/// `transaction_id` alone, or `transaction_id + "_" + form_url` when
/// multiple forms share one transaction, so receipts never overwrite each
/// other.
fn composite_key(transaction_id: &str, form_url: Option<&str>) -> String {
    match form_url {
        Some(url) => format!("{}_{}", transaction_id, url),
        None => transaction_id.to_string(),
    }
}

/// Keyed async mutexes for the opt-in per-transaction merge serialization
///
/// Entries are never reclaimed; the map is bounded by the number of
/// distinct transaction ids seen by this process.
#[derive(Debug, Default)]
struct MergeLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MergeLocks {
    async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Reads and writes session documents in the shared store
#[derive(Debug, Clone)]
pub struct SessionService {
    store: Arc<dyn SessionStore>,
    merge_locks: Option<Arc<MergeLocks>>,
}

impl SessionService {
    /// Create a session service with the default last-writer-wins merges
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            merge_locks: None,
        }
    }

    /// Create a session service that serializes merges per transaction id
    pub fn with_serialized_merges(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            merge_locks: Some(Arc::new(MergeLocks::default())),
        }
    }

    async fn read_document(&self, key: &str) -> ServerResult<Option<SessionDocument>> {
        match self.store.get(key).await? {
            Some(raw) => {
                let document = serde_json::from_str(&raw)?;
                Ok(Some(document))
            }
            None => Ok(None),
        }
    }

    async fn write_document(&self, key: &str, document: &SessionDocument) -> ServerResult<()> {
        let raw = serde_json::to_string(document)?;
        self.store.set(key, &raw).await?;
        Ok(())
    }

    /// Fold one form's submitted data into the transaction's session document
    ///
    /// The document's `form_data` gains (or overwrites) the entry for
    /// `form_key`; every other `form_data` entry and every other top-level
    /// field is preserved. A missing document is created with only
    /// `form_data`. The whole document is replaced on write.
    pub async fn merge_form_submission(
        &self,
        form_key: &str,
        form_data: Value,
        transaction_id: &str,
    ) -> ServerResult<()> {
        let _guard = match &self.merge_locks {
            Some(locks) => Some(locks.acquire(transaction_id).await),
            None => None,
        };

        let document = match self.read_document(transaction_id).await? {
            Some(mut existing) => {
                existing.form_data.insert(form_key.to_string(), form_data);
                existing
            }
            None => {
                let mut created = SessionDocument::default();
                created.form_data.insert(form_key.to_string(), form_data);
                created
            }
        };

        self.write_document(transaction_id, &document).await?;
        debug!(
            "Merged form data for form={} transaction={}",
            form_key, transaction_id
        );
        Ok(())
    }

    /// Record a submission receipt into an existing session document
    ///
    /// Unlike the form-data merge, this requires the session for
    /// `session_id` to already exist.
    pub async fn record_submission_receipt(
        &self,
        session_id: &str,
        transaction_id: &str,
        submission_id: &str,
        form_url: Option<&str>,
    ) -> ServerResult<()> {
        if !self.store.exists(session_id).await? {
            return Err(ServerError::SessionNotFound(session_id.to_string()));
        }

        let mut document = self
            .read_document(session_id)
            .await?
            .ok_or_else(|| ServerError::SessionNotFound(session_id.to_string()))?;

        let key = composite_key(transaction_id, form_url);
        document.form_submissions.insert(
            key.clone(),
            SubmissionReceipt {
                submitted: true,
                submission_id: submission_id.to_string(),
                timestamp: Utc::now().to_rfc3339(),
                form_url: form_url.map(str::to_string),
            },
        );

        self.write_document(session_id, &document).await?;
        debug!(
            "Recorded submission receipt key={} session={}",
            key, session_id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formgate_session_store::InMemorySessionStore;
    use serde_json::json;

    fn service() -> (SessionService, Arc<InMemorySessionStore>) {
        let store = Arc::new(InMemorySessionStore::new());
        (SessionService::new(store.clone()), store)
    }

    async fn stored_json(store: &InMemorySessionStore, key: &str) -> Value {
        serde_json::from_str(&store.get(key).await.unwrap().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn merge_creates_document_when_absent() {
        let (service, store) = service();

        service
            .merge_form_submission("kyc", json!({"name": "Alice"}), "t1")
            .await
            .unwrap();

        let doc = stored_json(&store, "t1").await;
        assert_eq!(doc, json!({"form_data": {"kyc": {"name": "Alice"}}}));
    }

    #[tokio::test]
    async fn merge_preserves_other_form_keys() {
        let (service, store) = service();

        service
            .merge_form_submission("kyc", json!({"name": "Alice"}), "t1")
            .await
            .unwrap();
        service
            .merge_form_submission("address", json!({"city": "Pune"}), "t1")
            .await
            .unwrap();
        // Re-submitting kyc overwrites only its own entry
        service
            .merge_form_submission("kyc", json!({"name": "Bob"}), "t1")
            .await
            .unwrap();

        let doc = serde_json::from_str::<SessionDocument>(
            &store.get("t1").await.unwrap().unwrap(),
        )
        .unwrap();
        assert_eq!(doc.form_data["kyc"], json!({"name": "Bob"}));
        assert_eq!(doc.form_data["address"], json!({"city": "Pune"}));
    }

    #[tokio::test]
    async fn merge_leaves_unrelated_top_level_fields_untouched() {
        let (service, store) = service();

        store
            .set(
                "t1",
                &json!({
                    "domain": "retail",
                    "version": "1.2.0",
                    "nested": {"a": 1, "b": true},
                    "formSubmissions": {
                        "t1": {"submitted": true, "submission_id": "old", "timestamp": "2026-01-01T00:00:00Z"}
                    }
                })
                .to_string(),
            )
            .await
            .unwrap();

        service
            .merge_form_submission("kyc", json!({"name": "Alice"}), "t1")
            .await
            .unwrap();

        let doc = stored_json(&store, "t1").await;
        assert_eq!(doc["domain"], json!("retail"));
        assert_eq!(doc["version"], json!("1.2.0"));
        assert_eq!(doc["nested"], json!({"a": 1, "b": true}));
        assert_eq!(doc["formSubmissions"]["t1"]["submission_id"], json!("old"));
        assert_eq!(doc["form_data"]["kyc"], json!({"name": "Alice"}));
    }

    #[tokio::test]
    async fn receipt_requires_existing_session() {
        let (service, _store) = service();

        let err = service
            .record_submission_receipt("missing", "t1", "sub-1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn receipts_with_distinct_form_urls_do_not_collide() {
        let (service, store) = service();
        store.set("s1", "{}").await.unwrap();

        service
            .record_submission_receipt("s1", "t1", "sub-a", Some("kyc"))
            .await
            .unwrap();
        service
            .record_submission_receipt("s1", "t1", "sub-b", Some("address"))
            .await
            .unwrap();
        // Bare transaction key is distinct from the suffixed ones
        service
            .record_submission_receipt("s1", "t1", "sub-c", None)
            .await
            .unwrap();

        let doc: SessionDocument =
            serde_json::from_str(&store.get("s1").await.unwrap().unwrap()).unwrap();
        assert_eq!(doc.form_submissions.len(), 3);
        assert_eq!(doc.form_submissions["t1_kyc"].submission_id, "sub-a");
        assert_eq!(doc.form_submissions["t1_address"].submission_id, "sub-b");
        assert_eq!(doc.form_submissions["t1"].submission_id, "sub-c");
        assert_eq!(
            doc.form_submissions["t1_kyc"].form_url.as_deref(),
            Some("kyc")
        );
        assert!(doc.form_submissions["t1"].form_url.is_none());
        assert!(doc.form_submissions.values().all(|r| r.submitted));
    }

    #[tokio::test]
    async fn document_round_trips_without_structural_loss() {
        let original = json!({
            "form_data": {
                "kyc": {"name": "Alice", "age": 34, "active": true},
                "address": {"lines": ["a", "b"], "pin": 411001}
            },
            "formSubmissions": {
                "t1_kyc": {
                    "submitted": true,
                    "submission_id": "sub-1",
                    "timestamp": "2026-08-08T10:00:00+00:00",
                    "formUrl": "kyc"
                }
            },
            "domain": "retail",
            "checkpoint": {"count": 3, "flag": false}
        });

        let document: SessionDocument = serde_json::from_value(original.clone()).unwrap();
        let round_tripped: Value =
            serde_json::from_str(&serde_json::to_string(&document).unwrap()).unwrap();
        assert_eq!(round_tripped, original);
    }

    #[tokio::test]
    async fn serialized_merges_accumulate_all_forms() {
        let store = Arc::new(InMemorySessionStore::new());
        let service = SessionService::with_serialized_merges(store.clone());

        let mut handles = Vec::new();
        for i in 0..8 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .merge_form_submission(&format!("form-{}", i), json!({ "i": i }), "t1")
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let doc: SessionDocument =
            serde_json::from_str(&store.get("t1").await.unwrap().unwrap()).unwrap();
        assert_eq!(doc.form_data.len(), 8);
    }
}
