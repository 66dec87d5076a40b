//! Viewing and resolving three-way match records

use chrono::Utc;
use thiserror::Error;

use crate::core::store::{RecordStore, RecordStoreExt, StoreError};
use crate::entities::three_way_match::{Resolution, ThreeWayMatch};

/// The fixed actions a reviewer can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ResolveAction {
    Approve,
    Reject,
    Backorder,
    Dispute,
}

impl ResolveAction {
    pub fn resolution(&self) -> Resolution {
        match self {
            ResolveAction::Approve => Resolution::Approved,
            ResolveAction::Reject => Resolution::Rejected,
            ResolveAction::Backorder => Resolution::Backorder,
            ResolveAction::Dispute => Resolution::Disputed,
        }
    }
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("no match record is loaded")]
    NotLoaded,

    #[error("match for {po_id} was already resolved as {resolution}")]
    AlreadyResolved { po_id: String, resolution: Resolution },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid match data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// What the viewer is showing
#[derive(Debug, Clone)]
pub enum MatchView {
    Loading,
    Loaded(ThreeWayMatch),
    Error(String),
}

impl MatchView {
    /// Fetch the record for a purchase order
    pub fn load<S: RecordStore + ?Sized>(store: &S, po_id: &str) -> Self {
        tracing::debug!(po_id, "loading match record");
        match store.get::<ThreeWayMatch>(po_id) {
            Ok(Some(record)) => MatchView::Loaded(record),
            Ok(None) => MatchView::Error(format!("no match record for {}", po_id)),
            Err(e) => MatchView::Error(e.to_string()),
        }
    }

    pub fn record(&self) -> Option<&ThreeWayMatch> {
        match self {
            MatchView::Loaded(r) => Some(r),
            _ => None,
        }
    }

    /// Apply a reviewer decision and write it back. On store failure the view
    /// keeps showing the unresolved record.
    pub fn resolve<S: RecordStore + ?Sized>(
        &mut self,
        store: &mut S,
        action: ResolveAction,
        notes: Option<String>,
        resolved_by: &str,
    ) -> Result<&ThreeWayMatch, MatchError> {
        let MatchView::Loaded(current) = self else {
            return Err(MatchError::NotLoaded);
        };
        if current.is_resolved() {
            return Err(MatchError::AlreadyResolved {
                po_id: current.po_id.clone(),
                resolution: current.resolution,
            });
        }

        let mut updated = current.clone();
        updated.resolution = action.resolution();
        updated.resolution_notes = notes;
        updated.resolved_by = Some(resolved_by.to_string());
        updated.resolved_at = Some(Utc::now());
        store.update(&updated)?;
        tracing::info!(po_id = %updated.po_id, resolution = %updated.resolution, "match resolved");

        *current = updated;
        Ok(&*current)
    }
}

/// Counts from [`import_matches`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchImport {
    pub imported: usize,
    /// Records whose existing resolution was carried over
    pub kept_resolved: usize,
}

/// Load precomputed records from a JSON array (or a single object). The
/// computed columns of an existing record are refreshed, but a resolution a
/// reviewer already recorded is kept.
pub fn import_matches<S: RecordStore + ?Sized>(store: &mut S, json: &str) -> Result<MatchImport, MatchError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let records: Vec<ThreeWayMatch> = match value {
        serde_json::Value::Array(_) => serde_json::from_value(value)?,
        other => vec![serde_json::from_value(other)?],
    };

    let mut out = MatchImport::default();
    for mut record in records {
        if let Some(existing) = store.get::<ThreeWayMatch>(&record.po_id)? {
            if existing.is_resolved() {
                record.resolution = existing.resolution;
                record.resolution_notes = existing.resolution_notes;
                record.resolved_by = existing.resolved_by;
                record.resolved_at = existing.resolved_at;
                out.kept_resolved += 1;
            }
        }
        if record.computed_at.is_none() {
            record.computed_at = Some(Utc::now());
        }
        store.upsert(&record)?;
        out.imported += 1;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::SqliteStore;
    use crate::entities::three_way_match::MatchStatus;

    const SAMPLE: &str = r#"[
        {
            "po_id": "PO-01HZX",
            "order_total": 1000.0,
            "invoice_total": 1050.0,
            "receipt_total": 1000.0,
            "discrepancies": [
                {"kind": "price", "sku": "KELP-01", "message": "unit price 5.25 vs 5.00", "expected": 5.0, "actual": 5.25}
            ],
            "match_status": "discrepancy"
        },
        {"po_id": "PO-01HZY", "order_total": 20.0, "invoice_total": 20.0, "receipt_total": 20.0, "match_status": "matched"}
    ]"#;

    fn seeded() -> SqliteStore {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(import_matches(&mut store, SAMPLE).unwrap().imported, 2);
        store
    }

    #[test]
    fn test_load_states() {
        let store = seeded();
        let view = MatchView::load(&store, "PO-01HZX");
        let record = view.record().unwrap();
        assert_eq!(record.match_status, MatchStatus::Discrepancy);
        assert_eq!(record.invoice_variance(), Some(50.0));

        assert!(matches!(MatchView::load(&store, "PO-NOPE"), MatchView::Error(_)));
    }

    #[test]
    fn test_resolve_writes_back() {
        let mut store = seeded();
        let mut view = MatchView::load(&store, "PO-01HZX");
        view.resolve(&mut store, ResolveAction::Dispute, Some("overbilled".into()), "pat")
            .unwrap();

        let stored: ThreeWayMatch = store.get("PO-01HZX").unwrap().unwrap();
        assert_eq!(stored.resolution, Resolution::Disputed);
        assert_eq!(stored.resolution_notes.as_deref(), Some("overbilled"));
        assert!(stored.resolved_at.is_some());
    }

    #[test]
    fn test_cannot_resolve_twice() {
        let mut store = seeded();
        let mut view = MatchView::load(&store, "PO-01HZY");
        view.resolve(&mut store, ResolveAction::Approve, None, "pat").unwrap();

        let err = view
            .resolve(&mut store, ResolveAction::Reject, None, "pat")
            .unwrap_err();
        assert!(matches!(err, MatchError::AlreadyResolved { .. }));
    }

    #[test]
    fn test_resolve_requires_loaded() {
        let mut store = seeded();
        let mut view = MatchView::Loading;
        let err = view
            .resolve(&mut store, ResolveAction::Approve, None, "pat")
            .unwrap_err();
        assert!(matches!(err, MatchError::NotLoaded));
    }

    #[test]
    fn test_import_single_object() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let n = import_matches(&mut store, r#"{"po_id": "PO-1", "order_total": 5.0}"#).unwrap();
        assert_eq!(n.imported, 1);
        let view = MatchView::load(&store, "PO-1");
        assert_eq!(view.record().unwrap().resolution, Resolution::Pending);
        assert!(view.record().unwrap().computed_at.is_some());
    }

    #[test]
    fn test_reimport_keeps_resolution() {
        let mut store = seeded();
        let mut view = MatchView::load(&store, "PO-01HZY");
        view.resolve(&mut store, ResolveAction::Approve, Some("ok".into()), "pat")
            .unwrap();

        let again = import_matches(&mut store, SAMPLE).unwrap();
        assert_eq!(again, MatchImport { imported: 2, kept_resolved: 1 });

        let stored: ThreeWayMatch = store.get("PO-01HZY").unwrap().unwrap();
        assert_eq!(stored.resolution, Resolution::Approved);
        assert_eq!(stored.resolved_by.as_deref(), Some("pat"));
        assert_eq!(stored.resolution_notes.as_deref(), Some("ok"));
        assert!(stored.resolved_at.is_some());

        let untouched: ThreeWayMatch = store.get("PO-01HZX").unwrap().unwrap();
        assert_eq!(untouched.resolution, Resolution::Pending);
    }

    #[test]
    fn test_reimport_refreshes_computed_totals() {
        let mut store = seeded();
        let mut view = MatchView::load(&store, "PO-01HZX");
        view.resolve(&mut store, ResolveAction::Dispute, None, "pat").unwrap();

        import_matches(
            &mut store,
            r#"{"po_id": "PO-01HZX", "order_total": 1000.0, "invoice_total": 1000.0, "match_status": "matched"}"#,
        )
        .unwrap();
        let stored: ThreeWayMatch = store.get("PO-01HZX").unwrap().unwrap();
        assert_eq!(stored.invoice_total, Some(1000.0));
        assert_eq!(stored.resolution, Resolution::Disputed);
    }
}
