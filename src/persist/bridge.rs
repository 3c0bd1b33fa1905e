use std::{
    cell::{Ref, RefCell},
    collections::{HashMap, HashSet},
    future::Future,
};

use crate::{
    foundation::core::OverlayId,
    foundation::error::{VeneerError, VeneerResult},
    persist::index::LabelIndex,
    persist::payload::{CommitPayload, RemovePayload},
    scene::events::{self, SceneEvent},
};

/// External persistence operator: `execute(operator_name, payload) -> result`.
///
/// Calls are asynchronous and may fail; retry policy, if any, lives behind this trait.
pub trait LabelOperator {
    fn execute(
        &self,
        operator: &str,
        payload: serde_json::Value,
    ) -> impl Future<Output = VeneerResult<serde_json::Value>>;
}

/// Operator names used by the bridge.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BridgeOpts {
    pub commit_operator: String,
    pub remove_operator: String,
}

impl Default for BridgeOpts {
    fn default() -> Self {
        Self {
            commit_operator: "upsert_label".to_owned(),
            remove_operator: "remove_label".to_owned(),
        }
    }
}

/// Result of handling one commit/remove.
#[derive(Clone, Debug, PartialEq)]
pub enum BridgeOutcome {
    /// Commit accepted by the store and mirrored in the index.
    Persisted,
    /// Removal accepted by the store and mirrored in the index.
    Removed,
    /// Duplicate of an already-applied request; nothing was sent.
    Skipped,
    /// The operator failed; local state was left as is.
    Failed(String),
    /// Event type the bridge does not consume.
    Ignored,
}

/// Translates scene commit/remove events into label store calls and keeps the index in sync.
///
/// All methods take `&self` so several requests can be awaited at once on one thread; interior
/// state is only borrowed between awaits.
pub struct PersistenceBridge<O, I> {
    operator: O,
    index: RefCell<I>,
    opts: BridgeOpts,
    last_committed: RefCell<HashMap<OverlayId, CommitPayload>>,
    removed: RefCell<HashSet<OverlayId>>,
}

impl<O: LabelOperator, I: LabelIndex> PersistenceBridge<O, I> {
    pub fn new(operator: O, index: I, opts: BridgeOpts) -> Self {
        Self {
            operator,
            index: RefCell::new(index),
            opts,
            last_committed: RefCell::new(HashMap::new()),
            removed: RefCell::new(HashSet::new()),
        }
    }

    pub fn index(&self) -> Ref<'_, I> {
        self.index.borrow()
    }

    pub fn operator(&self) -> &O {
        &self.operator
    }

    pub fn into_parts(self) -> (O, I) {
        (self.operator, self.index.into_inner())
    }

    /// Route a scene event. Malformed commit/remove details are a caller bug and return `Err`.
    pub async fn handle(&self, event: &SceneEvent) -> VeneerResult<BridgeOutcome> {
        if event.is(events::COMMIT) {
            let payload: CommitPayload = decode_details(event)?;
            Ok(self.commit(payload).await)
        } else if event.is(events::REMOVE) {
            let payload: RemovePayload = decode_details(event)?;
            Ok(self.remove(payload).await)
        } else {
            Ok(BridgeOutcome::Ignored)
        }
    }

    /// Upsert an overlay in the label store; on success mirror it into the index.
    #[tracing::instrument(skip(self, payload), fields(overlay = %payload.overlay_id))]
    pub async fn commit(&self, payload: CommitPayload) -> BridgeOutcome {
        if self.last_committed.borrow().get(&payload.overlay_id) == Some(&payload) {
            tracing::debug!("commit identical to last persisted state, skipped");
            return BridgeOutcome::Skipped;
        }

        let body = match serde_json::to_value(&payload) {
            Ok(v) => v,
            Err(err) => return BridgeOutcome::Failed(err.to_string()),
        };
        match self
            .operator
            .execute(&self.opts.commit_operator, body)
            .await
        {
            Ok(_) => {
                self.index.borrow_mut().add_label(payload.to_entry());
                self.removed.borrow_mut().remove(&payload.overlay_id);
                self.last_committed
                    .borrow_mut()
                    .insert(payload.overlay_id.clone(), payload);
                BridgeOutcome::Persisted
            }
            Err(err) => {
                tracing::warn!(error = %err, "label commit failed; keeping local state");
                BridgeOutcome::Failed(err.to_string())
            }
        }
    }

    /// Delete an overlay from the label store; on success drop it from the index.
    ///
    /// The scene has already removed the overlay; a failure leaves that removal in place.
    #[tracing::instrument(skip(self, payload), fields(overlay = %payload.overlay_id))]
    pub async fn remove(&self, payload: RemovePayload) -> BridgeOutcome {
        if self.removed.borrow().contains(&payload.overlay_id) {
            tracing::debug!("overlay already removed, skipped");
            return BridgeOutcome::Skipped;
        }

        let body = match serde_json::to_value(&payload) {
            Ok(v) => v,
            Err(err) => return BridgeOutcome::Failed(err.to_string()),
        };
        match self
            .operator
            .execute(&self.opts.remove_operator, body)
            .await
        {
            Ok(_) => {
                self.index.borrow_mut().remove_label(&payload.overlay_id);
                self.last_committed.borrow_mut().remove(&payload.overlay_id);
                self.removed.borrow_mut().insert(payload.overlay_id);
                BridgeOutcome::Removed
            }
            Err(err) => {
                tracing::warn!(error = %err, "label removal failed; overlay stays removed locally");
                BridgeOutcome::Failed(err.to_string())
            }
        }
    }
}

fn decode_details<T: serde::de::DeserializeOwned>(event: &SceneEvent) -> VeneerResult<T> {
    let details = event.details.clone().ok_or_else(|| {
        VeneerError::validation(format!("'{}' event carries no details", event.event_type))
    })?;
    Ok(serde_json::from_value(details)?)
}

#[cfg(test)]
#[path = "../../tests/unit/persist/bridge.rs"]
mod tests;
