//! The authoritative local subscription collection.
//!
//! [`SubscriptionStore`] owns the in-memory collection for the current
//! session and mediates every mutation through the gateway. Mutations are
//! not optimistic: the local collection only ever reflects
//! server-confirmed state, so a failed call leaves it untouched and the
//! server's returned record — not the caller's patch — is what lands
//! locally.
//!
//! The store applies last-writer-wins replacement with no version check,
//! so a second mutation against a record whose previous mutation is still
//! awaiting its round-trip is rejected with
//! [`TrackerError::OperationInFlight`] instead of being allowed to race.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, instrument};

use crate::billing::project_next_renewal;
use crate::error::{Result, TrackerError};
use crate::gateway::Gateway;
use crate::model::{Session, Subscription, SubscriptionDraft, SubscriptionId, SubscriptionPatch};

/// Server-reconciled collection of the current user's subscriptions.
pub struct SubscriptionStore {
    gateway: Arc<dyn Gateway>,
    items: RwLock<Vec<Subscription>>,
    in_flight: Mutex<HashSet<SubscriptionId>>,
}

impl std::fmt::Debug for SubscriptionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionStore").field("len", &self.len()).finish_non_exhaustive()
    }
}

/// Removes the id from the in-flight set when the mutation resolves,
/// including when the future is dropped mid-call.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<SubscriptionId>>,
    id: SubscriptionId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut set) = self.set.lock() {
            set.remove(&self.id);
        }
    }
}

impl SubscriptionStore {
    /// Creates an empty store backed by `gateway`.
    #[must_use]
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway, items: RwLock::new(Vec::new()), in_flight: Mutex::new(HashSet::new()) }
    }

    /// An immutable snapshot of the current collection.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.items.read().map(|items| items.clone()).unwrap_or_default()
    }

    /// Number of records in the collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetches the full collection and replaces the local one atomically.
    ///
    /// Triggered whenever the session transitions into authenticated. The
    /// `&Session` witness keeps unauthenticated loads out by construction.
    ///
    /// # Errors
    ///
    /// Propagates the gateway error; on failure the local collection is
    /// left as it was.
    #[instrument(skip(self, session), fields(user = %session.user.id))]
    pub async fn load(&self, session: &Session) -> Result<()> {
        let fetched = self.gateway.list_subscriptions().await?;
        debug!(count = fetched.len(), "loaded subscription collection");
        self.replace_all(fetched);
        Ok(())
    }

    /// Creates a subscription and appends the server-returned record.
    ///
    /// The renewal date is derived here from the draft's start date and
    /// frequency; the record enters the local collection only after the
    /// create call returns the server-assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Validation`] before any network call if the
    /// draft is invalid; otherwise propagates the gateway error, leaving
    /// the local collection untouched.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn add(&self, draft: SubscriptionDraft) -> Result<Subscription> {
        draft.validate()?;
        let next_renewal = project_next_renewal(draft.start_date, draft.frequency);
        let record = draft.into_record(next_renewal);

        let created = self.gateway.create_subscription(&record).await?;
        debug!(id = %created.id, "subscription created");
        if let Ok(mut items) = self.items.write() {
            items.push(created.clone());
        }
        Ok(created)
    }

    /// Applies a partial patch and replaces the local record with the
    /// server's returned representation.
    ///
    /// The replacement is wholesale — the server response is the sole
    /// source of truth after an update, never a field-by-field merge of
    /// the caller's patch. When the patch changes the start date or
    /// frequency, the renewal date is re-derived before the call.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Validation`] before any network call if the
    /// patch is invalid, [`TrackerError::OperationInFlight`] if another
    /// mutation for this id has not resolved, and
    /// [`TrackerError::NotFound`] if the id is absent from the local
    /// collection at replacement time — the server call is attempted
    /// regardless.
    #[instrument(skip(self, patch), fields(id = %id))]
    pub async fn update(
        &self,
        id: &SubscriptionId,
        mut patch: SubscriptionPatch,
    ) -> Result<Subscription> {
        patch.validate()?;
        let _guard = self.mark_in_flight(id)?;

        self.derive_patch_renewal(id, &mut patch);
        let updated = self.gateway.update_subscription(id, &patch).await?;

        let mut items = self
            .items
            .write()
            .map_err(|_| TrackerError::Storage("subscription collection lock poisoned".into()))?;
        let Some(slot) = items.iter_mut().find(|sub| &sub.id == id) else {
            return Err(TrackerError::NotFound(id.to_string()));
        };
        *slot = updated.clone();
        debug!(id = %id, "subscription updated");
        Ok(updated)
    }

    /// Deletes a subscription; the local entry is removed only after the
    /// remote delete succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::OperationInFlight`] if another mutation for
    /// this id has not resolved; otherwise propagates the gateway error
    /// (a remotely-unknown id arrives as [`TrackerError::NotFound`]),
    /// leaving the entry in place.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn remove(&self, id: &SubscriptionId) -> Result<()> {
        let _guard = self.mark_in_flight(id)?;

        self.gateway.delete_subscription(id).await?;
        if let Ok(mut items) = self.items.write() {
            items.retain(|sub| &sub.id != id);
        }
        debug!(id = %id, "subscription removed");
        Ok(())
    }

    /// Empties the local collection. Invoked on logout.
    pub fn clear(&self) {
        self.replace_all(Vec::new());
    }

    fn replace_all(&self, items: Vec<Subscription>) {
        match self.items.write() {
            Ok(mut guard) => *guard = items,
            Err(poisoned) => *poisoned.into_inner() = items,
        }
    }

    fn mark_in_flight(&self, id: &SubscriptionId) -> Result<InFlightGuard<'_>> {
        let mut set = self
            .in_flight
            .lock()
            .map_err(|_| TrackerError::Storage("in-flight lock poisoned".into()))?;
        if !set.insert(id.clone()) {
            return Err(TrackerError::OperationInFlight(id.to_string()));
        }
        Ok(InFlightGuard { set: &self.in_flight, id: id.clone() })
    }

    /// Re-derives `next_renewal` when the patch touches the start date or
    /// frequency, falling back to the local record for the unchanged half.
    fn derive_patch_renewal(&self, id: &SubscriptionId, patch: &mut SubscriptionPatch) {
        if patch.start_date.is_none() && patch.frequency.is_none() {
            return;
        }
        let local = self
            .items
            .read()
            .ok()
            .and_then(|items| items.iter().find(|sub| &sub.id == id).cloned());
        let start = patch.start_date.or(local.as_ref().map(|sub| sub.start_date));
        let frequency = patch.frequency.or(local.as_ref().map(|sub| sub.frequency));
        if let (Some(start), Some(frequency)) = (start, frequency) {
            patch.next_renewal = Some(project_next_renewal(start, frequency));
        }
    }
}
