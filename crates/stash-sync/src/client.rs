//! Optimistic, debounced synchronization of a resource list.
//!
//! Edits apply to local state immediately and are written back after a
//! quiescence window (further edits to the same item re-arm the timer).
//! Owned items go through the bulk full-set save, items shared *with*
//! the user go through the narrower single-item patch. Bulk saves are
//! serialized globally (they carry the whole owned set), patches per
//! item; a change landing during a round trip gets exactly one
//! follow-up save once that round trip resolves.
//!
//! Save failures keep the optimistic edit in place; the next edit to the
//! item starts a fresh save cycle. Sharing actions skip the debounce
//! entirely and refetch the list afterwards, since collaborator lists
//! and public tokens can be mutated by other participants.

use crate::error::{Result, SyncError};
use crate::transport::SyncTransport;
use serde::Serialize;
use stash_core::{Resource, ResourceKind, ShareOutcome, ShareRequest, SharedItemPatch};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::sleep;
use tracing::{debug, warn};

/// Default quiescence window before a dirty item is written back.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_secs(1);

/// A resource as held locally, addressed by a stable client key.
///
/// The key never changes once assigned, so a newly created item can be
/// tracked across the round trip that assigns its canonical id even if
/// the user keeps typing meanwhile.
#[derive(Debug, Clone)]
pub struct LocalResource<P> {
    pub key: String,
    pub resource: Resource<P>,
    pub is_owner: bool,
    pub dirty: bool,
}

struct Inner<P> {
    items: Vec<LocalResource<P>>,
    /// Armed debounce timer per item key
    timers: HashMap<String, Arc<Notify>>,
    /// A bulk owned save is on the wire. Owned saves carry the full owned
    /// set, so they are serialized globally, not per item.
    owned_in_flight: bool,
    /// Shared-item keys with a patch currently on the wire
    shared_in_flight: HashSet<String>,
    /// A local deletion has not reached the server yet
    pending_delete: bool,
    last_error: Option<String>,
}

enum SaveJob<P> {
    Owned {
        keys: Vec<String>,
        resources: Vec<Resource<P>>,
    },
    Shared {
        key: String,
        id: String,
        patch: SharedItemPatch,
    },
}

impl<P> SaveJob<P> {
    fn keys(&self) -> Vec<String> {
        match self {
            SaveJob::Owned { keys, .. } => keys.clone(),
            SaveJob::Shared { key, .. } => vec![key.clone()],
        }
    }

    fn is_owned(&self) -> bool {
        matches!(self, SaveJob::Owned { .. })
    }
}

pub struct SyncClient<P, T> {
    transport: Arc<T>,
    inner: Arc<Mutex<Inner<P>>>,
    user_id: String,
    window: Duration,
}

impl<P, T> Clone for SyncClient<P, T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            inner: self.inner.clone(),
            user_id: self.user_id.clone(),
            window: self.window,
        }
    }
}

impl<P, T> SyncClient<P, T>
where
    P: Clone + Serialize + Send + Sync + 'static,
    T: SyncTransport<P> + 'static,
{
    pub fn new(transport: Arc<T>, user_id: impl Into<String>, window: Duration) -> Self {
        Self {
            transport,
            inner: Arc::new(Mutex::new(Inner {
                items: Vec::new(),
                timers: HashMap::new(),
                owned_in_flight: false,
                shared_in_flight: HashSet::new(),
                pending_delete: false,
                last_error: None,
            })),
            user_id: user_id.into(),
            window,
        }
    }

    pub fn with_default_window(transport: Arc<T>, user_id: impl Into<String>) -> Self {
        Self::new(transport, user_id, DEFAULT_DEBOUNCE_WINDOW)
    }

    /// Replace local state with the server's view. Intended for startup;
    /// use [`refresh`](Self::refresh) once local edits may exist.
    pub async fn load(&self) -> Result<()> {
        let views = self.transport.fetch_resources().await?;
        let mut inner = self.inner.lock().await;
        inner.items = views
            .into_iter()
            .map(|view| LocalResource {
                key: view
                    .resource
                    .id
                    .clone()
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                is_owner: view.is_owner,
                resource: view.resource,
                dirty: false,
            })
            .collect();
        Ok(())
    }

    /// Current local state, dirty edits included.
    pub async fn snapshot(&self) -> Vec<LocalResource<P>> {
        self.inner.lock().await.items.clone()
    }

    /// Message of the most recent failed save, cleared by the next
    /// successful one.
    pub async fn last_error(&self) -> Option<String> {
        self.inner.lock().await.last_error.clone()
    }

    /// Create a resource locally and schedule its first save. Returns the
    /// stable client key.
    pub async fn create(&self, kind: ResourceKind, name: &str, payload: P) -> String {
        let key = uuid::Uuid::new_v4().to_string();
        {
            let mut inner = self.inner.lock().await;
            inner.items.push(LocalResource {
                key: key.clone(),
                resource: Resource::new(&self.user_id, kind, name, payload),
                is_owner: true,
                dirty: true,
            });
        }
        self.schedule(&key).await;
        key
    }

    /// Apply a payload edit optimistically and schedule a save.
    pub async fn edit_payload(&self, key: &str, payload: P) -> Result<()> {
        {
            let mut inner = self.inner.lock().await;
            let item = find_mut(&mut inner.items, key)?;
            item.resource.payload = payload;
            item.dirty = true;
        }
        self.schedule(key).await;
        Ok(())
    }

    /// Rename an item optimistically and schedule a save.
    pub async fn rename(&self, key: &str, name: &str) -> Result<()> {
        {
            let mut inner = self.inner.lock().await;
            let item = find_mut(&mut inner.items, key)?;
            item.resource.name = name.to_string();
            item.dirty = true;
        }
        self.schedule(key).await;
        Ok(())
    }

    /// Delete an owned item locally and schedule the save that makes the
    /// deletion durable. Collaborators leave via [`share`](Self::share)
    /// instead.
    pub async fn remove(&self, key: &str) -> Result<()> {
        {
            let mut inner = self.inner.lock().await;
            let position = inner
                .items
                .iter()
                .position(|i| i.key == key)
                .ok_or_else(|| SyncError::NotFound(format!("no local resource {key}")))?;
            if !inner.items[position].is_owner {
                return Err(SyncError::Denied(
                    "only the owner can delete a resource".to_string(),
                ));
            }
            inner.items.remove(position);
            inner.pending_delete = true;
        }
        self.schedule(key).await;
        Ok(())
    }

    /// Execute a sharing action immediately, then refetch the list so
    /// collaborator lists and tokens reflect the server's state.
    pub async fn share(&self, request: ShareRequest) -> Result<ShareOutcome> {
        let outcome = self.transport.share(request).await?;
        if let Err(e) = self.refresh().await {
            warn!("Refetch after sharing action failed: {e}");
        }
        Ok(outcome)
    }

    /// Refetch the list and merge it, refreshing sharing metadata without
    /// clobbering dirty local content.
    pub async fn refresh(&self) -> Result<()> {
        let views = self.transport.fetch_resources().await?;
        let mut inner = self.inner.lock().await;
        let mut next = Vec::with_capacity(views.len());
        for view in views {
            let local = inner
                .items
                .iter()
                .find(|i| view.resource.id.is_some() && i.resource.id == view.resource.id);
            match local {
                Some(item) if item.dirty => {
                    let mut resource = view.resource;
                    resource.name = item.resource.name.clone();
                    resource.payload = item.resource.payload.clone();
                    next.push(LocalResource {
                        key: item.key.clone(),
                        resource,
                        is_owner: view.is_owner,
                        dirty: true,
                    });
                }
                Some(item) => next.push(LocalResource {
                    key: item.key.clone(),
                    resource: view.resource,
                    is_owner: view.is_owner,
                    dirty: false,
                }),
                // While a deletion has not reached the server, a fetched
                // item with no local counterpart must not be resurrected
                None if inner.pending_delete => {}
                None => next.push(LocalResource {
                    key: view
                        .resource
                        .id
                        .clone()
                        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                    is_owner: view.is_owner,
                    resource: view.resource,
                    dirty: false,
                }),
            }
        }
        // Creations that have not reached the server survive the merge
        for item in inner.items.iter().filter(|i| i.resource.id.is_none()) {
            next.push(item.clone());
        }
        inner.items = next;
        Ok(())
    }

    /// Save every dirty item right away, skipping the debounce. Intended
    /// for teardown of the editing surface.
    pub async fn flush(&self) -> Result<()> {
        let jobs = {
            let mut inner = self.inner.lock().await;
            // Pending debounce workers notice the missing timer entry and
            // stand down
            inner.timers.clear();
            let mut jobs: Vec<SaveJob<P>> = Vec::new();
            let owned_dirty = inner.items.iter().any(|i| i.is_owner && i.dirty);
            if (owned_dirty || inner.pending_delete) && !inner.owned_in_flight {
                jobs.push(owned_job(&mut inner));
            }
            let shared_keys: Vec<String> = inner
                .items
                .iter()
                .filter(|i| !i.is_owner && i.dirty && !inner.shared_in_flight.contains(&i.key))
                .map(|i| i.key.clone())
                .collect();
            for key in shared_keys {
                if let Some(job) = shared_job(&mut inner, &key)? {
                    jobs.push(job);
                }
            }
            jobs
        };

        for job in jobs {
            let keys = job.keys();
            let owned = job.is_owned();
            if let Err(e) = self.execute(job).await {
                let mut inner = self.inner.lock().await;
                mark_failed(&mut inner, &keys, owned, &e);
                return Err(e);
            }
        }
        self.inner.lock().await.last_error = None;
        Ok(())
    }

    /// Arm (or re-arm) the debounce timer for an item.
    async fn schedule(&self, key: &str) {
        let notify = {
            let mut inner = self.inner.lock().await;
            if let Some(notify) = inner.timers.get(key) {
                notify.notify_waiters();
                return;
            }
            // A key with no local item is a deletion, which rides the
            // owned bulk save
            let owned = inner
                .items
                .iter()
                .find(|i| i.key == key)
                .is_none_or(|i| i.is_owner);
            if owned && inner.owned_in_flight {
                // The active bulk save issues the follow-up once it resolves
                return;
            }
            if !owned && inner.shared_in_flight.contains(key) {
                // Same, for the single-item patch path
                return;
            }
            let notify = Arc::new(Notify::new());
            inner.timers.insert(key.to_string(), notify.clone());
            notify
        };
        let client = self.clone();
        let key = key.to_string();
        tokio::spawn(async move { client.run_worker(key, notify).await });
    }

    async fn run_worker(self, key: String, notify: Arc<Notify>) {
        loop {
            // Quiescence window; every further edit re-arms the timer
            loop {
                tokio::select! {
                    _ = sleep(self.window) => break,
                    _ = notify.notified() => continue,
                }
            }

            let job = {
                let mut inner = self.inner.lock().await;
                let armed = inner
                    .timers
                    .get(&key)
                    .is_some_and(|current| Arc::ptr_eq(current, &notify));
                if !armed {
                    // Flushed or superseded while we slept
                    return;
                }
                inner.timers.remove(&key);
                match snapshot_job(&mut inner, &key) {
                    Ok(Some(job)) => {
                        if job.is_owned() {
                            inner.owned_in_flight = true;
                        } else {
                            inner.shared_in_flight.insert(key.clone());
                        }
                        job
                    }
                    Ok(None) => return,
                    Err(e) => {
                        warn!("Could not prepare save for {key}: {e}");
                        inner.last_error = Some(e.to_string());
                        return;
                    }
                }
            };

            let keys = job.keys();
            let owned = job.is_owned();
            let result = self.execute(job).await;

            let mut inner = self.inner.lock().await;
            if owned {
                inner.owned_in_flight = false;
            } else {
                inner.shared_in_flight.remove(&key);
            }
            match result {
                Ok(()) => {
                    inner.last_error = None;
                    // Changes that landed during the round trip get exactly
                    // one follow-up pass. For the bulk path that includes
                    // sibling owned items and deletions, which ride the
                    // same full-set save.
                    let more_work = if owned {
                        inner.items.iter().any(|i| i.is_owner && i.dirty) || inner.pending_delete
                    } else {
                        inner.items.iter().any(|i| i.key == key && i.dirty)
                    };
                    if more_work {
                        debug!("Change landed during save of {key}, scheduling follow-up");
                        inner.timers.insert(key.clone(), notify.clone());
                    } else {
                        return;
                    }
                }
                Err(e) => {
                    // Keep the optimistic edit; the next edit retries
                    warn!("Save for {key} failed, keeping local state: {e}");
                    mark_failed(&mut inner, &keys, owned, &e);
                    return;
                }
            }
        }
    }

    async fn execute(&self, job: SaveJob<P>) -> Result<()> {
        match job {
            SaveJob::Owned { keys, resources } => {
                let saved = self.transport.save_owned(resources).await?;
                let mut inner = self.inner.lock().await;
                for (key, canonical) in keys.iter().zip(saved) {
                    if let Some(item) = inner.items.iter_mut().find(|i| i.key == *key) {
                        absorb(item, canonical);
                    }
                }
                Ok(())
            }
            SaveJob::Shared { key, id, patch } => {
                let updated = self.transport.save_shared_item(&id, patch).await?;
                let mut inner = self.inner.lock().await;
                if let Some(item) = inner.items.iter_mut().find(|i| i.key == key) {
                    absorb(item, updated);
                }
                Ok(())
            }
        }
    }
}

fn find_mut<'a, P>(
    items: &'a mut [LocalResource<P>],
    key: &str,
) -> Result<&'a mut LocalResource<P>> {
    items
        .iter_mut()
        .find(|i| i.key == key)
        .ok_or_else(|| SyncError::NotFound(format!("no local resource {key}")))
}

/// Decide what a save for `key` should write, clearing dirty flags for
/// everything the job will carry.
///
/// Owned keys (including keys whose item was deleted locally) resolve to
/// the bulk full-set save, which picks up every dirty owned item and any
/// pending deletion in one write. A bulk save already on the wire defers
/// the work to that save's follow-up pass.
fn snapshot_job<P>(inner: &mut Inner<P>, key: &str) -> Result<Option<SaveJob<P>>>
where
    P: Clone + Serialize,
{
    let state = inner
        .items
        .iter()
        .find(|i| i.key == key)
        .map(|i| (i.dirty, i.is_owner));
    match state {
        Some((true, false)) => return shared_job(inner, key),
        Some((false, false)) => return Ok(None),
        _ => {}
    }
    if inner.owned_in_flight {
        return Ok(None);
    }
    let owned_work =
        inner.items.iter().any(|i| i.is_owner && i.dirty) || inner.pending_delete;
    if owned_work {
        Ok(Some(owned_job(inner)))
    } else {
        Ok(None)
    }
}

/// Bulk save of the full owned set; clears dirty on every owned item.
fn owned_job<P: Clone>(inner: &mut Inner<P>) -> SaveJob<P> {
    let mut keys = Vec::new();
    let mut resources = Vec::new();
    for item in inner.items.iter_mut().filter(|i| i.is_owner) {
        item.dirty = false;
        keys.push(item.key.clone());
        resources.push(item.resource.clone());
    }
    inner.pending_delete = false;
    SaveJob::Owned { keys, resources }
}

/// Single-item patch for a resource shared with the user.
fn shared_job<P>(inner: &mut Inner<P>, key: &str) -> Result<Option<SaveJob<P>>>
where
    P: Clone + Serialize,
{
    let Some(item) = inner.items.iter_mut().find(|i| i.key == key) else {
        return Ok(None);
    };
    let Some(id) = item.resource.id.clone() else {
        warn!("Shared item {key} has no canonical id, skipping save");
        return Ok(None);
    };
    let patch = SharedItemPatch {
        name: Some(item.resource.name.clone()),
        payload: Some(serde_json::to_value(&item.resource.payload)?),
    };
    item.dirty = false;
    Ok(Some(SaveJob::Shared {
        key: key.to_string(),
        id,
        patch,
    }))
}

/// Merge the server's canonical copy into a local item. Dirty items keep
/// their local content; only ids, tokens, and sharing metadata come from
/// the server.
fn absorb<P>(item: &mut LocalResource<P>, canonical: Resource<P>) {
    if item.dirty {
        item.resource.id = canonical.id;
        item.resource.owner_id = canonical.owner_id;
        item.resource.shared_with = canonical.shared_with;
        item.resource.is_public = canonical.is_public;
        item.resource.public_token = canonical.public_token;
        item.resource.created_at = canonical.created_at;
        item.resource.updated_at = canonical.updated_at;
    } else {
        item.resource = canonical;
    }
}

fn mark_failed<P>(inner: &mut Inner<P>, keys: &[String], owned: bool, error: &SyncError) {
    for key in keys {
        if let Some(item) = inner.items.iter_mut().find(|i| i.key == *key) {
            item.dirty = true;
        }
    }
    if owned {
        // A failed full-set save may have carried a deletion
        inner.pending_delete = true;
    }
    inner.last_error = Some(error.to_string());
}
