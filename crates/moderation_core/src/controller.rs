//! Generic paginated, filterable, bulk-actionable moderation list.
//!
//! State lives behind an async mutex that is never held across a backend
//! call. Page loads carry a sequence number so a slow, superseded response
//! cannot overwrite a newer one.

use std::{
    collections::{BTreeSet, HashSet},
    future::Future,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex as StdMutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use shared::{
    domain::{EntityId, EntityStatus, ModerationAction, ModerationDomain},
    error::{ActionError, FetchError},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    adapter::{check_filter, default_filters, FilterError, Filters, ModerationAdapter},
    api::DEFAULT_REQUEST_TIMEOUT,
    pagination::{Page, PagingMode},
};

const NOTIFICATION_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationCause {
    Fetch(FetchError),
    Action(ActionError),
}

/// User-facing toast emitted by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub cause: Option<NotificationCause>,
}

impl Notification {
    fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            cause: None,
        }
    }

    fn fetch_failure(context: &str, err: FetchError) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: format!("{context}: {err}"),
            cause: Some(NotificationCause::Fetch(err)),
        }
    }

    fn action_failure(context: &str, err: ActionError) -> Self {
        let level = if err.is_warning() {
            NotificationLevel::Warning
        } else {
            NotificationLevel::Error
        };
        let message = format!("{context}: {err}");
        // A lost response is reported as the read failure it is.
        let cause = match err {
            ActionError::ResponseLost(inner) => NotificationCause::Fetch(inner),
            other => NotificationCause::Action(other),
        };
        Self {
            level,
            message,
            cause: Some(cause),
        }
    }
}

/// Result of a single or bulk action that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied(EntityStatus),
    /// Already at the target status, or the same action is in flight.
    Skipped,
}

#[derive(Default)]
struct ControllerState {
    page: Page,
    filters: Filters,
    selection: BTreeSet<EntityId>,
    latest_load: u64,
}

struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn acquire(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Marks one id as having an action in flight until dropped, including when
/// the caller abandons the action future.
struct ActingGuard<'a> {
    acting_on: &'a StdMutex<HashSet<EntityId>>,
    id: EntityId,
}

impl<'a> ActingGuard<'a> {
    fn try_acquire(acting_on: &'a StdMutex<HashSet<EntityId>>, id: &EntityId) -> Option<Self> {
        lock_ids(acting_on).insert(id.clone()).then(|| Self {
            acting_on,
            id: id.clone(),
        })
    }
}

impl Drop for ActingGuard<'_> {
    fn drop(&mut self) {
        lock_ids(self.acting_on).remove(&self.id);
    }
}

fn lock_ids(ids: &StdMutex<HashSet<EntityId>>) -> MutexGuard<'_, HashSet<EntityId>> {
    ids.lock().unwrap_or_else(PoisonError::into_inner)
}

struct BulkGuard<'a>(&'a AtomicBool);

impl<'a> BulkGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BulkGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct ModerationListController {
    adapter: Arc<dyn ModerationAdapter>,
    request_timeout: Duration,
    inner: Mutex<ControllerState>,
    loading: AtomicUsize,
    acting_on: StdMutex<HashSet<EntityId>>,
    bulk_in_flight: AtomicBool,
    events: broadcast::Sender<Notification>,
}

impl ModerationListController {
    pub fn new(adapter: Arc<dyn ModerationAdapter>) -> Self {
        Self::with_timeout(adapter, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(adapter: Arc<dyn ModerationAdapter>, request_timeout: Duration) -> Self {
        let filters = default_filters(&adapter.describe_filters());
        let (events, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            adapter,
            request_timeout,
            inner: Mutex::new(ControllerState {
                filters,
                ..ControllerState::default()
            }),
            loading: AtomicUsize::new(0),
            acting_on: StdMutex::default(),
            bulk_in_flight: AtomicBool::new(false),
            events,
        }
    }

    pub fn domain(&self) -> ModerationDomain {
        self.adapter.domain()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.events.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst) > 0
    }

    pub async fn page(&self) -> Page {
        self.inner.lock().await.page.clone()
    }

    pub async fn filters(&self) -> Filters {
        self.inner.lock().await.filters.clone()
    }

    pub async fn selection(&self) -> BTreeSet<EntityId> {
        self.inner.lock().await.selection.clone()
    }

    pub async fn load_page(&self, page_number: u32, filters: Filters) -> Result<(), FetchError> {
        let _loading = LoadingGuard::acquire(&self.loading);
        let domain = self.domain();
        let seq = {
            let mut guard = self.inner.lock().await;
            guard.latest_load += 1;
            guard.filters = filters.clone();
            guard.latest_load
        };
        debug!(domain = domain.plural(), page = page_number, seq, "moderation: loading page");

        let result = self
            .bounded(self.adapter.list(&filters, page_number), FetchError::Timeout)
            .await
            .map(|page| match self.adapter.paging() {
                PagingMode::Server => page.normalized(),
                PagingMode::Client { page_size } => {
                    Page::slice_client_side(page.items, page_number, page_size)
                }
            });

        let mut guard = self.inner.lock().await;
        if seq != guard.latest_load {
            debug!(
                domain = domain.plural(),
                seq,
                latest = guard.latest_load,
                "moderation: discarding superseded page response"
            );
            return Ok(());
        }

        match result {
            Ok(page) => {
                info!(
                    domain = domain.plural(),
                    page = page.page_number,
                    total_pages = page.total_pages,
                    items = page.items.len(),
                    "moderation: page loaded"
                );
                guard.selection.retain(|id| page.contains(id));
                guard.page = page;
                Ok(())
            }
            Err(err) => {
                warn!(domain = domain.plural(), page = page_number, error = %err, "moderation: page load failed");
                guard.page = Page::empty();
                guard.selection.clear();
                drop(guard);
                self.notify(Notification::fetch_failure(
                    &format!("Failed to fetch {} for moderation", domain.plural()),
                    err.clone(),
                ));
                Err(err)
            }
        }
    }

    pub async fn refresh(&self) -> Result<(), FetchError> {
        let (page_number, filters) = {
            let guard = self.inner.lock().await;
            (guard.page.page_number, guard.filters.clone())
        };
        self.load_page(page_number, filters).await
    }

    /// Current filters with `overrides` applied, without loading.
    pub async fn filters_with(&self, overrides: &[(&str, &str)]) -> Result<Filters, FilterError> {
        let available = self.adapter.describe_filters();
        let mut filters = self.filters().await;
        for (name, value) in overrides {
            check_filter(&available, name, value)?;
            filters.insert(name.to_string(), value.to_string());
        }
        Ok(filters)
    }

    /// Unknown filter names or disallowed values change nothing and warn.
    pub async fn change_filter(&self, name: &str, value: &str) -> Result<(), FetchError> {
        if let Err(err) = check_filter(&self.adapter.describe_filters(), name, value) {
            self.notify(Notification::new(NotificationLevel::Warning, err.to_string()));
            return Ok(());
        }

        let filters = {
            let mut guard = self.inner.lock().await;
            guard.filters.insert(name.to_string(), value.to_string());
            guard.page.page_number = 1;
            guard.selection.clear();
            guard.filters.clone()
        };
        self.load_page(1, filters).await
    }

    /// Out-of-range pages are ignored.
    pub async fn change_page(&self, page_number: u32) -> Result<(), FetchError> {
        let (total_pages, filters) = {
            let guard = self.inner.lock().await;
            (guard.page.total_pages, guard.filters.clone())
        };
        if page_number < 1 || page_number > total_pages {
            debug!(page = page_number, total_pages, "moderation: ignoring out-of-range page");
            return Ok(());
        }
        self.load_page(page_number, filters).await
    }

    pub async fn previous_page(&self) -> Result<(), FetchError> {
        let current = self.inner.lock().await.page.page_number;
        if current <= 1 {
            return Ok(());
        }
        self.change_page(current - 1).await
    }

    pub async fn next_page(&self) -> Result<(), FetchError> {
        let (current, total_pages) = {
            let guard = self.inner.lock().await;
            (guard.page.page_number, guard.page.total_pages)
        };
        if current >= total_pages {
            return Ok(());
        }
        self.change_page(current + 1).await
    }

    /// Returns whether `id` is selected afterwards.
    pub async fn toggle_select(&self, id: &EntityId) -> bool {
        let mut guard = self.inner.lock().await;
        if guard.selection.remove(id) {
            false
        } else {
            guard.selection.insert(id.clone());
            true
        }
    }

    /// Selects the visible page, or every matching id when the adapter can
    /// list them server-side.
    pub async fn select_all(&self) -> Result<usize, FetchError> {
        let domain = self.domain();
        let filters = self.filters().await;
        let server_ids = match self
            .bounded(self.adapter.all_ids(&filters), FetchError::Timeout)
            .await
        {
            Ok(ids) => ids,
            Err(err) => {
                warn!(domain = domain.plural(), error = %err, "moderation: select all failed");
                self.notify(Notification::fetch_failure(
                    &format!("Failed to select all {}", domain.plural()),
                    err.clone(),
                ));
                return Err(err);
            }
        };

        let count = {
            let mut guard = self.inner.lock().await;
            guard.selection = match server_ids {
                Some(ids) => ids.into_iter().collect(),
                None => guard.page.items.iter().map(|entity| entity.id.clone()).collect(),
            };
            guard.selection.len()
        };
        self.notify(Notification::new(
            NotificationLevel::Success,
            format!("Selected {count} {}", domain.plural()),
        ));
        Ok(count)
    }

    pub async fn clear_selection(&self) {
        self.inner.lock().await.selection.clear();
        self.notify(Notification::new(
            NotificationLevel::Info,
            format!("All {} unselected", self.domain().plural()),
        ));
    }

    pub async fn approve(&self, id: &EntityId) -> Result<ActionOutcome, ActionError> {
        self.act(id, ModerationAction::Approve).await
    }

    pub async fn reject(&self, id: &EntityId) -> Result<ActionOutcome, ActionError> {
        self.act(id, ModerationAction::Reject).await
    }

    pub async fn bulk_approve(&self) -> Result<ActionOutcome, ActionError> {
        self.bulk(ModerationAction::Approve).await
    }

    pub async fn bulk_reject(&self) -> Result<ActionOutcome, ActionError> {
        self.bulk(ModerationAction::Reject).await
    }

    async fn act(
        &self,
        id: &EntityId,
        action: ModerationAction,
    ) -> Result<ActionOutcome, ActionError> {
        let domain = self.domain();
        let target = self.adapter.target_status(action);
        let _in_flight = {
            let guard = self.inner.lock().await;
            let current = guard
                .page
                .items
                .iter()
                .find(|entity| &entity.id == id)
                .map(|entity| entity.status);
            let acquired = if current == Some(target) {
                None
            } else {
                ActingGuard::try_acquire(&self.acting_on, id)
            };
            match acquired {
                Some(in_flight) => in_flight,
                None => {
                    debug!(
                        domain = domain.plural(),
                        entity_id = %id,
                        action = action.as_str(),
                        "moderation: action disabled"
                    );
                    return Ok(ActionOutcome::Skipped);
                }
            }
        };

        let result = self
            .bounded(self.adapter.act(id, action), ActionError::Timeout)
            .await;

        let mut guard = self.inner.lock().await;
        match result {
            Ok(status) => {
                if let Some(entity) = guard.page.items.iter_mut().find(|entity| &entity.id == id) {
                    entity.status = status;
                }
                drop(guard);
                info!(domain = domain.plural(), entity_id = %id, status = %status, "moderation: action applied");
                self.notify(Notification::new(
                    NotificationLevel::Success,
                    format!("{} {} successfully", capitalized(domain.singular()), past_tense(action)),
                ));
                Ok(ActionOutcome::Applied(status))
            }
            Err(err) => {
                drop(guard);
                warn!(domain = domain.plural(), entity_id = %id, action = action.as_str(), error = %err, "moderation: action failed");
                self.notify(Notification::action_failure(
                    &format!("Failed to {action} {}", domain.singular()),
                    err.clone(),
                ));
                Err(err)
            }
        }
    }

    async fn bulk(&self, action: ModerationAction) -> Result<ActionOutcome, ActionError> {
        let domain = self.domain();
        let (_in_flight, ids): (BulkGuard<'_>, Vec<EntityId>) = {
            let guard = self.inner.lock().await;
            if guard.selection.is_empty() {
                drop(guard);
                self.notify(Notification {
                    level: NotificationLevel::Warning,
                    message: format!("No {} selected", domain.plural()),
                    cause: Some(NotificationCause::Action(ActionError::NoSelection)),
                });
                return Err(ActionError::NoSelection);
            }
            let Some(in_flight) = BulkGuard::try_acquire(&self.bulk_in_flight) else {
                return Ok(ActionOutcome::Skipped);
            };
            (in_flight, guard.selection.iter().cloned().collect())
        };

        let result = self
            .bounded(self.adapter.bulk_act(&ids, action), ActionError::Timeout)
            .await;

        let mut guard = self.inner.lock().await;
        match result {
            Ok(status) => {
                let sent: HashSet<&EntityId> = ids.iter().collect();
                for entity in guard.page.items.iter_mut() {
                    if sent.contains(&entity.id) {
                        entity.status = status;
                    }
                }
                guard.selection.retain(|id| !sent.contains(id));
                drop(guard);
                info!(domain = domain.plural(), count = ids.len(), status = %status, "moderation: bulk action applied");
                self.notify(Notification::new(
                    NotificationLevel::Success,
                    format!("{} {} {} successfully", ids.len(), domain.plural(), past_tense(action)),
                ));
                Ok(ActionOutcome::Applied(status))
            }
            Err(err) => {
                drop(guard);
                warn!(domain = domain.plural(), count = ids.len(), action = action.as_str(), error = %err, "moderation: bulk action failed");
                self.notify(Notification::action_failure(
                    &format!("Failed to {action} {}", domain.plural()),
                    err.clone(),
                ));
                Err(err)
            }
        }
    }

    async fn bounded<T, E>(&self, call: impl Future<Output = Result<T, E>>, elapsed: E) -> Result<T, E> {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(elapsed),
        }
    }

    fn notify(&self, notification: Notification) {
        // Err only means nobody is subscribed.
        let _ = self.events.send(notification);
    }
}

fn past_tense(action: ModerationAction) -> &'static str {
    match action {
        ModerationAction::Approve => "approved",
        ModerationAction::Reject => "rejected",
    }
}

fn capitalized(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
