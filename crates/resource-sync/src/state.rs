//! # Resource State
//!
//! [`ResourceState`] is the serializable table kept for one resource: items, pending
//! operations, per-command errors, pagination, filters, sort and the selection cursor.
//!
//! All transitions are plain synchronous methods so they can be reasoned about (and
//! tested) without a runtime:
//!
//! - [`ResourceState::begin`] is the dispatch step. It runs before any I/O, marks the
//!   command pending, merges list paging/filters, applies optimistic mutations, and
//!   returns the [`Job`] for the worker.
//! - `settle_*` / [`ResourceState::apply_list`] reconcile a result. Each consumes the
//!   job's ticket and returns a [`Resolution`].
//!
//! ## Invariants
//!
//! - `items` never holds two entries with the same id.
//! - A pending key is released exactly once per command. Superseded `list` commands never
//!   touch state; the list key belongs to the latest token.
//! - `pagination.total` is authoritative only after a list success; create/delete adjust
//!   it by one in between.
//! - Errors are scoped by [`CommandKind`]: a failed delete does not hide a create success.

use crate::backend::{ActionOutcome, Page};
use crate::command::{
    Command, CommandKind, FilterValue, ListQuery, ListRequest, PendingKey, SchedulePolicy, Sort,
};
use crate::entity::{EntityAction, SyncEntity};
use crate::error::NormalizedError;
use crate::message::{answer, Job, Optimistic, Ticket};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Paging information. `total`/`total_pages` come from the last list success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Pagination {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            total: 0,
            total_pages: 0,
        }
    }

    fn pages_for(total: u64, page_size: u32) -> u32 {
        let size = u64::from(page_size.max(1));
        u32::try_from(total.div_ceil(size)).unwrap_or(u32::MAX)
    }
}

/// How a settled command ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    Failed(NormalizedError),
    /// A superseded list result; nothing was changed.
    Stale,
}

/// In-memory table for one resource.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceState<T: SyncEntity> {
    items: Vec<T>,
    pending: BTreeMap<PendingKey, u32>,
    errors: BTreeMap<CommandKind, NormalizedError>,
    #[serde(skip)]
    latest_error: Option<CommandKind>,
    pagination: Pagination,
    filters: BTreeMap<String, FilterValue>,
    sort: Option<Sort>,
    selected: Option<T::Id>,
    last_result: Option<T::ActionResult>,
    /// Token of the most recently dispatched list.
    #[serde(skip)]
    list_token: u64,
    /// Number of list successes applied so far.
    #[serde(skip)]
    generation: u64,
}

impl<T: SyncEntity> ResourceState<T> {
    pub fn new(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            pending: BTreeMap::new(),
            errors: BTreeMap::new(),
            latest_error: None,
            pagination: Pagination::new(page_size),
            filters: BTreeMap::new(),
            sort: None,
            selected: None,
            last_result: None,
            list_token: 0,
            generation: 0,
        }
    }

    // --- Read access ---

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.items.iter().find(|item| &item.id() == id)
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn filters(&self) -> &BTreeMap<String, FilterValue> {
        &self.filters
    }

    pub fn sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }

    pub fn selected(&self) -> Option<&T::Id> {
        self.selected.as_ref()
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    pub fn last_result(&self) -> Option<&T::ActionResult> {
        self.last_result.as_ref()
    }

    pub fn is_pending(&self, key: &PendingKey) -> bool {
        self.pending.contains_key(key)
    }

    /// True while any command of `kind` is in flight, whatever its target.
    pub fn is_kind_pending(&self, kind: CommandKind) -> bool {
        self.pending.keys().any(|key| key.kind == kind)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_keys(&self) -> impl Iterator<Item = &PendingKey> {
        self.pending.keys()
    }

    pub fn error(&self, kind: CommandKind) -> Option<&NormalizedError> {
        self.errors.get(&kind)
    }

    /// The most recently recorded error still standing, of any kind.
    pub fn last_error(&self) -> Option<&NormalizedError> {
        self.latest_error
            .and_then(|kind| self.errors.get(&kind))
            .or_else(|| self.errors.values().next())
    }

    /// Token of the latest list dispatch.
    pub fn list_token(&self) -> u64 {
        self.list_token
    }

    // --- UI cursor & resets ---

    pub fn select(&mut self, id: Option<T::Id>) {
        self.selected = id;
    }

    pub fn clear_error(&mut self, kind: CommandKind) {
        self.errors.remove(&kind);
        if self.latest_error == Some(kind) {
            self.latest_error = None;
        }
    }

    /// Logical reset: filters, sort, page, selection, errors and last result are cleared.
    /// Items and in-flight commands are kept.
    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.sort = None;
        self.pagination.page = 1;
        self.selected = None;
        self.errors.clear();
        self.latest_error = None;
        self.last_result = None;
    }

    // --- Dispatch ---

    /// Synchronous dispatch step. Runs before any I/O.
    pub fn begin(&mut self, command: Command<T>) -> Job<T> {
        match command {
            Command::List(request) => {
                let query = self.merge_list_request(request);
                self.list_token += 1;
                self.mark_pending(PendingKey::new(CommandKind::List));
                Job::List {
                    query,
                    token: self.list_token,
                    reply: None,
                }
            }
            Command::Create(params) => {
                let temp_id = format!("tmp-{}", uuid::Uuid::new_v4());
                let optimistic = match T::provisional(&temp_id, &params) {
                    Some(item) if self.get(&item.id()).is_none() => {
                        let id = item.id();
                        self.items.insert(0, item);
                        self.pagination.total += 1;
                        Optimistic::Inserted { id }
                    }
                    _ => Optimistic::None,
                };
                let ticket = self.issue(PendingKey::new(CommandKind::Create), optimistic);
                Job::Create { params, ticket }
            }
            Command::Update { id, update } => {
                let optimistic = match self.position(&id) {
                    Some(index) => match self.items[index].apply_update(&update) {
                        Some(next) => {
                            let previous = std::mem::replace(&mut self.items[index], next);
                            Optimistic::Replaced { previous }
                        }
                        None => Optimistic::None,
                    },
                    None => Optimistic::None,
                };
                let ticket = self.issue(PendingKey::targeting(CommandKind::Update, &id), optimistic);
                Job::Update { id, update, ticket }
            }
            Command::Delete { id } => {
                let optimistic = match self.position(&id) {
                    Some(index) => {
                        let item = self.items.remove(index);
                        self.pagination.total = self.pagination.total.saturating_sub(1);
                        if self.selected.as_ref() == Some(&id) {
                            self.selected = None;
                        }
                        Optimistic::Removed { item, index }
                    }
                    None => Optimistic::None,
                };
                let ticket = self.issue(PendingKey::targeting(CommandKind::Delete, &id), optimistic);
                Job::Delete { id, ticket }
            }
            Command::Action(action) => {
                let kind = CommandKind::Action(action.name());
                let key = match action.target() {
                    Some(target) => PendingKey::targeting(kind, target),
                    None => PendingKey::new(kind),
                };
                let ticket = self.issue(key, Optimistic::None);
                Job::Action { action, ticket }
            }
        }
    }

    /// Settles a job that never reached its worker.
    pub fn abandon(&mut self, job: Job<T>, error: NormalizedError) {
        match job {
            Job::List { token, reply, .. } => {
                let resolution = self.apply_list(token, Err(error));
                answer(reply, &resolution, None);
            }
            Job::Create { ticket, .. } => {
                self.settle_create(ticket, Err(error));
            }
            Job::Update { ticket, .. } => {
                self.settle_update(ticket, Err(error));
            }
            // Nothing was sent, so the item is put back.
            Job::Delete { ticket, .. } => {
                self.settle_delete(ticket, Err(error), true);
            }
            Job::Action { ticket, .. } => {
                self.settle_action(ticket, Err(error));
            }
        }
    }

    // --- Reconciliation ---

    /// Applies a list result if `token` is still the latest; otherwise a no-op.
    pub fn apply_list(&mut self, token: u64, result: Result<Page<T>, NormalizedError>) -> Resolution {
        if self.is_superseded(CommandKind::List, token) {
            return Resolution::Stale;
        }
        self.pending.remove(&PendingKey::new(CommandKind::List));

        match result {
            Ok(page) => {
                self.items = dedupe(page.items);
                let meta = page.meta;
                if let Some(page_size) = meta.page_size.filter(|size| *size > 0) {
                    self.pagination.page_size = page_size;
                }
                if let Some(page) = meta.page.filter(|page| *page > 0) {
                    self.pagination.page = page;
                }
                let total = meta.total.unwrap_or(self.items.len() as u64);
                let total_pages = meta
                    .total_pages
                    .unwrap_or_else(|| Pagination::pages_for(total, self.pagination.page_size));
                self.pagination.total = total;
                self.pagination.total_pages = total_pages;
                self.generation += 1;
                self.clear_error(CommandKind::List);
                Resolution::Applied
            }
            Err(error) => self.fail(CommandKind::List, error),
        }
    }

    /// The provisional is dropped and the confirmed item prepended, so concurrent creates
    /// end up in arrival order.
    pub fn settle_create(&mut self, ticket: Ticket<T>, result: Result<T, NormalizedError>) -> Resolution {
        let Ticket {
            key,
            generation,
            optimistic,
            reply,
        } = ticket;
        self.release(&key);
        let list_unchanged = generation == self.generation;

        let provisional = match optimistic {
            Optimistic::Inserted { id } => self.remove_by_id(&id).map(|_| ()),
            _ => None,
        };

        let resolution = match result {
            Ok(item) => {
                match self.position(&item.id()) {
                    Some(index) => self.items[index] = item,
                    None => {
                        self.items.insert(0, item);
                        // A provisional already counted this item; a newer list already counted it too.
                        if provisional.is_none() && list_unchanged {
                            self.pagination.total += 1;
                        }
                    }
                }
                self.clear_error(CommandKind::Create);
                Resolution::Applied
            }
            Err(error) => {
                if provisional.is_some() && list_unchanged {
                    self.pagination.total = self.pagination.total.saturating_sub(1);
                }
                self.fail(CommandKind::Create, error)
            }
        };
        answer(reply, &resolution, None);
        resolution
    }

    /// A failed update restores the pre-dispatch item, unless a list success has
    /// replaced the items since.
    pub fn settle_update(&mut self, ticket: Ticket<T>, result: Result<T, NormalizedError>) -> Resolution {
        let Ticket {
            key,
            generation,
            optimistic,
            reply,
        } = ticket;
        self.release(&key);

        let resolution = match result {
            Ok(item) => {
                if let Some(index) = self.position(&item.id()) {
                    self.items[index] = item;
                }
                self.clear_error(CommandKind::Update);
                Resolution::Applied
            }
            Err(error) => {
                if let Optimistic::Replaced { previous } = optimistic {
                    if generation == self.generation {
                        if let Some(index) = self.position(&previous.id()) {
                            self.items[index] = previous;
                        }
                    }
                }
                self.fail(CommandKind::Update, error)
            }
        };
        answer(reply, &resolution, None);
        resolution
    }

    /// `restore` puts an optimistically removed item back when the delete failed.
    pub fn settle_delete(
        &mut self,
        ticket: Ticket<T>,
        result: Result<(), NormalizedError>,
        restore: bool,
    ) -> Resolution {
        let Ticket {
            key,
            generation,
            optimistic,
            reply,
        } = ticket;
        self.release(&key);

        let resolution = match result {
            Ok(()) => {
                self.clear_error(CommandKind::Delete);
                Resolution::Applied
            }
            Err(error) => {
                if let Optimistic::Removed { item, index } = optimistic {
                    if restore && generation == self.generation && self.get(&item.id()).is_none() {
                        let index = index.min(self.items.len());
                        self.items.insert(index, item);
                        self.pagination.total += 1;
                    }
                }
                self.fail(CommandKind::Delete, error)
            }
        };
        answer(reply, &resolution, None);
        resolution
    }

    pub fn settle_action(
        &mut self,
        ticket: Ticket<T>,
        result: Result<ActionOutcome<T>, NormalizedError>,
    ) -> Resolution {
        let Ticket { key, reply, .. } = ticket;
        let kind = key.kind;
        self.release(&key);

        let mut computed = None;
        let resolution = match result {
            Ok(outcome) => {
                match outcome {
                    ActionOutcome::Done | ActionOutcome::Download(_) => {}
                    ActionOutcome::Upsert(item) => {
                        if let Some(index) = self.position(&item.id()) {
                            self.items[index] = item;
                        }
                    }
                    ActionOutcome::Remove(id) => {
                        if self.remove_by_id(&id).is_some() {
                            self.pagination.total = self.pagination.total.saturating_sub(1);
                        }
                        if self.selected.as_ref() == Some(&id) {
                            self.selected = None;
                        }
                    }
                    ActionOutcome::Result(value) => {
                        computed = Some(value.clone());
                        self.last_result = Some(value);
                    }
                }
                self.clear_error(kind);
                Resolution::Applied
            }
            Err(error) => self.fail(kind, error),
        };
        answer(reply, &resolution, computed);
        resolution
    }

    // --- Internals ---

    fn mark_pending(&mut self, key: PendingKey) {
        match key.kind.policy() {
            // A newer dispatch takes over the older one's slot.
            SchedulePolicy::TakeLatest => {
                self.pending.insert(key, 1);
            }
            SchedulePolicy::TakeEvery => *self.pending.entry(key).or_insert(0) += 1,
        }
    }

    fn is_superseded(&self, kind: CommandKind, token: u64) -> bool {
        kind.policy() == SchedulePolicy::TakeLatest && token != self.list_token
    }

    fn issue(&mut self, key: PendingKey, optimistic: Optimistic<T>) -> Ticket<T> {
        self.mark_pending(key.clone());
        Ticket {
            key,
            generation: self.generation,
            optimistic,
            reply: None,
        }
    }

    fn release(&mut self, key: &PendingKey) {
        if let Some(count) = self.pending.get_mut(key) {
            *count -= 1;
            if *count == 0 {
                self.pending.remove(key);
            }
        }
    }

    fn fail(&mut self, kind: CommandKind, error: NormalizedError) -> Resolution {
        self.errors.insert(kind, error.clone());
        self.latest_error = Some(kind);
        Resolution::Failed(error)
    }

    fn position(&self, id: &T::Id) -> Option<usize> {
        self.items.iter().position(|item| &item.id() == id)
    }

    fn remove_by_id(&mut self, id: &T::Id) -> Option<T> {
        self.position(id).map(|index| self.items.remove(index))
    }

    fn merge_list_request(&mut self, request: ListRequest) -> ListQuery {
        let ListRequest {
            page,
            page_size,
            filters,
            sort,
        } = request;

        if let Some(page) = page {
            self.pagination.page = page.max(1);
        }
        if let Some(page_size) = page_size {
            self.pagination.page_size = page_size.max(1);
        }
        if let Some(sort) = sort {
            self.sort = Some(sort);
        }

        let mut filters_changed = false;
        for (name, value) in filters {
            let changed = match value {
                Some(value) => self.filters.insert(name, value.clone()).as_ref() != Some(&value),
                None => self.filters.remove(&name).is_some(),
            };
            filters_changed |= changed;
        }
        if filters_changed {
            self.pagination.page = 1;
        }

        ListQuery {
            page: self.pagination.page,
            page_size: self.pagination.page_size,
            filters: self.filters.clone(),
            sort: self.sort.clone(),
        }
    }
}

/// Keeps the first occurrence of every id, preserving server order.
fn dedupe<T: SyncEntity>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(item.id())).collect()
}
