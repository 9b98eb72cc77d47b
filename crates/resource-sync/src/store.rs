//! # Resource Store
//!
//! Shared, observable holder of one [`ResourceState`]. Writers are the dispatcher and the
//! effect workers; readers are views, which either take a [`snapshot`](ResourceStore::snapshot)
//! or [`subscribe`](ResourceStore::subscribe) to be woken on every change.
//!
//! # Architecture Note
//! The store is a `tokio::sync::watch` channel. Every transition runs inside
//! `send_modify`, so a transition is atomic with respect to readers: nobody ever observes
//! a half-applied result. Transitions that turn out to be no-ops (stale list results) use
//! `send_if_modified` and wake nobody.

use crate::entity::SyncEntity;
use crate::state::ResourceState;
use std::sync::Arc;
use tokio::sync::watch;

pub struct ResourceStore<T: SyncEntity> {
    sender: Arc<watch::Sender<ResourceState<T>>>,
}

impl<T: SyncEntity> Clone for ResourceStore<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: SyncEntity> ResourceStore<T> {
    pub fn new(page_size: u32) -> Self {
        let (sender, _) = watch::channel(ResourceState::new(page_size));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Owned copy of the current state.
    pub fn snapshot(&self) -> ResourceState<T> {
        self.sender.borrow().clone()
    }

    /// Runs `read` against the current state without cloning it.
    pub fn read<R>(&self, read: impl FnOnce(&ResourceState<T>) -> R) -> R {
        read(&self.sender.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceState<T>> {
        self.sender.subscribe()
    }

    /// Applies a transition and notifies subscribers.
    pub fn modify<R>(&self, transition: impl FnOnce(&mut ResourceState<T>) -> R) -> R {
        let mut output = None;
        self.sender.send_modify(|state| output = Some(transition(state)));
        output.unwrap_or_else(|| unreachable!("send_modify runs its closure exactly once"))
    }

    /// Applies a transition that may be a no-op. Subscribers are only notified when
    /// `changed` reports true for the output.
    pub fn modify_if<R>(
        &self,
        transition: impl FnOnce(&mut ResourceState<T>) -> R,
        changed: impl FnOnce(&R) -> bool,
    ) -> R {
        let mut output = None;
        self.sender.send_if_modified(|state| {
            let result = transition(state);
            let modified = changed(&result);
            output = Some(result);
            modified
        });
        output.unwrap_or_else(|| unreachable!("send_if_modified runs its closure exactly once"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::NoAction;
    use serde::Serialize;

    #[derive(Debug, Clone, Serialize)]
    struct Row {
        id: u32,
    }

    impl SyncEntity for Row {
        type Id = u32;
        type Create = ();
        type Update = ();
        type Action = NoAction;
        type ActionResult = ();
        const LABEL: &'static str = "Row";

        fn id(&self) -> u32 {
            self.id
        }
    }

    #[tokio::test]
    async fn test_modify_notifies_subscribers() {
        let store = ResourceStore::<Row>::new(10);
        let mut rx = store.subscribe();

        store.modify(|state| state.select(Some(3)));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().selected(), Some(&3));
    }

    #[tokio::test]
    async fn test_unchanged_transition_wakes_nobody() {
        let store = ResourceStore::<Row>::new(10);
        let mut rx = store.subscribe();

        let value = store.modify_if(|_| 7, |_| false);
        assert_eq!(value, 7);
        assert!(!rx.has_changed().unwrap());
    }
}
