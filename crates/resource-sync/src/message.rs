//! # Worker Messages
//!
//! A [`Job`] is a command after the synchronous dispatch step: the payload plus the
//! bookkeeping needed to reconcile its result. Jobs travel over one channel per command
//! kind ([`Lanes`]) to the matching effect worker.
//!
//! Every non-list job owns a [`Ticket`]. Settling a command consumes the ticket, so the
//! pending entry it represents is released exactly once, and the dispatcher's [`Reply`]
//! (if it asked for one) is answered exactly once.

use crate::client::Completion;
use crate::command::{CommandKind, ListQuery, PendingKey};
use crate::entity::SyncEntity;
use crate::state::Resolution;
use tokio::sync::{mpsc, oneshot};

/// Answers the dispatcher of one command with that command's own outcome.
pub type Reply<T> = oneshot::Sender<Completion<T>>;

/// Sends `resolution` to whoever waits on this command. A dropped receiver is not an error.
pub(crate) fn answer<T: SyncEntity>(
    reply: Option<Reply<T>>,
    resolution: &Resolution,
    result: Option<T::ActionResult>,
) {
    if let Some(reply) = reply {
        let _ = reply.send(Completion {
            resolution: resolution.clone(),
            result,
        });
    }
}

/// A dispatched command on its way to a worker.
#[derive(Debug)]
pub enum Job<T: SyncEntity> {
    List {
        query: ListQuery,
        token: u64,
        reply: Option<Reply<T>>,
    },
    Create { params: T::Create, ticket: Ticket<T> },
    Update { id: T::Id, update: T::Update, ticket: Ticket<T> },
    Delete { id: T::Id, ticket: Ticket<T> },
    Action { action: T::Action, ticket: Ticket<T> },
}

impl<T: SyncEntity> Job<T> {
    pub fn kind(&self) -> CommandKind {
        match self {
            Job::List { .. } => CommandKind::List,
            Job::Create { ticket, .. }
            | Job::Update { ticket, .. }
            | Job::Delete { ticket, .. }
            | Job::Action { ticket, .. } => ticket.key.kind,
        }
    }

    pub fn key(&self) -> PendingKey {
        match self {
            Job::List { .. } => PendingKey::new(CommandKind::List),
            Job::Create { ticket, .. }
            | Job::Update { ticket, .. }
            | Job::Delete { ticket, .. }
            | Job::Action { ticket, .. } => ticket.key.clone(),
        }
    }

    /// Attaches the channel on which this job's outcome is reported.
    pub(crate) fn with_reply(mut self, answer_to: Reply<T>) -> Self {
        match &mut self {
            Job::List { reply, .. } => *reply = Some(answer_to),
            Job::Create { ticket, .. }
            | Job::Update { ticket, .. }
            | Job::Delete { ticket, .. }
            | Job::Action { ticket, .. } => ticket.reply = Some(answer_to),
        }
        self
    }
}

/// Receipt for one in-flight command. Deliberately not `Clone`.
#[derive(Debug)]
pub struct Ticket<T: SyncEntity> {
    pub(crate) key: PendingKey,
    /// List generation at dispatch; a later list success makes optimistic totals moot.
    pub(crate) generation: u64,
    pub(crate) optimistic: Optimistic<T>,
    pub(crate) reply: Option<Reply<T>>,
}

impl<T: SyncEntity> Ticket<T> {
    pub fn key(&self) -> &PendingKey {
        &self.key
    }
}

/// Local mutation applied at dispatch, kept so it can be reconciled or undone.
#[derive(Debug)]
pub enum Optimistic<T: SyncEntity> {
    None,
    /// A provisional item was prepended and `total` incremented.
    Inserted { id: T::Id },
    /// An item was replaced in place by its locally updated version.
    Replaced { previous: T },
    /// An item was removed and `total` decremented.
    Removed { item: T, index: usize },
}

/// Per-kind channels from the dispatcher to the effect workers.
#[derive(Debug)]
pub struct Lanes<T: SyncEntity> {
    list: mpsc::UnboundedSender<Job<T>>,
    create: mpsc::UnboundedSender<Job<T>>,
    update: mpsc::UnboundedSender<Job<T>>,
    delete: mpsc::UnboundedSender<Job<T>>,
    action: mpsc::UnboundedSender<Job<T>>,
}

/// Receiving ends of [`Lanes`], one per worker.
pub(crate) type LaneReceivers<T> = Vec<(&'static str, mpsc::UnboundedReceiver<Job<T>>)>;

impl<T: SyncEntity> Lanes<T> {
    pub(crate) fn open() -> (Self, LaneReceivers<T>) {
        let (list, list_rx) = mpsc::unbounded_channel();
        let (create, create_rx) = mpsc::unbounded_channel();
        let (update, update_rx) = mpsc::unbounded_channel();
        let (delete, delete_rx) = mpsc::unbounded_channel();
        let (action, action_rx) = mpsc::unbounded_channel();
        let lanes = Self {
            list,
            create,
            update,
            delete,
            action,
        };
        let receivers = vec![
            ("list", list_rx),
            ("create", create_rx),
            ("update", update_rx),
            ("delete", delete_rx),
            ("action", action_rx),
        ];
        (lanes, receivers)
    }

    /// Sends the job to its worker. Hands the job back if that worker is gone.
    pub(crate) fn route(&self, job: Job<T>) -> Result<(), Job<T>> {
        let lane = match job.kind() {
            CommandKind::List => &self.list,
            CommandKind::Create => &self.create,
            CommandKind::Update => &self.update,
            CommandKind::Delete => &self.delete,
            CommandKind::Action(_) => &self.action,
        };
        lane.send(job).map_err(|error| error.0)
    }
}
