//! # Live Collection
//!
//! An in-process stand-in for a hosted real-time collection. The actor owns
//! the records and pushes a complete, newest-first [`Snapshot`] to every
//! subscriber after each change. Subscribers never see diffs.
//!
//! Each subscriber gets its own delivery task, so a slow subscriber cannot
//! stall the collection and deliveries to one subscriber never overlap. A
//! subscriber that falls behind skips straight to the newest snapshot;
//! nothing queues up behind it.

use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

// =============================================================================
// 1. THE ABSTRACTION
// =============================================================================

/// Trait that any record kept in a live collection must implement.
pub trait Record: Clone + Send + Sync + 'static {
    type Id: Eq + Hash + Ord + Clone + Send + Sync + Display + Debug;

    fn id(&self) -> &Self::Id;

    /// Snapshots are ordered by this timestamp, newest first.
    fn created_at(&self) -> DateTime<Utc>;
}

/// Errors surfaced by a live collection or its subscriptions.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FeedError {
    #[error("Feed backend error: {0}")]
    Backend(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

/// A complete point-in-time copy of a collection.
#[derive(Debug, Clone)]
pub struct Snapshot<T: Record> {
    revision: u64,
    records: Arc<Vec<T>>,
}

impl<T: Record> Snapshot<T> {
    pub fn new(revision: u64, mut records: Vec<T>) -> Self {
        records.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        Self {
            revision,
            records: Arc::new(records),
        }
    }

    pub fn empty() -> Self {
        Self::new(0, Vec::new())
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T: Record> Default for Snapshot<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// What a subscriber receives.
#[derive(Debug, Clone)]
pub enum FeedEvent<T: Record> {
    Snapshot(Snapshot<T>),
    /// Terminal. Nothing is delivered to the subscriber afterwards.
    Failed(FeedError),
}

pub type Sink<T> = Box<dyn FnMut(FeedEvent<T>) + Send + 'static>;

// =============================================================================
// 2. SUBSCRIPTIONS
// =============================================================================

/// What is waiting for one subscriber. A newer snapshot replaces one that
/// was not taken yet.
struct Pending<T: Record> {
    sequence: u64,
    snapshot: Snapshot<T>,
    failure: Option<FeedError>,
}

/// Sending end of a feed lane. Cheap to clone.
pub(crate) struct Outbox<T: Record> {
    pending: Arc<watch::Sender<Pending<T>>>,
}

impl<T: Record> Clone for Outbox<T> {
    fn clone(&self) -> Self {
        Self {
            pending: self.pending.clone(),
        }
    }
}

impl<T: Record> Outbox<T> {
    /// Returns `false` once the receiving end is gone.
    pub(crate) fn push(&self, event: FeedEvent<T>) -> bool {
        if self.pending.is_closed() {
            return false;
        }
        self.pending.send_modify(|pending| match event {
            FeedEvent::Snapshot(snapshot) => {
                pending.sequence += 1;
                pending.snapshot = snapshot;
            }
            FeedEvent::Failed(error) => pending.failure = Some(error),
        });
        true
    }
}

/// Receiving end of a feed lane.
pub(crate) struct Inbox<T: Record> {
    pending: watch::Receiver<Pending<T>>,
    taken: u64,
    failed: bool,
}

impl<T: Record> Inbox<T> {
    /// Waits until something new was pushed. `false` means every outbox is
    /// gone; call [`Inbox::take`] once more to collect what is left.
    pub(crate) async fn changed(&mut self) -> bool {
        self.pending.changed().await.is_ok()
    }

    /// The newest untaken snapshot, then the failure if one arrived. A
    /// failure is handed out only once.
    pub(crate) fn take(&mut self) -> Vec<FeedEvent<T>> {
        let pending = self.pending.borrow_and_update();
        let mut events = Vec::new();
        if pending.sequence != self.taken {
            self.taken = pending.sequence;
            events.push(FeedEvent::Snapshot(pending.snapshot.clone()));
        }
        if let Some(error) = &pending.failure {
            if !self.failed {
                self.failed = true;
                events.push(FeedEvent::Failed(error.clone()));
            }
        }
        events
    }
}

pub(crate) fn feed_lane<T: Record>() -> (Outbox<T>, Inbox<T>) {
    let (sender, receiver) = watch::channel(Pending {
        sequence: 0,
        snapshot: Snapshot::empty(),
        failure: None,
    });
    let outbox = Outbox {
        pending: Arc::new(sender),
    };
    let inbox = Inbox {
        pending: receiver,
        taken: 0,
        failed: false,
    };
    (outbox, inbox)
}

/// Handle for one subscriber. Dropping it stops delivery.
#[must_use = "dropping a Subscription stops delivery"]
pub struct Subscription {
    id: u64,
    cancel: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Starts the delivery task for `sink` and returns the handle together
    /// with the outbox the collection pushes into.
    pub(crate) fn spawn<T: Record>(id: u64, sink: Sink<T>) -> (Self, Outbox<T>) {
        let (outbox, inbox) = feed_lane();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let task = tokio::spawn(deliver(id, inbox, cancel_rx, sink));
        let subscription = Self {
            id,
            cancel: Some(cancel_tx),
            task: Some(task),
        };
        (subscription, outbox)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stops delivery. Once this returns the sink will not be called again.
    #[instrument(fields(subscription_id = self.id), skip(self))]
    pub async fn unsubscribe(mut self) {
        debug!("Unsubscribing");
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(error = ?e, "Delivery task failed");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

async fn deliver<T: Record>(
    id: u64,
    mut inbox: Inbox<T>,
    mut cancel: oneshot::Receiver<()>,
    mut sink: Sink<T>,
) {
    'delivery: loop {
        let open = tokio::select! {
            biased;
            _ = &mut cancel => break 'delivery,
            open = inbox.changed() => open,
        };
        for event in inbox.take() {
            let terminal = matches!(event, FeedEvent::Failed(_));
            sink(event);
            if terminal {
                break 'delivery;
            }
        }
        if !open {
            break;
        }
    }
    debug!(subscription_id = id, "Delivery stopped");
}

// =============================================================================
// 3. THE MESSAGES
// =============================================================================

pub type Response<T> = oneshot::Sender<Result<T, FeedError>>;

pub enum CollectionRequest<T: Record> {
    Upsert {
        record: T,
        respond_to: Response<u64>,
    },
    Remove {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    ReplaceAll {
        records: Vec<T>,
        respond_to: Response<u64>,
    },
    Snapshot {
        respond_to: Response<Snapshot<T>>,
    },
    Subscribe {
        sink: Sink<T>,
        respond_to: Response<Subscription>,
    },
    Fail {
        error: FeedError,
        respond_to: Response<()>,
    },
    Shutdown,
}

impl<T: Record> Debug for CollectionRequest<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upsert { record, .. } => write!(f, "Upsert({})", record.id()),
            Self::Remove { id, .. } => write!(f, "Remove({})", id),
            Self::ReplaceAll { records, .. } => write!(f, "ReplaceAll({} records)", records.len()),
            Self::Snapshot { .. } => write!(f, "Snapshot"),
            Self::Subscribe { .. } => write!(f, "Subscribe"),
            Self::Fail { error, .. } => write!(f, "Fail({})", error),
            Self::Shutdown => write!(f, "Shutdown"),
        }
    }
}

// =============================================================================
// 4. THE ACTOR
// =============================================================================

pub struct CollectionActor<T: Record> {
    name: &'static str,
    receiver: mpsc::Receiver<CollectionRequest<T>>,
    store: HashMap<T::Id, T>,
    revision: u64,
    subscribers: Vec<Outbox<T>>,
    next_subscription_id: u64,
}

impl<T: Record> CollectionActor<T> {
    pub fn new(name: &'static str, buffer_size: usize) -> (Self, CollectionClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            name,
            receiver,
            store: HashMap::new(),
            revision: 0,
            subscribers: Vec::new(),
            next_subscription_id: 1,
        };
        (actor, CollectionClient::new(sender))
    }

    #[instrument(name = "collection", fields(collection = self.name), skip(self))]
    pub async fn run(mut self) {
        info!("Collection starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                CollectionRequest::Upsert { record, respond_to } => {
                    debug!(record_id = %record.id(), "Upserting record");
                    self.store.insert(record.id().clone(), record);
                    let _ = respond_to.send(Ok(self.publish()));
                }
                CollectionRequest::Remove { id, respond_to } => {
                    let removed = self.store.remove(&id);
                    if removed.is_some() {
                        debug!(record_id = %id, "Removed record");
                        self.publish();
                    } else {
                        debug!(record_id = %id, "Nothing to remove");
                    }
                    let _ = respond_to.send(Ok(removed));
                }
                CollectionRequest::ReplaceAll { records, respond_to } => {
                    self.store = records
                        .into_iter()
                        .map(|record| (record.id().clone(), record))
                        .collect();
                    let _ = respond_to.send(Ok(self.publish()));
                }
                CollectionRequest::Snapshot { respond_to } => {
                    let _ = respond_to.send(Ok(self.snapshot()));
                }
                CollectionRequest::Subscribe { sink, respond_to } => {
                    self.handle_subscribe(sink, respond_to);
                }
                CollectionRequest::Fail { error, respond_to } => {
                    self.handle_fail(error);
                    let _ = respond_to.send(Ok(()));
                }
                CollectionRequest::Shutdown => {
                    info!("Collection shutting down");
                    break;
                }
            }
        }

        info!("Collection stopped");
    }

    fn snapshot(&self) -> Snapshot<T> {
        Snapshot::new(self.revision, self.store.values().cloned().collect())
    }

    /// Bumps the revision and pushes the full snapshot to every live subscriber.
    fn publish(&mut self) -> u64 {
        self.revision += 1;
        let snapshot = self.snapshot();
        self.subscribers
            .retain(|subscriber| subscriber.push(FeedEvent::Snapshot(snapshot.clone())));
        debug!(
            revision = self.revision,
            records = snapshot.len(),
            subscribers = self.subscribers.len(),
            "Published snapshot"
        );
        self.revision
    }

    fn handle_subscribe(&mut self, sink: Sink<T>, respond_to: Response<Subscription>) {
        let id = self.next_subscription_id;
        self.next_subscription_id += 1;

        let (subscription, outbox) = Subscription::spawn(id, sink);
        // Every subscriber starts from the current state.
        if outbox.push(FeedEvent::Snapshot(self.snapshot())) {
            self.subscribers.push(outbox);
        }
        info!(subscription_id = id, "Subscriber added");
        let _ = respond_to.send(Ok(subscription));
    }

    fn handle_fail(&mut self, error: FeedError) {
        error!(error = %error, subscribers = self.subscribers.len(), "Feed failed");
        for subscriber in self.subscribers.drain(..) {
            subscriber.push(FeedEvent::Failed(error.clone()));
        }
    }
}

// =============================================================================
// 5. THE CLIENT
// =============================================================================

pub struct CollectionClient<T: Record> {
    sender: mpsc::Sender<CollectionRequest<T>>,
}

impl<T: Record> Clone for CollectionClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: Record> CollectionClient<T> {
    pub fn new(sender: mpsc::Sender<CollectionRequest<T>>) -> Self {
        Self { sender }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(Response<R>) -> CollectionRequest<T>,
    ) -> Result<R, FeedError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FeedError::ActorCommunicationError("Actor closed".to_string()))?;
        response
            .await
            .map_err(|_| FeedError::ActorCommunicationError("Actor dropped".to_string()))?
    }

    /// Inserts or replaces a record. Returns the new revision.
    pub async fn upsert(&self, record: T) -> Result<u64, FeedError> {
        self.request(|respond_to| CollectionRequest::Upsert { record, respond_to })
            .await
    }

    pub async fn remove(&self, id: T::Id) -> Result<Option<T>, FeedError> {
        self.request(|respond_to| CollectionRequest::Remove { id, respond_to })
            .await
    }

    pub async fn replace_all(&self, records: Vec<T>) -> Result<u64, FeedError> {
        self.request(|respond_to| CollectionRequest::ReplaceAll { records, respond_to })
            .await
    }

    pub async fn snapshot(&self) -> Result<Snapshot<T>, FeedError> {
        self.request(|respond_to| CollectionRequest::Snapshot { respond_to })
            .await
    }

    /// Registers `on_event`. It is called with the current snapshot right
    /// away and again after changes, until the subscription ends. If changes
    /// land faster than `on_event` returns, only the newest is delivered.
    pub async fn subscribe(
        &self,
        on_event: impl FnMut(FeedEvent<T>) + Send + 'static,
    ) -> Result<Subscription, FeedError> {
        let sink: Sink<T> = Box::new(on_event);
        self.request(|respond_to| CollectionRequest::Subscribe { sink, respond_to })
            .await
    }

    /// Delivers a terminal failure to every current subscriber.
    pub async fn fail(&self, error: FeedError) -> Result<(), FeedError> {
        self.request(|respond_to| CollectionRequest::Fail { error, respond_to })
            .await
    }

    pub async fn shutdown(&self) -> Result<(), FeedError> {
        self.sender
            .send(CollectionRequest::Shutdown)
            .await
            .map_err(|_| {
                warn!("Collection already closed");
                FeedError::ActorCommunicationError("Actor closed".to_string())
            })
    }
}
