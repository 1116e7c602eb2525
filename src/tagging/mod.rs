//! Writing and clearing result tags through the host's metadata service.
//!
//! Each request becomes one batch: the current tags of every target track are
//! fetched, edited locally and submitted together. The service applies the
//! update asynchronously and later broadcasts the identities that changed. A
//! batch completes only when a single broadcast covers *all* of its targets;
//! a broadcast covering part of a batch is ignored. Completed batches leave
//! the registry before their continuation runs, so every continuation fires
//! exactly once. There is no timeout: a batch whose full-coverage broadcast
//! never arrives stays pending.
//!
//! The writer is shared as `Rc<TagWriter>` and takes `&self` everywhere. No
//! internal borrow is held while the service or a continuation runs, so a
//! continuation may start the next batch and the service may broadcast from
//! inside `submit_update`.

pub mod library;
pub mod service;

use std::cell::{Cell, RefCell};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, info};

use crate::format::format_value;
use crate::models::{MetricGetter, ResultRecord, TrackId};

pub use library::{LibraryError, MemoryLibrary};
pub use service::{MessageSink, MetadataBlob, MetadataService};

/// Runs once when a batch completes.
pub type Completion = Box<dyn FnOnce()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOperation {
    Write,
    Clear,
}

/// Lifecycle of a tag batch. `Completed` is terminal.
///
/// `BatchBuilt` and `Submitted` only last while the batch is being handed
/// to the service: `Submitted` is what the service sees if it asks from
/// inside `submit_update`. Once a submit call returns the batch is either
/// `AwaitingCallback` or already `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    BatchBuilt,
    Submitted,
    AwaitingCallback,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BatchId(u64);

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch {}", self.0)
    }
}

/// Edited tags ready for submission, keyed by target identity.
#[derive(Debug)]
struct TagBatch {
    tags: Vec<String>,
    operation: TagOperation,
    blobs: BTreeMap<TrackId, MetadataBlob>,
}

struct PendingBatch {
    tags: Vec<String>,
    operation: TagOperation,
    /// Sorted target identities.
    targets: Vec<TrackId>,
    state: BatchState,
    completion: Option<Completion>,
}

impl PendingBatch {
    fn covered_by(&self, notified: &[TrackId]) -> bool {
        self.targets.iter().all(|id| notified.binary_search(id).is_ok())
    }

    fn touched_by(&self, notified: &[TrackId]) -> bool {
        self.targets.iter().any(|id| notified.binary_search(id).is_ok())
    }
}

/// Registry of in-flight tag batches.
pub struct TagWriter {
    service: Rc<dyn MetadataService>,
    messages: Rc<dyn MessageSink>,
    pending: RefCell<BTreeMap<BatchId, PendingBatch>>,
    next_id: Cell<u64>,
}

impl TagWriter {
    pub fn new(service: Rc<dyn MetadataService>, messages: Rc<dyn MessageSink>) -> Self {
        Self {
            service,
            messages,
            pending: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(0),
        }
    }

    /// Set `tag` on every record to its metric, formatted with `precision`
    /// decimals. Returns `None` when nothing was submitted, in which case the
    /// completion has already run.
    pub fn write_single_tag(
        &self,
        tag: &str,
        records: &[ResultRecord],
        value: MetricGetter,
        precision: usize,
        completion: Option<Completion>,
    ) -> Option<BatchId> {
        self.write_multiple_tags(&[(tag.to_string(), value)], records, precision, completion)
    }

    /// Apply every `(tag, metric)` pair to each record in one combined
    /// update. Pairs with an empty tag name are disabled and skipped.
    pub fn write_multiple_tags(
        &self,
        pairs: &[(String, MetricGetter)],
        records: &[ResultRecord],
        precision: usize,
        completion: Option<Completion>,
    ) -> Option<BatchId> {
        let active: Vec<&(String, MetricGetter)> =
            pairs.iter().filter(|(tag, _)| !tag.is_empty()).collect();
        let mut batch = TagBatch {
            tags: active.iter().map(|(tag, _)| tag.clone()).collect(),
            operation: TagOperation::Write,
            blobs: BTreeMap::new(),
        };

        if !active.is_empty() {
            for record in records {
                let Some(blob) = self.fetch_into(&mut batch.blobs, record.id) else {
                    continue;
                };
                for (tag, getter) in &active {
                    blob.set(tag, &format_value(getter(record), precision));
                }
            }
        }

        self.submit(batch, completion)
    }

    /// Remove `tag` from every track.
    pub fn clear_single_tag(
        &self,
        tag: &str,
        ids: &[TrackId],
        completion: Option<Completion>,
    ) -> Option<BatchId> {
        self.clear_multiple_tags(&[tag.to_string()], ids, completion)
    }

    /// Remove every named tag from every track in one combined update.
    pub fn clear_multiple_tags(
        &self,
        tags: &[String],
        ids: &[TrackId],
        completion: Option<Completion>,
    ) -> Option<BatchId> {
        let mut batch = TagBatch {
            tags: tags.iter().filter(|tag| !tag.is_empty()).cloned().collect(),
            operation: TagOperation::Clear,
            blobs: BTreeMap::new(),
        };

        if !batch.tags.is_empty() {
            for &id in ids {
                let Some(blob) = self.fetch_into(&mut batch.blobs, id) else {
                    continue;
                };
                for tag in &batch.tags {
                    blob.remove(tag);
                }
            }
        }

        self.submit(batch, completion)
    }

    /// Route a host "items changed" broadcast. Completes every pending batch
    /// whose targets all appear in `changed` and returns how many did.
    pub fn on_items_changed(&self, changed: &[TrackId]) -> usize {
        let mut notified = changed.to_vec();
        notified.sort_unstable();
        notified.dedup();

        let finished: Vec<(BatchId, PendingBatch)> = {
            let mut pending = self.pending.borrow_mut();
            let mut done = Vec::new();
            for (&id, batch) in pending.iter() {
                if batch.covered_by(&notified) {
                    done.push(id);
                } else if batch.touched_by(&notified) {
                    debug!(%id, "ignoring notification covering part of the batch");
                }
            }
            done.into_iter()
                .filter_map(|id| pending.remove(&id).map(|batch| (id, batch)))
                .collect()
        };

        let count = finished.len();
        for (id, batch) in finished {
            info!(%id, tracks = batch.targets.len(), "tag batch completed");
            self.complete(batch.operation, &batch.tags, batch.completion);
        }
        count
    }

    /// Lifecycle state of a batch handed out by this writer.
    pub fn batch_state(&self, id: BatchId) -> BatchState {
        match self.pending.borrow().get(&id) {
            Some(batch) => batch.state,
            None if id.0 < self.next_id.get() => BatchState::Completed,
            None => BatchState::Idle,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Fetch the current tags of `id` into the batch, reusing an earlier
    /// fetch for repeated identities. Unavailable tracks are skipped.
    fn fetch_into<'b>(
        &self,
        blobs: &'b mut BTreeMap<TrackId, MetadataBlob>,
        id: TrackId,
    ) -> Option<&'b mut MetadataBlob> {
        match blobs.entry(id) {
            Entry::Occupied(entry) => Some(entry.into_mut()),
            Entry::Vacant(entry) => match self.service.fetch_mutable_info(id) {
                Some(blob) => Some(entry.insert(blob)),
                None => {
                    debug!(track = %id, "metadata unavailable, skipping track");
                    None
                }
            },
        }
    }

    fn submit(&self, batch: TagBatch, completion: Option<Completion>) -> Option<BatchId> {
        if batch.blobs.is_empty() {
            debug!(tags = ?batch.tags, "empty tag batch, completing immediately");
            self.complete(batch.operation, &batch.tags, completion);
            return None;
        }

        let id = BatchId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let (ids, blobs): (Vec<TrackId>, Vec<MetadataBlob>) = batch.blobs.into_iter().unzip();
        debug!(%id, tracks = ids.len(), operation = ?batch.operation, "tag batch built");

        // Register before submitting so no broadcast for this batch is missed.
        self.pending.borrow_mut().insert(
            id,
            PendingBatch {
                tags: batch.tags,
                operation: batch.operation,
                targets: ids.clone(),
                state: BatchState::BatchBuilt,
                completion,
            },
        );
        self.set_state(id, BatchState::Submitted);
        self.service.submit_update(ids, blobs, true);
        self.set_state(id, BatchState::AwaitingCallback);

        Some(id)
    }

    fn set_state(&self, id: BatchId, state: BatchState) {
        if let Some(batch) = self.pending.borrow_mut().get_mut(&id) {
            batch.state = state;
        }
    }

    fn complete(&self, operation: TagOperation, tags: &[String], completion: Option<Completion>) {
        match completion {
            Some(callback) => callback(),
            None => self
                .messages
                .show_message("Tags updated", &default_message(operation, tags)),
        }
    }
}

/// Message shown for a finished batch that has no continuation.
pub fn default_message(operation: TagOperation, tags: &[String]) -> String {
    let names: Vec<String> = tags.iter().map(|tag| format!("\"{}\"", tag)).collect();
    let noun = if names.len() == 1 { "Tag" } else { "Tags" };
    let verb = match operation {
        TagOperation::Write => "written",
        TagOperation::Clear => "cleared",
    };
    format!("{} {} {}.", noun, names.join(", "), verb)
}
