//! In-process track catalog implementing [`MetadataService`].
//!
//! Submitted updates are queued and only applied by [`MemoryLibrary::process_pending`],
//! which returns one "items changed" broadcast per applied submission. Tracks
//! that only have a file path get their initial tags from the file itself.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, MetadataRevision};
use symphonia::core::probe::Hint;
use thiserror::Error;
use tracing::debug;

use super::service::{MetadataBlob, MetadataService};
use crate::models::TrackId;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Failed to access library {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse library {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryTrack {
    pub id: TrackId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<MetadataBlob>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LibraryFile {
    tracks: Vec<LibraryTrack>,
}

struct Submission {
    ids: Vec<TrackId>,
    blobs: Vec<MetadataBlob>,
}

#[derive(Default)]
pub struct MemoryLibrary {
    tracks: RefCell<BTreeMap<TrackId, LibraryTrack>>,
    queue: RefCell<VecDeque<Submission>>,
}

impl MemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a catalog entry.
    pub fn insert(&self, track: LibraryTrack) {
        self.tracks.borrow_mut().insert(track.id, track);
    }

    /// Drop a track from the catalog. Queued updates for it are discarded
    /// when applied.
    pub fn remove(&self, id: TrackId) -> bool {
        self.tracks.borrow_mut().remove(&id).is_some()
    }

    /// Stored tags of a track, without consulting its file.
    pub fn tags(&self, id: TrackId) -> Option<MetadataBlob> {
        self.tracks.borrow().get(&id).and_then(|t| t.tags.clone())
    }

    pub fn len(&self) -> usize {
        self.tracks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.borrow().is_empty()
    }

    pub fn pending_submissions(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Apply every queued submission in order. Each yields one broadcast
    /// listing the identities it changed; identities no longer in the
    /// catalog are left out.
    pub fn process_pending(&self) -> Vec<Vec<TrackId>> {
        let mut notifications = Vec::new();
        loop {
            let Some(submission) = self.queue.borrow_mut().pop_front() else {
                break;
            };
            let mut tracks = self.tracks.borrow_mut();
            let mut changed = Vec::with_capacity(submission.ids.len());
            for (id, blob) in submission.ids.into_iter().zip(submission.blobs) {
                match tracks.get_mut(&id) {
                    Some(track) => {
                        track.tags = Some(blob);
                        changed.push(id);
                    }
                    None => debug!(track = %id, "dropping update for track no longer in library"),
                }
            }
            notifications.push(changed);
        }
        notifications
    }

    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        let data = std::fs::read_to_string(path).map_err(|source| LibraryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: LibraryFile =
            serde_json::from_str(&data).map_err(|source| LibraryError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let library = Self::new();
        for track in file.tracks {
            library.insert(track);
        }
        Ok(library)
    }

    /// Save the catalog as pretty-printed JSON. Queued submissions are not
    /// saved.
    pub fn save(&self, path: &Path) -> Result<(), LibraryError> {
        let file = LibraryFile {
            tracks: self.tracks.borrow().values().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|source| LibraryError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| LibraryError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl MetadataService for MemoryLibrary {
    fn fetch_mutable_info(&self, id: TrackId) -> Option<MetadataBlob> {
        let tracks = self.tracks.borrow();
        let track = tracks.get(&id)?;
        if let Some(tags) = &track.tags {
            return Some(tags.clone());
        }
        match &track.path {
            Some(path) => read_file_tags(path),
            None => Some(MetadataBlob::default()),
        }
    }

    fn submit_update(&self, ids: Vec<TrackId>, blobs: Vec<MetadataBlob>, deferred_ui_refresh: bool) {
        debug!(tracks = ids.len(), deferred_ui_refresh, "queued metadata update");
        self.queue.borrow_mut().push_back(Submission { ids, blobs });
    }
}

/// Read the tags of an audio file. `None` when the file cannot be opened
/// or probed.
pub fn read_file_tags(path: &Path) -> Option<MetadataBlob> {
    let file = File::open(path).ok()?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let mut probed = match symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    ) {
        Ok(probed) => probed,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "cannot read tags");
            return None;
        }
    };

    let mut blob = MetadataBlob::default();
    // Tags found ahead of the container (e.g. ID3v2) first, container tags win.
    if let Some(metadata) = probed.metadata.get() {
        if let Some(revision) = metadata.current() {
            copy_tags(revision, &mut blob);
        }
    }
    if let Some(revision) = probed.format.metadata().current() {
        copy_tags(revision, &mut blob);
    }
    Some(blob)
}

fn copy_tags(revision: &MetadataRevision, blob: &mut MetadataBlob) {
    for tag in revision.tags() {
        blob.set(&tag.key, &tag.value.to_string());
    }
}
