//! Row sources
//!
//! A source fills a bounded channel with `RowItem`s. `FsSource` walks the
//! filesystem on a blocking thread; `MemorySource` replays a fixed list.

use std::fs::Metadata;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, Receiver, Sender};

use crate::observability::{log_event_with_fields, Event};
use crate::walk::{Entry, Visit, Walker};

use super::cancel::CancelToken;
use super::errors::ExecutorError;
use super::stream::{FileRow, RowItem};

const STAGE: &str = "source";

/// Produces the rows a query runs over
pub trait RowSource: Send + Sync {
    /// Starts producing into a new channel of `capacity` items
    fn spawn(&self, cancel: CancelToken, capacity: usize) -> Receiver<RowItem>;
}

/// Walks one or more root paths
#[derive(Debug, Clone)]
pub struct FsSource {
    roots: Vec<PathBuf>,
    walker: Walker,
}

impl FsSource {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            walker: Walker::new(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl RowSource for FsSource {
    fn spawn(&self, cancel: CancelToken, capacity: usize) -> Receiver<RowItem> {
        let (tx, rx) = mpsc::channel(capacity);
        let roots = self.roots.clone();
        let walker = self.walker;
        tokio::task::spawn_blocking(move || walk_roots(walker, &roots, &tx, &cancel));
        rx
    }
}

fn walk_roots(walker: Walker, roots: &[PathBuf], tx: &Sender<RowItem>, cancel: &CancelToken) {
    for root in roots {
        if cancel.is_cancelled() {
            let _ = tx.blocking_send(Err(ExecutorError::cancelled(STAGE)));
            return;
        }

        let mut stopped = false;
        let result = walker.walk(root, |entry| {
            if cancel.is_cancelled() {
                let _ = tx.blocking_send(Err(ExecutorError::cancelled(STAGE)));
                stopped = true;
                return Visit::Abort;
            }
            if tx.blocking_send(Ok(file_row(entry))).is_err() {
                // downstream is gone
                stopped = true;
                return Visit::Abort;
            }
            Visit::Continue
        });

        if let Err(err) = result {
            let root = root.display().to_string();
            let reason = err.to_string();
            log_event_with_fields(
                Event::WalkFailed,
                &[("root", root.as_str()), ("reason", reason.as_str())],
            );
            let _ = tx.blocking_send(Err(ExecutorError::source_failed(reason).in_stage(STAGE)));
            return;
        }
        if stopped {
            return;
        }
    }
}

/// Converts a visited entry into a row
pub fn file_row(entry: &Entry) -> FileRow {
    let mod_time = entry
        .metadata
        .modified()
        .map(|t| DateTime::<Utc>::from(t).timestamp())
        .unwrap_or(0);

    FileRow {
        name: entry.path.to_string_lossy().into_owned(),
        size: entry.metadata.len() as i64,
        mode: mode_string(&entry.metadata),
        mod_time,
        is_dir: entry.metadata.is_dir(),
    }
}

/// Renders metadata as `drwxr-xr-x`-style text
pub fn mode_string(metadata: &Metadata) -> String {
    let kind = file_kind(metadata);
    format_mode(
        metadata.is_dir(),
        kind.device,
        kind.pipe,
        kind.socket,
        kind.char_device,
        permission_bits(metadata),
    )
}

#[derive(Default)]
struct FileKind {
    device: bool,
    pipe: bool,
    socket: bool,
    char_device: bool,
}

#[cfg(unix)]
fn file_kind(metadata: &Metadata) -> FileKind {
    use std::os::unix::fs::FileTypeExt;

    let ft = metadata.file_type();
    FileKind {
        device: ft.is_block_device() || ft.is_char_device(),
        pipe: ft.is_fifo(),
        socket: ft.is_socket(),
        char_device: ft.is_char_device(),
    }
}

#[cfg(not(unix))]
fn file_kind(_metadata: &Metadata) -> FileKind {
    FileKind::default()
}

#[cfg(unix)]
fn permission_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;

    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn permission_bits(metadata: &Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o666
    }
}

fn format_mode(
    is_dir: bool,
    device: bool,
    pipe: bool,
    socket: bool,
    char_device: bool,
    bits: u32,
) -> String {
    let mut out = String::with_capacity(12);
    let flags = [
        (is_dir, 'd'),
        (device, 'D'),
        (pipe, 'p'),
        (socket, 'S'),
        (bits & 0o4000 != 0, 'u'),
        (bits & 0o2000 != 0, 'g'),
        (char_device, 'c'),
        (bits & 0o1000 != 0, 't'),
    ];
    for (set, letter) in flags {
        if set {
            out.push(letter);
        }
    }
    if out.is_empty() {
        out.push('-');
    }

    for (i, letter) in "rwxrwxrwx".chars().enumerate() {
        if bits & (1 << (8 - i)) != 0 {
            out.push(letter);
        } else {
            out.push('-');
        }
    }
    out
}

/// Replays a fixed list of rows
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    rows: Vec<FileRow>,
}

impl MemorySource {
    pub fn new(rows: Vec<FileRow>) -> Self {
        Self { rows }
    }
}

impl RowSource for MemorySource {
    fn spawn(&self, cancel: CancelToken, capacity: usize) -> Receiver<RowItem> {
        let (tx, rx) = mpsc::channel(capacity);
        let rows = self.rows.clone();
        tokio::spawn(async move {
            for row in rows {
                if cancel.is_cancelled() {
                    let _ = tx.send(Err(ExecutorError::cancelled(STAGE))).await;
                    return;
                }
                if tx.send(Ok(row)).await.is_err() {
                    return;
                }
            }
        });
        rx
    }
}
