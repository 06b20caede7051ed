//! Live tailing of a growing output file.
//!
//! [`TailCursor`] is the resumable primitive: each poll returns the samples
//! found on complete lines past the cursor plus the new byte offset. [`Watch`]
//! drives a cursor on a fixed interval and yields samples one at a time until
//! it is stopped, a sample bound is reached or (when not following) the file
//! has been drained.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::{debug, trace, warn};

use crate::error::{Result, StorageError};
use crate::signal::Sample;

/// Samples found by one poll
#[derive(Debug, Clone, PartialEq)]
pub struct TailBatch<T> {
    /// New samples, in file order
    pub samples: Vec<T>,
    /// Byte offset to resume from
    pub offset: u64,
    /// False when the file does not exist yet
    pub file_present: bool,
}

/// Byte-offset cursor over a file that may not exist yet
#[derive(Debug, Clone)]
pub struct TailCursor {
    path: PathBuf,
    offset: u64,
    lines: usize,
}

impl TailCursor {
    /// Cursor at the start of `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::resume(path, 0)
    }

    /// Cursor continuing from a previously returned offset
    pub fn resume(path: impl Into<PathBuf>, offset: u64) -> Self {
        Self { path: path.into(), offset, lines: 0 }
    }

    /// Watched file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current byte offset
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read whatever was appended since the last poll.
    ///
    /// Only newline-terminated lines are consumed unless `flush_partial` is set,
    /// so a line the writer is still producing is picked up whole next time.
    /// At most `limit` samples are taken. A bad line stops the poll: samples
    /// before it are returned and the cursor stays on it, so the next poll
    /// reports it as [`StorageError::Parse`].
    pub fn poll<T: Sample>(&mut self, flush_partial: bool, limit: Option<usize>) -> Result<TailBatch<T>> {
        let mut file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(TailBatch { samples: Vec::new(), offset: self.offset, file_present: false });
            }
            Err(e) => return Err(e.into()),
        };

        let len = file.metadata()?.len();
        if len < self.offset {
            warn!("{:?} shrank from {} to {} bytes; restarting from the top", self.path, self.offset, len);
            self.rewind();
        }

        file.seek(SeekFrom::Start(self.offset))?;
        let mut reader = BufReader::new(file);
        let mut raw = Vec::new();
        let mut samples = Vec::new();

        while limit.map_or(true, |max| samples.len() < max) {
            raw.clear();
            let read = reader.read_until(b'\n', &mut raw)?;
            if read == 0 || (!flush_partial && raw.last() != Some(&b'\n')) {
                break;
            }
            let line = String::from_utf8_lossy(&raw);
            let text = line.trim();
            if !text.is_empty() {
                match T::parse_sample(text) {
                    Some(sample) => samples.push(sample),
                    None if samples.is_empty() => {
                        return Err(StorageError::Parse {
                            path: self.path.clone(),
                            line: self.lines + 1,
                            value: text.to_string(),
                        });
                    }
                    None => break,
                }
            }
            self.offset += read as u64;
            self.lines += 1;
        }

        trace!("{:?}: {} new samples, offset {}", self.path, samples.len(), self.offset);
        Ok(TailBatch { samples, offset: self.offset, file_present: true })
    }

    fn rewind(&mut self) {
        self.offset = 0;
        self.lines = 0;
    }
}

/// Tailing behaviour
#[derive(Debug, Clone, PartialEq)]
pub struct WatchOptions {
    /// Delay between polls
    pub poll_interval: Duration,
    /// Stop after this many samples
    pub max_samples: Option<usize>,
    /// Give up with [`StorageError::Timeout`] if the file has not appeared by
    /// then. Once seen, a vanished file only means no data yet.
    pub wait_timeout: Option<Duration>,
    /// Keep polling after reaching end of file
    pub follow: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
            max_samples: None,
            wait_timeout: None,
            follow: true,
        }
    }
}

impl WatchOptions {
    /// Set the poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Bound the number of samples
    pub fn with_max_samples(mut self, max: usize) -> Self {
        self.max_samples = Some(max);
        self
    }

    /// Bound the wait for the file to appear
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }

    /// Follow (true) or drain once (false)
    pub fn with_follow(mut self, follow: bool) -> Self {
        self.follow = follow;
        self
    }
}

/// Cancels a [`Watch`] from any thread. Cloneable; stopping twice is harmless.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Sender<()>,
}

impl StopHandle {
    /// Ask the watch to end before its next poll
    pub fn stop(&self) {
        let _ = self.tx.try_send(());
    }
}

/// Blocking iterator over samples appended to a file.
///
/// Ends when stopped, when `max_samples` is reached, when the file is drained
/// in non-follow mode, or after yielding one error.
#[derive(Debug)]
pub struct Watch<T> {
    cursor: TailCursor,
    options: WatchOptions,
    buffered: VecDeque<T>,
    yielded: usize,
    started: Instant,
    seen_file: bool,
    stop_tx: Sender<()>,
    stop_rx: Receiver<()>,
    done: bool,
}

impl<T: Sample> Watch<T> {
    /// Watch `path` from its beginning
    pub fn new(path: impl Into<PathBuf>, options: WatchOptions) -> Self {
        Self::from_cursor(TailCursor::new(path), options)
    }

    /// Watch from an existing cursor position
    pub fn from_cursor(cursor: TailCursor, options: WatchOptions) -> Self {
        let (stop_tx, stop_rx) = bounded(1);
        Self {
            cursor,
            options,
            buffered: VecDeque::new(),
            yielded: 0,
            started: Instant::now(),
            seen_file: false,
            stop_tx,
            stop_rx,
            done: false,
        }
    }

    /// Handle that cancels this watch
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle { tx: self.stop_tx.clone() }
    }

    /// Byte offset after the last consumed line
    pub fn offset(&self) -> u64 {
        self.cursor.offset()
    }

    fn bound_reached(&self) -> bool {
        self.options.max_samples.is_some_and(|max| self.yielded >= max)
    }

    fn remaining(&self) -> Option<usize> {
        self.options.max_samples.map(|max| max.saturating_sub(self.yielded))
    }

    fn finish(&mut self) -> Option<Result<T>> {
        self.done = true;
        self.buffered.clear();
        None
    }
}

impl<T: Sample> Iterator for Watch<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done || self.bound_reached() {
                return self.finish();
            }
            if let Some(sample) = self.buffered.pop_front() {
                self.yielded += 1;
                return Some(Ok(sample));
            }
            match self.stop_rx.try_recv() {
                Ok(()) => {
                    debug!("watch on {:?} stopped", self.cursor.path());
                    return self.finish();
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {}
            }

            let batch = match self.cursor.poll::<T>(!self.options.follow, self.remaining()) {
                Ok(b) => b,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };

            if !batch.file_present {
                if self.seen_file {
                    if self.cursor.offset() > 0 {
                        debug!("{:?} disappeared; waiting for it to come back", self.cursor.path());
                        self.cursor.rewind();
                    }
                    if !self.options.follow {
                        return self.finish();
                    }
                } else {
                    match self.options.wait_timeout {
                        Some(limit) if self.started.elapsed() >= limit => {
                            self.done = true;
                            return Some(Err(StorageError::Timeout { path: self.cursor.path().to_path_buf() }));
                        }
                        None if !self.options.follow => return self.finish(),
                        _ => {}
                    }
                }
            } else {
                self.seen_file = true;
                if !batch.samples.is_empty() {
                    self.buffered.extend(batch.samples);
                    continue;
                }
                if !self.options.follow {
                    return self.finish();
                }
            }

            match self.stop_rx.recv_timeout(self.options.poll_interval) {
                Ok(()) => return self.finish(),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {}
            }
        }
    }
}
