use std::collections::HashMap;
use std::fmt;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::{AssetLoader, ParsedResource};
use crate::error::AssetLoadError;

/// Handle for one outstanding load request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "load-{}", self.0)
    }
}

/// Settled request, delivered once by [`LoadQueue::poll`]
#[derive(Debug)]
pub struct LoadOutcome {
    pub ticket: Ticket,
    pub name: String,
    pub result: Result<ParsedResource, AssetLoadError>,
}

struct Outstanding {
    name: String,
    started: Instant,
    handle: Option<JoinHandle<()>>,
}

type Completion = (Ticket, Result<ParsedResource, AssetLoadError>);

/// Runs loads on worker threads and hands results back to the render
/// thread between ticks.
///
/// Every request settles exactly once: with the loader's result, with
/// `TimedOut` when a timeout is configured and expires first, or with
/// `Abandoned` if its worker died. Results arriving after a timeout are
/// dropped.
pub struct LoadQueue {
    loader: Arc<AssetLoader>,
    timeout: Option<Duration>,
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
    outstanding: HashMap<Ticket, Outstanding>,
    ready: Vec<LoadOutcome>,
    next_ticket: u64,
}

impl LoadQueue {
    pub fn new(loader: AssetLoader, timeout: Option<Duration>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            loader: Arc::new(loader),
            timeout,
            sender,
            receiver,
            outstanding: HashMap::new(),
            ready: Vec::new(),
            next_ticket: 0,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn pending_count(&self) -> usize {
        self.outstanding.len()
    }

    pub fn is_idle(&self) -> bool {
        self.outstanding.is_empty() && self.ready.is_empty()
    }

    /// Starts loading `name` without blocking the caller
    pub fn request(&mut self, name: &str) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;

        let loader = Arc::clone(&self.loader);
        let sender = self.sender.clone();
        let owned = name.to_string();
        let spawned = thread::Builder::new()
            .name(format!("asset-{}", ticket.0))
            .spawn(move || {
                let result = pollster::block_on(loader.load(&owned));
                // The queue may be gone already
                let _ = sender.send((ticket, result));
            });

        match spawned {
            Ok(handle) => {
                log::debug!("{} requested {}", ticket, name);
                self.outstanding.insert(
                    ticket,
                    Outstanding {
                        name: name.to_string(),
                        started: Instant::now(),
                        handle: Some(handle),
                    },
                );
            }
            Err(err) => {
                log::error!("Could not start loader thread for {}: {}", name, err);
                self.ready.push(LoadOutcome {
                    ticket,
                    name: name.to_string(),
                    result: Err(AssetLoadError::Abandoned(name.to_string())),
                });
            }
        }
        ticket
    }

    /// Collects every request settled since the last poll. Never blocks.
    pub fn poll(&mut self) -> Vec<LoadOutcome> {
        self.drain_channel();

        let finished: Vec<Ticket> = self
            .outstanding
            .iter()
            .filter(|(_, o)| o.handle.as_ref().map_or(true, JoinHandle::is_finished))
            .map(|(ticket, _)| *ticket)
            .collect();
        if !finished.is_empty() {
            // A worker sends before it finishes, so anything it sent is visible now
            self.drain_channel();
            for ticket in finished {
                if let Some(outstanding) = self.outstanding.remove(&ticket) {
                    log::error!("{} for {} ended without a result", ticket, outstanding.name);
                    self.ready.push(LoadOutcome {
                        ticket,
                        result: Err(AssetLoadError::Abandoned(outstanding.name.clone())),
                        name: outstanding.name,
                    });
                }
            }
        }

        if let Some(timeout) = self.timeout {
            let expired: Vec<Ticket> = self
                .outstanding
                .iter()
                .filter(|(_, o)| o.started.elapsed() >= timeout)
                .map(|(ticket, _)| *ticket)
                .collect();
            for ticket in expired {
                if let Some(outstanding) = self.outstanding.remove(&ticket) {
                    log::warn!("{} for {} timed out after {:?}", ticket, outstanding.name, timeout);
                    self.ready.push(LoadOutcome {
                        ticket,
                        result: Err(AssetLoadError::TimedOut {
                            name: outstanding.name.clone(),
                            after: timeout,
                        }),
                        name: outstanding.name,
                    });
                }
            }
        }

        std::mem::take(&mut self.ready)
    }

    /// Blocks until nothing is outstanding, returning everything settled.
    /// With no timeout configured this waits as long as the loads take.
    pub fn wait_all(&mut self) -> Vec<LoadOutcome> {
        let mut settled = self.poll();
        while !self.outstanding.is_empty() {
            match self.receiver.recv_timeout(Duration::from_millis(10)) {
                Ok(completion) => self.settle(completion),
                Err(RecvTimeoutError::Timeout) => {}
                // The queue holds a sender, so this cannot disconnect
                Err(RecvTimeoutError::Disconnected) => break,
            }
            settled.extend(self.poll());
        }
        settled
    }

    fn drain_channel(&mut self) {
        while let Ok(completion) = self.receiver.try_recv() {
            self.settle(completion);
        }
    }

    fn settle(&mut self, (ticket, result): Completion) {
        match self.outstanding.remove(&ticket) {
            Some(outstanding) => {
                if let Some(handle) = outstanding.handle {
                    // The worker has already sent; joining only reaps it
                    let _ = handle.join();
                }
                self.ready.push(LoadOutcome {
                    ticket,
                    name: outstanding.name,
                    result,
                });
            }
            None => log::debug!("Dropping late result for {}", ticket),
        }
    }
}

impl Drop for LoadQueue {
    fn drop(&mut self) {
        if !self.outstanding.is_empty() {
            log::debug!("Detaching {} unfinished load(s)", self.outstanding.len());
        }
    }
}
