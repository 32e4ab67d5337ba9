//! Completion counting on the root.
//!
//! A dedicated thread owns the tally.  Reporters send one [`Completion`] per
//! finished vehicle over a channel; once the tally reaches the expected total
//! the thread publishes it on a second channel, which the root's main thread
//! blocks on.  No shared counter, no polling.

use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use tracing::{debug, warn};

use crate::{Completion, DistError, DistResult};

/// Completed-vehicle counts.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub parked:    usize,
    pub abandoned: usize,
}

impl Tally {
    pub fn done(&self) -> usize {
        self.parked + self.abandoned
    }

    fn record(&mut self, c: Completion) {
        match c {
            Completion::Parked    => self.parked += 1,
            Completion::Abandoned => self.abandoned += 1,
        }
    }
}

pub struct TerminationAggregator {
    expected: usize,
    finished: Receiver<Tally>,
    handle:   JoinHandle<Tally>,
}

impl TerminationAggregator {
    /// Start the aggregator for `expected` vehicles.
    ///
    /// Returns the aggregator and the first reporter handle; clone the
    /// handle for every loop that reports completions.  With `expected == 0`
    /// the aggregator finishes immediately.
    pub fn spawn(expected: usize) -> DistResult<(TerminationAggregator, Sender<Completion>)> {
        let (report_tx, report_rx) = unbounded::<Completion>();
        let (finished_tx, finished) = bounded::<Tally>(1);

        let handle = thread::Builder::new()
            .name("termination".into())
            .spawn(move || {
                let mut tally = Tally::default();
                if expected == 0 {
                    let _ = finished_tx.send(tally);
                }
                for c in report_rx {
                    if tally.done() >= expected {
                        warn!(?c, expected, "completion reported after all vehicles were counted");
                        continue;
                    }
                    tally.record(c);
                    debug!(done = tally.done(), expected, "completion counted");
                    if tally.done() == expected {
                        let _ = finished_tx.send(tally);
                    }
                }
                tally
            })?;

        Ok((TerminationAggregator { expected, finished, handle }, report_tx))
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Block until every expected vehicle has been reported.
    ///
    /// The aggregator thread keeps running until the last reporter handle
    /// drops, so late duplicates are still logged.
    ///
    /// # Errors
    ///
    /// [`DistError::Incomplete`] if every reporter handle is dropped first.
    pub fn wait(self) -> DistResult<Tally> {
        if let Ok(tally) = self.finished.recv() {
            return Ok(tally);
        }
        let tally = self
            .handle
            .join()
            .map_err(|_| DistError::Panicked("termination".into()))?;
        Err(DistError::Incomplete { done: tally.done(), expected: self.expected })
    }
}
