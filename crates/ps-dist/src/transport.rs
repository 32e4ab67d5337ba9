//! Message-passing transport.
//!
//! Every message is an [`Envelope`] carrying its sender rank, a [`Tag`] and an
//! opaque byte payload.  Each rank has one independent inbox per tag, so a
//! loop draining edge-length requests is never blocked behind vehicle
//! traffic.  Messages between one sender and one receiver with the same tag
//! arrive in send order; nothing is promised across senders.
//!
//! [`LocalWorld`] wires a set of ranks together with unbounded `crossbeam`
//! channels so a whole distributed run fits in one process.

use std::sync::{Arc, Barrier};

use crossbeam::channel::{unbounded, Receiver, Sender};
use ps_core::Rank;

use crate::{DistError, DistResult};

/// Message kind.  The discriminants are the wire tag values.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    /// Leaf → root: vehicle stopped at a boundary, needs re-routing.
    VehicleOut    = 1,
    /// Root → leaf: vehicle to drive.
    VehicleIn     = 2,
    /// Leaf → root: length of an edge the leaf cannot see.
    EdgeRequest   = 3,
    /// Root → leaf: answer to an `EdgeRequest`.
    EdgeResponse  = 4,
    /// Leaf → root: one vehicle finished (parked or abandoned).
    DoneReport    = 5,
    /// Root → every leaf: simulation complete.
    DoneBroadcast = 6,
}

impl Tag {
    pub const ALL: [Tag; 6] = [
        Tag::VehicleOut,
        Tag::VehicleIn,
        Tag::EdgeRequest,
        Tag::EdgeResponse,
        Tag::DoneReport,
        Tag::DoneBroadcast,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tag::VehicleOut    => "vehicle-out",
            Tag::VehicleIn     => "vehicle-in",
            Tag::EdgeRequest   => "edge-request",
            Tag::EdgeResponse  => "edge-response",
            Tag::DoneReport    => "done-report",
            Tag::DoneBroadcast => "done-broadcast",
        }
    }

    #[inline]
    fn slot(self) -> usize {
        self as usize - 1
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One delivered message.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub source:  Rank,
    pub tag:     Tag,
    pub payload: Vec<u8>,
}

// ── Transport trait ───────────────────────────────────────────────────────────

/// A rank's view of the message-passing world.
///
/// Rank 0 is the root; ranks `1..size` are leaves.
pub trait Transport: Send + Sync {
    fn rank(&self) -> Rank;

    /// Number of ranks in the world, root included.
    fn size(&self) -> usize;

    /// Deliver `payload` to `dest`'s inbox for `tag`.
    fn send(&self, dest: Rank, tag: Tag, payload: Vec<u8>) -> DistResult<()>;

    /// This rank's inbox for `tag`.  Handles are clones of one queue.
    fn inbox(&self, tag: Tag) -> Receiver<Envelope>;

    /// Block until every rank in the world has entered the barrier.
    fn barrier(&self);

    /// Send `payload` to every rank except this one.
    fn broadcast(&self, tag: Tag, payload: &[u8]) -> DistResult<()> {
        let me = self.rank();
        for r in 0..self.size() as u32 {
            let dest = Rank(r);
            if dest != me {
                self.send(dest, tag, payload.to_vec())?;
            }
        }
        Ok(())
    }
}

// ── In-process world ──────────────────────────────────────────────────────────

/// Senders for every (rank, tag) inbox, shared by all ranks of one world.
type Switchboard = Vec<Vec<Sender<Envelope>>>;

/// One rank of a [`LocalWorld`].
#[derive(Clone)]
pub struct ChannelTransport {
    rank:     Rank,
    outboxes: Arc<Switchboard>,
    inboxes:  Vec<Receiver<Envelope>>,
    barrier:  Arc<Barrier>,
}

impl Transport for ChannelTransport {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.outboxes.len()
    }

    fn send(&self, dest: Rank, tag: Tag, payload: Vec<u8>) -> DistResult<()> {
        let size = self.size();
        let tx = self
            .outboxes
            .get(dest.index())
            .ok_or(DistError::NoSuchRank { rank: dest, size })?;
        tx[tag.slot()]
            .send(Envelope { source: self.rank, tag, payload })
            .map_err(|_| DistError::Disconnected(format!("{tag} inbox of {dest}")))
    }

    fn inbox(&self, tag: Tag) -> Receiver<Envelope> {
        self.inboxes[tag.slot()].clone()
    }

    fn barrier(&self) {
        self.barrier.wait();
    }
}

/// A fully connected set of in-process ranks.
pub struct LocalWorld {
    transports: Vec<ChannelTransport>,
}

impl LocalWorld {
    pub fn new(size: usize) -> Self {
        let mut outboxes: Switchboard = Vec::with_capacity(size);
        let mut inboxes: Vec<Vec<Receiver<Envelope>>> = Vec::with_capacity(size);
        for _ in 0..size {
            let (tx, rx): (Vec<_>, Vec<_>) = Tag::ALL.iter().map(|_| unbounded()).unzip();
            outboxes.push(tx);
            inboxes.push(rx);
        }

        let outboxes = Arc::new(outboxes);
        let barrier = Arc::new(Barrier::new(size));
        let transports = inboxes
            .into_iter()
            .enumerate()
            .map(|(r, inboxes)| ChannelTransport {
                rank: Rank(r as u32),
                outboxes: Arc::clone(&outboxes),
                inboxes,
                barrier: Arc::clone(&barrier),
            })
            .collect();
        LocalWorld { transports }
    }

    pub fn size(&self) -> usize {
        self.transports.len()
    }

    /// Hand out the per-rank transports, in rank order.
    pub fn into_transports(self) -> Vec<ChannelTransport> {
        self.transports
    }
}
