//! Collective operations over a fixed group of cooperating members.
//!
//! Every member must issue the same collective operations in the same
//! order; a call returns only after all members issued the matching call.
//!
//! Two groups are provided:
//! * [`SoloGroup`], a group of one where every collective is local
//! * [`ThreadMember`], one member of an in-process group of threads created
//!   with [`thread_group`] and connected all-to-all through channels
use crate::read::ReadError;
use flume::{Receiver, Sender};
use std::cell::Cell;
use tracing::{trace, warn};

//-----------------------------------------------------------------------------
/// Point of the read protocol a max-reduce belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReduceTag {
    /// Largest `take` requested from one chunk.
    Take { chunk: usize },
    /// Furthest position reached, agreed as the new cursor.
    Cursor,
}

/// Blocking collective primitives used by the chunked read engine.
pub trait CollectiveGroup {
    /// Index of the calling member, in `0..size()`.
    fn rank(&self) -> usize;
    /// Number of members in the group.
    fn size(&self) -> usize;
    /// Maximum of `value` across all members. Every member must pass the
    /// same `tag`; a mismatch is a protocol violation.
    fn all_reduce_max(&self, tag: ReduceTag, value: u64) -> Result<u64, ReadError>;
    /// Wait until every member has reached the barrier.
    fn barrier(&self) -> Result<(), ReadError>;
    /// Tear the group down after a local failure so that peers blocked in a
    /// collective fail instead of waiting forever.
    fn abort(&self);
}

impl<G: CollectiveGroup + ?Sized> CollectiveGroup for &G {
    fn rank(&self) -> usize {
        (**self).rank()
    }
    fn size(&self) -> usize {
        (**self).size()
    }
    fn all_reduce_max(&self, tag: ReduceTag, value: u64) -> Result<u64, ReadError> {
        (**self).all_reduce_max(tag, value)
    }
    fn barrier(&self) -> Result<(), ReadError> {
        (**self).barrier()
    }
    fn abort(&self) {
        (**self).abort()
    }
}

//-----------------------------------------------------------------------------
/// Group with a single member.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoloGroup;

impl CollectiveGroup for SoloGroup {
    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn all_reduce_max(&self, _tag: ReduceTag, value: u64) -> Result<u64, ReadError> {
        Ok(value)
    }
    fn barrier(&self) -> Result<(), ReadError> {
        Ok(())
    }
    fn abort(&self) {}
}

//-----------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Max(ReduceTag),
    Barrier,
}

#[derive(Debug, Clone, Copy)]
enum Message {
    Collective { op: Op, seq: u64, value: u64 },
    Abort,
}

/// One member of an in-process group; move it into the thread that plays
/// this rank.
///
/// Each ordered pair of members has its own channel, so messages from one
/// peer are always received in the order they were sent.
pub struct ThreadMember {
    rank: usize,
    // indexed by peer rank, `None` at our own rank
    senders: Vec<Option<Sender<Message>>>,
    receivers: Vec<Option<Receiver<Message>>>,
    seq: Cell<u64>,
    aborted: Cell<bool>,
}

/// Create the `size` members of a new thread-backed group, ordered by rank.
pub fn thread_group(size: usize) -> Vec<ThreadMember> {
    let mut senders: Vec<Vec<Option<Sender<Message>>>> =
        (0..size).map(|_| (0..size).map(|_| None).collect()).collect();
    let mut receivers: Vec<Vec<Option<Receiver<Message>>>> =
        (0..size).map(|_| (0..size).map(|_| None).collect()).collect();
    for from in 0..size {
        for to in 0..size {
            if from != to {
                let (tx, rx) = flume::unbounded();
                senders[from][to] = Some(tx);
                receivers[to][from] = Some(rx);
            }
        }
    }
    senders
        .into_iter()
        .zip(receivers)
        .enumerate()
        .map(|(rank, (senders, receivers))| ThreadMember {
            rank,
            senders,
            receivers,
            seq: Cell::new(0),
            aborted: Cell::new(false),
        })
        .collect()
}

/// Run `f` once per member of a new group of `size` threads and collect the
/// results in rank order. A panicking member yields `Err` in its slot; its
/// peers see the group as disconnected.
pub fn run_in_threads<T, F>(size: usize, f: F) -> Vec<std::thread::Result<T>>
where
    T: Send,
    F: Fn(ThreadMember) -> T + Sync,
{
    let f = &f;
    std::thread::scope(|s| {
        let handles: Vec<_> = thread_group(size)
            .into_iter()
            .map(|member| s.spawn(move || f(member)))
            .collect();
        handles.into_iter().map(|h| h.join()).collect()
    })
}

fn peers<C>(channels: &[Option<C>]) -> impl Iterator<Item = (usize, &C)> + '_ {
    channels
        .iter()
        .enumerate()
        .filter_map(|(peer, c)| c.as_ref().map(|c| (peer, c)))
}

impl ThreadMember {
    fn collective(&self, op: Op, value: u64) -> Result<u64, ReadError> {
        if self.aborted.get() {
            return Err(ReadError::Aborted { rank: self.rank });
        }
        let seq = self.seq.get();
        self.seq.set(seq + 1);
        trace!(rank = self.rank, ?op, seq, value, "collective");
        let msg = Message::Collective { op, seq, value };
        for (peer, tx) in peers(&self.senders) {
            if tx.send(msg).is_err() {
                return Err(self.fail(ReadError::Disconnected { rank: peer }));
            }
        }
        let mut max = value;
        for (peer, rx) in peers(&self.receivers) {
            match rx.recv() {
                Ok(Message::Collective {
                    op: peer_op,
                    seq: peer_seq,
                    value,
                }) if peer_op == op && peer_seq == seq => max = max.max(value),
                Ok(Message::Collective {
                    op: peer_op,
                    seq: peer_seq,
                    ..
                }) => {
                    return Err(self.fail(ReadError::Protocol(format!(
                        "rank {} issued {:?} #{} while rank {} issued {:?} #{}",
                        peer, peer_op, peer_seq, self.rank, op, seq
                    ))))
                }
                Ok(Message::Abort) => return Err(self.fail(ReadError::Aborted { rank: peer })),
                Err(_) => return Err(self.fail(ReadError::Disconnected { rank: peer })),
            }
        }
        Ok(max)
    }

    fn fail(&self, err: ReadError) -> ReadError {
        self.abort();
        err
    }
}

impl CollectiveGroup for ThreadMember {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.senders.len()
    }

    fn all_reduce_max(&self, tag: ReduceTag, value: u64) -> Result<u64, ReadError> {
        self.collective(Op::Max(tag), value)
    }

    fn barrier(&self) -> Result<(), ReadError> {
        self.collective(Op::Barrier, 0).map(|_| ())
    }

    fn abort(&self) {
        if self.aborted.replace(true) {
            return;
        }
        warn!(rank = self.rank, "aborting collective group");
        for (_, tx) in peers(&self.senders) {
            // peers that already left cannot be notified and need not be
            let _ = tx.send(Message::Abort);
        }
    }
}

impl std::fmt::Debug for ThreadMember {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadMember")
            .field("rank", &self.rank)
            .field("size", &self.senders.len())
            .field("seq", &self.seq.get())
            .field("aborted", &self.aborted.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solo_group_is_identity() {
        let g = SoloGroup;
        assert_eq!(g.all_reduce_max(ReduceTag::Cursor, 7).unwrap(), 7);
        assert!(g.barrier().is_ok());
        assert_eq!((g.rank(), g.size()), (0, 1));
    }

    #[test]
    fn max_reduce_agrees_across_threads() {
        let results = run_in_threads(4, |m| {
            let first = m.all_reduce_max(ReduceTag::Take { chunk: 0 }, m.rank() as u64 * 10)?;
            m.barrier()?;
            let take = if m.rank() == 1 { 3 } else { 0 };
            let second = m.all_reduce_max(ReduceTag::Take { chunk: 1 }, take)?;
            Ok::<_, ReadError>((first, second))
        });
        for r in results {
            assert_eq!(r.unwrap().unwrap(), (30, 3));
        }
    }

    #[test]
    fn mismatched_operations_are_detected() {
        let results = run_in_threads(2, |m| {
            if m.rank() == 0 {
                m.barrier()
            } else {
                m.all_reduce_max(ReduceTag::Cursor, 1).map(|_| ())
            }
        });
        for r in results {
            let err = r.unwrap().unwrap_err();
            assert!(matches!(
                err,
                ReadError::Protocol(_) | ReadError::Aborted { .. }
            ));
        }
    }

    #[test]
    fn mismatched_reduce_tags_are_detected() {
        let results = run_in_threads(2, |m| {
            let tag = if m.rank() == 0 {
                ReduceTag::Cursor
            } else {
                ReduceTag::Take { chunk: 2 }
            };
            m.all_reduce_max(tag, 4)
        });
        for r in results {
            assert!(matches!(r.unwrap(), Err(ReadError::Protocol(_))));
        }
    }

    #[test]
    fn abort_releases_blocked_peers() {
        let results = run_in_threads(3, |m| {
            if m.rank() == 2 {
                m.abort();
                return Err(ReadError::Other("local failure".into()));
            }
            m.all_reduce_max(ReduceTag::Cursor, 1).map(|_| ())
        });
        for r in results {
            assert!(r.unwrap().is_err());
        }
    }

    #[test]
    fn dropped_member_disconnects_group() {
        let mut members = thread_group(2);
        let second = members.pop().unwrap();
        drop(second);
        let first = members.pop().unwrap();
        assert!(matches!(
            first.all_reduce_max(ReduceTag::Cursor, 1),
            Err(ReadError::Disconnected { rank: 1 })
        ));
        assert!(matches!(
            first.barrier(),
            Err(ReadError::Aborted { rank: 0 })
        ));
    }
}
