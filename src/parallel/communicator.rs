use crate::error::Error;

use std::any::Any;
use std::sync::{Arc, Barrier, Mutex, MutexGuard};

/// The collective operations a group of processes has to provide for writing
/// pieces in parallel.
///
/// Every member of the group has to call the same collectives in the same
/// order. A member that never arrives blocks all others forever. Both
/// collectives synchronize the group: no member returns from one before every
/// member has entered it.
pub trait Communicator {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    /// Collect one value from every member on `root`, in rank order. All other
    /// members receive `None`.
    fn gather<T: Clone + Send + 'static>(&self, value: T, root: usize) -> Result<Option<Vec<T>>, Error>;

    /// Distribute the value given on `root` to all members. The argument is
    /// ignored on every other member.
    fn broadcast<T: Clone + Send + 'static>(&self, value: Option<T>, root: usize) -> Result<T, Error>;
}

/// A group consisting of the calling process alone
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialCommunicator;

impl Communicator for SerialCommunicator {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn gather<T: Clone + Send + 'static>(&self, value: T, _root: usize) -> Result<Option<Vec<T>>, Error> {
        Ok(Some(vec![value]))
    }

    fn broadcast<T: Clone + Send + 'static>(&self, value: Option<T>, root: usize) -> Result<T, Error> {
        value.ok_or_else(|| Error::Communication(format!("rank {} did not provide a value to broadcast", root)))
    }
}

type Slot = Option<Box<dyn Any + Send>>;

#[derive(Debug)]
struct Shared {
    size: usize,
    barrier: Barrier,
    slots: Mutex<Vec<Slot>>,
}

/// A group of threads within one process, mostly useful for tests and
/// thread based drivers. Each member owns one handle and runs on its own
/// thread.
///
/// ```
/// use gridformat::{Communicator, LocalCommunicator};
///
/// let handles: Vec<_> = LocalCommunicator::group(3)
///     .into_iter()
///     .map(|comm| std::thread::spawn(move || comm.gather(comm.rank() * 10, 0).unwrap()))
///     .collect();
///
/// let gathered: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
/// assert_eq!(gathered[0], Some(vec![0, 10, 20]));
/// assert_eq!(gathered[1], None);
/// ```
#[derive(Debug, Clone)]
pub struct LocalCommunicator {
    rank: usize,
    shared: Arc<Shared>,
}

impl LocalCommunicator {
    /// Create the handles of a group of `size` members, in rank order
    pub fn group(size: usize) -> Vec<Self> {
        let size = size.max(1);
        let shared = Arc::new(Shared {
            size,
            barrier: Barrier::new(size),
            slots: Mutex::new((0..size).map(|_| None).collect()),
        });

        (0..size)
            .map(|rank| Self {
                rank,
                shared: Arc::clone(&shared),
            })
            .collect()
    }

    fn slots(&self) -> Result<MutexGuard<'_, Vec<Slot>>, Error> {
        self.shared
            .slots
            .lock()
            .map_err(|_| Error::Communication("a group member panicked during a collective".into()))
    }

    fn check_root(&self, root: usize) -> Result<(), Error> {
        if root >= self.shared.size {
            return Err(Error::Communication(format!(
                "root rank {} is outside of a group of {}",
                root, self.shared.size
            )));
        }
        Ok(())
    }
}

fn downcast<T: Clone + 'static>(slot: &Slot, rank: usize) -> Result<T, Error> {
    slot.as_ref()
        .and_then(|value| value.downcast_ref::<T>())
        .cloned()
        .ok_or_else(|| Error::Communication(format!("rank {} provided no value of the expected type", rank)))
}

impl Communicator for LocalCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn gather<T: Clone + Send + 'static>(&self, value: T, root: usize) -> Result<Option<Vec<T>>, Error> {
        self.check_root(root)?;
        let stored = self.slots().map(|mut slots| slots[self.rank] = Some(Box::new(value)));
        self.shared.barrier.wait();

        // every member has to pass the second barrier, even on failure
        let result = match (stored, self.rank == root) {
            (Err(e), _) => Err(e),
            (Ok(()), false) => Ok(None),
            (Ok(()), true) => self.slots().and_then(|mut slots| {
                slots
                    .iter_mut()
                    .enumerate()
                    .map(|(rank, slot)| {
                        let value = downcast::<T>(slot, rank);
                        *slot = None;
                        value
                    })
                    .collect::<Result<Vec<T>, Error>>()
                    .map(Some)
            }),
        };
        self.shared.barrier.wait();

        tracing::trace!(rank = self.rank, root, "gather");
        result
    }

    fn broadcast<T: Clone + Send + 'static>(&self, value: Option<T>, root: usize) -> Result<T, Error> {
        self.check_root(root)?;
        let stored = if self.rank == root {
            self.slots().map(|mut slots| slots[root] = value.map(|v| Box::new(v) as Box<dyn Any + Send>))
        } else {
            Ok(())
        };
        self.shared.barrier.wait();

        let result = stored.and_then(|()| self.slots().and_then(|slots| downcast::<T>(&slots[root], root)));
        self.shared.barrier.wait();

        if self.rank == root {
            if let Ok(mut slots) = self.slots() {
                slots[root] = None;
            }
        }

        tracing::trace!(rank = self.rank, root, "broadcast");
        result
    }
}
