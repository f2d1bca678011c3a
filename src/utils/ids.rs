//! Process-unique ids of sessions and surfaces
//!
//! Ids only serve diagnostics. A live id is never shared by two objects, but
//! the id of a dropped object goes back to its pool and is handed out again.

use std::{collections::BTreeSet, fmt, sync::Mutex};

#[derive(Debug)]
struct PoolState {
    next: usize,
    released: BTreeSet<usize>,
}

/// Pool of ids for one kind of object
#[derive(Debug)]
pub(crate) struct UidPool {
    state: Mutex<PoolState>,
}

impl UidPool {
    pub(crate) const fn new() -> UidPool {
        UidPool {
            state: Mutex::new(PoolState {
                next: 0,
                released: BTreeSet::new(),
            }),
        }
    }

    /// Take the lowest free id
    pub(crate) fn acquire(&'static self) -> Uid {
        let mut state = self.state.lock().unwrap();
        let id = match state.released.pop_first() {
            Some(id) => id,
            None => {
                let id = state.next;
                state.next = id.checked_add(1).expect("Out of ids");
                id
            }
        };
        Uid { pool: self, id }
    }

    fn release(&self, id: usize) {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        if id + 1 == state.next {
            state.next = id;
            // shrink back over the tail of released ids
            while state.next > 0 && state.released.remove(&(state.next - 1)) {
                state.next -= 1;
            }
        } else {
            state.released.insert(id);
        }
    }
}

/// An id taken from a [`UidPool`], given back when dropped
pub(crate) struct Uid {
    pool: &'static UidPool,
    id: usize,
}

impl Uid {
    #[inline]
    pub(crate) fn get(&self) -> usize {
        self.id
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.id, f)
    }
}

impl Drop for Uid {
    fn drop(&mut self) {
        self.pool.release(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_ids_are_unique() {
        static POOL: UidPool = UidPool::new();
        let a = POOL.acquire();
        let b = POOL.acquire();
        assert_eq!((a.get(), b.get()), (0, 1));
    }

    #[test]
    fn released_ids_are_reused_lowest_first() {
        static POOL: UidPool = UidPool::new();
        let ids: Vec<_> = (0..4).map(|_| POOL.acquire()).collect();
        let mut ids = ids.into_iter();
        let (zero, one, two, three) = (
            ids.next().unwrap(),
            ids.next().unwrap(),
            ids.next().unwrap(),
            ids.next().unwrap(),
        );

        drop(two);
        drop(zero);
        assert_eq!(POOL.acquire().get(), 0);
        // the id above was dropped right away
        assert_eq!(POOL.acquire().get(), 0);

        drop(three);
        drop(one);
        let state = POOL.state.lock().unwrap();
        assert_eq!(state.next, 0);
        assert!(state.released.is_empty());
    }
}
