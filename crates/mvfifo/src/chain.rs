//! Record arena threaded by two chains
//!
//! Every record occupies one slot and is linked, by index, into:
//! - the **global chain**: insertion order across all keys (eviction order)
//! - its **key chain**: insertion order within its own key
//!
//! Freed slots go on a free list and are handed out again by the next push.

use std::collections::HashMap;
use std::sync::Arc;
use ahash::RandomState;
use bytes::Bytes;

/// Fixed bookkeeping cost charged per record
pub const RECORD_OVERHEAD: usize = 16;

/// Bytes charged against the ceiling for one record
pub fn footprint(key: &str, value: &[u8]) -> usize {
    key.len() + value.len() + RECORD_OVERHEAD
}

#[derive(Debug, Clone, Copy)]
struct Links {
    prev: Option<usize>,
    next: Option<usize>,
}

struct Record {
    key: Arc<str>,
    cursor: u64,
    value: Bytes,
    global: Links,
    local: Links,
}

/// Ends of one key's chain. Only exists while the key has live records.
#[derive(Debug, Clone, Copy)]
struct KeyChain {
    head: usize,
    tail: usize,
    len: usize,
}

/// Dual-indexed record storage with size accounting
pub(crate) struct Chains {
    slots: Vec<Option<Record>>,
    free_list: Vec<usize>,
    keys: HashMap<Arc<str>, KeyChain, RandomState>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    size: usize,
    max_size: usize,
}

impl Chains {
    pub(crate) fn new(max_size: usize) -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            keys: HashMap::with_hasher(RandomState::new()),
            head: None,
            tail: None,
            len: 0,
            size: 0,
            max_size,
        }
    }

    /// Append a record to the tail of both its key chain and the global chain.
    ///
    /// Does not evict; callers follow up with [`Chains::evict_to_fit`].
    pub(crate) fn push(&mut self, key: &str, cursor: u64, value: Bytes) {
        let (shared, prev_local) = match self.keys.get_key_value(key) {
            Some((shared, chain)) => {
                debug_assert!(
                    self.cursor_at(chain.tail).map_or(true, |last| last < cursor),
                    "cursor {} for key {:?} is not greater than the key's last cursor",
                    cursor,
                    key,
                );
                (Arc::clone(shared), Some(chain.tail))
            }
            None => (Arc::<str>::from(key), None),
        };

        self.size += footprint(key, &value);
        self.len += 1;

        let idx = self.alloc_slot();
        self.slots[idx] = Some(Record {
            key: Arc::clone(&shared),
            cursor,
            value,
            global: Links { prev: self.tail, next: None },
            local: Links { prev: prev_local, next: None },
        });

        match self.tail {
            Some(tail_idx) => {
                if let Some(tail) = &mut self.slots[tail_idx] {
                    tail.global.next = Some(idx);
                }
            }
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);

        match prev_local {
            Some(prev_idx) => {
                if let Some(prev) = &mut self.slots[prev_idx] {
                    prev.local.next = Some(idx);
                }
                if let Some(chain) = self.keys.get_mut(key) {
                    chain.tail = idx;
                    chain.len += 1;
                }
            }
            None => {
                self.keys.insert(shared, KeyChain { head: idx, tail: idx, len: 1 });
            }
        }
    }

    /// Evict from the global head until the size is within the ceiling.
    ///
    /// Returns the number of records evicted.
    pub(crate) fn evict_to_fit(&mut self) -> usize {
        let mut evicted = 0;
        while self.size > self.max_size && self.evict_oldest() {
            evicted += 1;
        }
        evicted
    }

    fn evict_oldest(&mut self) -> bool {
        let Some(idx) = self.head else {
            return false;
        };
        let Some(record) = self.slots[idx].take() else {
            return false;
        };

        self.head = record.global.next;
        match self.head {
            Some(next_idx) => {
                if let Some(next) = &mut self.slots[next_idx] {
                    next.global.prev = None;
                }
            }
            None => self.tail = None,
        }

        // The globally oldest record is also the oldest of its key.
        debug_assert!(record.local.prev.is_none());
        let drained = match self.keys.get_mut(&*record.key) {
            Some(chain) if chain.len > 1 => {
                if let Some(next_idx) = record.local.next {
                    chain.head = next_idx;
                    if let Some(next) = &mut self.slots[next_idx] {
                        next.local.prev = None;
                    }
                }
                chain.len -= 1;
                false
            }
            _ => true,
        };
        if drained {
            self.keys.remove(&*record.key);
        }

        self.len -= 1;
        self.size -= footprint(&record.key, &record.value);
        self.free_list.push(idx);
        true
    }

    fn alloc_slot(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            let idx = self.slots.len();
            self.slots.push(None);
            idx
        }
    }

    pub(crate) fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
    }

    pub(crate) fn max_size(&self) -> usize {
        self.max_size
    }

    pub(crate) fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn contains_key(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    /// Oldest record overall
    pub(crate) fn first(&self) -> Option<(u64, &Bytes)> {
        self.head.and_then(|idx| self.entry(idx)).map(|(cursor, value, _)| (cursor, value))
    }

    /// Newest record overall
    pub(crate) fn last(&self) -> Option<(u64, &Bytes)> {
        self.tail.and_then(|idx| self.entry(idx)).map(|(cursor, value, _)| (cursor, value))
    }

    /// Slot of the oldest record for `key`
    pub(crate) fn key_head(&self, key: &str) -> Option<usize> {
        self.keys.get(key).map(|chain| chain.head)
    }

    /// Slot to start a forward scan from for records of `key` with a cursor
    /// greater than `cursor`.
    ///
    /// Walks backward from the key's tail while cursors are greater, stopping on
    /// the first record at or below `cursor`; falls back to the key's head when
    /// every record qualifies. The returned slot itself may not qualify.
    pub(crate) fn seek_after(&self, key: &str, cursor: u64) -> Option<usize> {
        let chain = self.keys.get(key)?;
        let mut at = Some(chain.tail);
        while let Some(idx) = at {
            let record = self.slots[idx].as_ref()?;
            if record.cursor <= cursor {
                break;
            }
            at = record.local.prev;
        }
        Some(at.unwrap_or(chain.head))
    }

    /// Cursor, value and next slot in the same key chain
    pub(crate) fn entry(&self, idx: usize) -> Option<(u64, &Bytes, Option<usize>)> {
        self.slots
            .get(idx)?
            .as_ref()
            .map(|record| (record.cursor, &record.value, record.local.next))
    }

    fn cursor_at(&self, idx: usize) -> Option<u64> {
        self.entry(idx).map(|(cursor, _, _)| cursor)
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(chains: &Chains, key: &str) -> Vec<u64> {
        let mut out = Vec::new();
        let mut at = chains.key_head(key);
        while let Some(idx) = at {
            let (cursor, _, next) = chains.entry(idx).unwrap();
            out.push(cursor);
            at = next;
        }
        out
    }

    #[test]
    fn test_push_links_both_chains() {
        let mut chains = Chains::new(usize::MAX);

        chains.push("a", 1, Bytes::from_static(b"a1"));
        chains.push("b", 1, Bytes::from_static(b"b1"));
        chains.push("a", 2, Bytes::from_static(b"a2"));

        assert_eq!(chains.len(), 3);
        assert_eq!(chains.key_count(), 2);
        assert_eq!(collect(&chains, "a"), vec![1, 2]);
        assert_eq!(collect(&chains, "b"), vec![1]);
        assert_eq!(chains.first().map(|(_, v)| v.clone()), Some(Bytes::from_static(b"a1")));
        assert_eq!(chains.last().map(|(_, v)| v.clone()), Some(Bytes::from_static(b"a2")));
        assert_eq!(chains.size(), 3 * (1 + 2 + RECORD_OVERHEAD));
    }

    #[test]
    fn test_evict_oldest_across_keys() {
        let per_record = footprint("a", b"xx");
        let mut chains = Chains::new(2 * per_record);

        chains.push("a", 1, Bytes::from_static(b"xx"));
        chains.push("b", 1, Bytes::from_static(b"xx"));
        chains.push("a", 2, Bytes::from_static(b"xx"));
        assert_eq!(chains.evict_to_fit(), 1);

        // a:1 was oldest overall
        assert_eq!(collect(&chains, "a"), vec![2]);
        assert_eq!(collect(&chains, "b"), vec![1]);

        chains.push("a", 3, Bytes::from_static(b"xx"));
        assert_eq!(chains.evict_to_fit(), 1);

        // b drained entirely, so the key is gone
        assert!(!chains.contains_key("b"));
        assert_eq!(collect(&chains, "a"), vec![2, 3]);
        assert_eq!(chains.size(), 2 * per_record);
    }

    #[test]
    fn test_oversized_record_drains_everything() {
        let mut chains = Chains::new(10);

        chains.push("k", 1, Bytes::from(vec![0u8; 64]));
        assert_eq!(chains.evict_to_fit(), 1);

        assert_eq!(chains.len(), 0);
        assert_eq!(chains.size(), 0);
        assert_eq!(chains.key_count(), 0);
        assert!(chains.first().is_none());
        assert!(chains.last().is_none());
    }

    #[test]
    fn test_slots_are_reused() {
        let per_record = footprint("k", b"v");
        let mut chains = Chains::new(2 * per_record);

        for cursor in 1..=100 {
            chains.push("k", cursor, Bytes::from_static(b"v"));
            chains.evict_to_fit();
        }

        assert_eq!(chains.len(), 2);
        assert!(chains.slot_count() <= 3);
        assert_eq!(collect(&chains, "k"), vec![99, 100]);
    }

    #[test]
    fn test_seek_after() {
        let mut chains = Chains::new(usize::MAX);
        for cursor in [10, 20, 30, 40] {
            chains.push("k", cursor, Bytes::new());
        }

        let cursor_at = |idx: Option<usize>| idx.and_then(|i| chains.entry(i)).map(|(c, _, _)| c);

        assert_eq!(cursor_at(chains.seek_after("k", 25)), Some(20));
        assert_eq!(cursor_at(chains.seek_after("k", 40)), Some(40));
        assert_eq!(cursor_at(chains.seek_after("k", 5)), Some(10));
        assert_eq!(chains.seek_after("missing", 5), None);
    }

    #[test]
    fn test_shrink_ceiling() {
        let per_record = footprint("k", b"v");
        let mut chains = Chains::new(usize::MAX);
        for cursor in 1..=5 {
            chains.push("k", cursor, Bytes::from_static(b"v"));
        }

        chains.set_max_size(2 * per_record);
        assert_eq!(chains.evict_to_fit(), 3);
        assert_eq!(collect(&chains, "k"), vec![4, 5]);

        chains.set_max_size(0);
        assert_eq!(chains.evict_to_fit(), 2);
        assert_eq!(chains.len(), 0);
        assert_eq!(chains.key_count(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "is not greater than")]
    fn test_non_monotonic_cursor_asserts() {
        let mut chains = Chains::new(usize::MAX);
        chains.push("k", 2, Bytes::new());
        chains.push("k", 2, Bytes::new());
    }
}
