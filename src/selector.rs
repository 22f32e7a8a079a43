//! Cyclic selection of (current, next) texture pairs out of a fixed pool.

use log::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectorState {
    pub index: usize,
    pub is_first_selection: bool,
}

impl SelectorState {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            is_first_selection: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TexturePair {
    pub a: usize,
    pub b: usize,
}

/// Picks the pair for `state` out of a pool of `pool_len` slots.
///
/// The first selection reads the pair at the stored index without moving it;
/// every later selection advances the index by one. Clearing
/// `is_first_selection` is left to the caller.
pub fn select(state: SelectorState, pool_len: usize) -> (SelectorState, TexturePair) {
    let n = pool_len.max(1);
    let index = if state.is_first_selection {
        state.index % n
    } else {
        (state.index + 1) % n
    };
    let pair = TexturePair {
        a: index % n,
        b: (index + 1) % n,
    };
    let next = SelectorState {
        index,
        is_first_selection: state.is_first_selection,
    };
    (next, pair)
}

#[derive(Debug)]
pub enum TextureSlot<T> {
    Pending,
    Loaded(T),
    Failed,
}

/// Fixed, ordered pool. Slots that never loaded resolve to a placeholder.
#[derive(Debug)]
pub struct TexturePool<T> {
    slots: Vec<TextureSlot<T>>,
}

impl<T> TexturePool<T> {
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| TextureSlot::Pending).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn insert(&mut self, index: usize, texture: T) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = TextureSlot::Loaded(texture);
        }
    }

    /// Marks a slot as failed. Returns `true` the first time a slot fails so
    /// the failure is reported once.
    pub fn mark_failed(&mut self, index: usize, reason: &dyn std::fmt::Display) -> bool {
        match self.slots.get_mut(index) {
            Some(slot @ TextureSlot::Pending) => {
                warn!("texture slot {index} failed to load, rendering with placeholder: {reason}");
                *slot = TextureSlot::Failed;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        match self.slots.get(index % self.slots.len().max(1)) {
            Some(TextureSlot::Loaded(texture)) => Some(texture),
            _ => None,
        }
    }

    pub fn get_or<'a>(&'a self, index: Option<usize>, placeholder: &'a T) -> &'a T {
        index.and_then(|i| self.get(i)).unwrap_or(placeholder)
    }

    pub fn slot(&self, index: usize) -> Option<&TextureSlot<T>> {
        self.slots.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POOL: usize = 6;

    #[test]
    fn test_first_selection_reads_without_advancing() {
        let state = SelectorState::new(1);
        let (next, pair) = select(state, POOL);
        assert_eq!(pair, TexturePair { a: 1, b: 2 });
        assert_eq!(next, state);
    }

    #[test]
    fn test_later_selection_advances() {
        let state = SelectorState { index: 1, is_first_selection: false };
        let (next, pair) = select(state, POOL);
        assert_eq!(pair, TexturePair { a: 2, b: 3 });
        assert_eq!(next, SelectorState { index: 2, is_first_selection: false });
    }

    #[test]
    fn test_pair_wraps_around_pool_end() {
        let state = SelectorState { index: 4, is_first_selection: false };
        let (next, pair) = select(state, POOL);
        assert_eq!(pair, TexturePair { a: 5, b: 0 });
        let (_, pair) = select(next, POOL);
        assert_eq!(pair, TexturePair { a: 0, b: 1 });
    }

    #[test]
    fn test_six_selections_cycle_back() {
        let start = SelectorState { index: 1, is_first_selection: false };
        let mut state = start;
        for _ in 0..POOL {
            state = select(state, POOL).0;
            assert!(state.index < POOL);
        }
        assert_eq!(state, start);
    }

    #[test]
    fn test_out_of_range_index_is_reduced() {
        let (next, pair) = select(SelectorState::new(13), POOL);
        assert_eq!(next.index, 1);
        assert_eq!(pair, TexturePair { a: 1, b: 2 });
    }

    #[test]
    fn test_failed_slot_still_selectable() {
        let mut pool = TexturePool::new(POOL);
        for (i, name) in ["A1", "A2", "B1", "B2", "C1", "C2"].into_iter().enumerate() {
            if i != 3 {
                pool.insert(i, name);
            }
        }
        assert!(pool.mark_failed(3, &"not found"));
        assert!(!pool.mark_failed(3, &"not found"));

        let (_, pair) = select(SelectorState { index: 2, is_first_selection: false }, pool.len());
        assert_eq!(pair, TexturePair { a: 3, b: 4 });
        assert_eq!(*pool.get_or(Some(pair.a), &"placeholder"), "placeholder");
        assert_eq!(*pool.get_or(Some(pair.b), &"placeholder"), "C1");
        assert!(matches!(pool.slot(3), Some(TextureSlot::Failed)));
    }

    #[test]
    fn test_unset_uniform_resolves_to_placeholder() {
        let pool: TexturePool<&str> = TexturePool::new(POOL);
        assert_eq!(*pool.get_or(None, &"placeholder"), "placeholder");
        assert_eq!(*pool.get_or(Some(0), &"placeholder"), "placeholder");
    }
}
