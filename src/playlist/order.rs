use rand::{rng, seq::SliceRandom};

/// The derived playable order plus an optional shuffled permutation of it.
///
/// Navigation always walks `order()`: the shuffled permutation when shuffle
/// is active, the derived sequence otherwise.
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    base: Vec<usize>,
    shuffled: Option<Vec<usize>>,
}

impl Playlist {
    pub fn new(base: Vec<usize>) -> Self {
        Self {
            base,
            shuffled: None,
        }
    }

    pub fn order(&self) -> &[usize] {
        self.shuffled.as_deref().unwrap_or(&self.base)
    }

    /// The derived (filtered, optionally sorted) sequence, ignoring shuffle.
    pub fn base(&self) -> &[usize] {
        &self.base
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffled.is_some()
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.base.contains(&index)
    }

    pub fn first(&self) -> Option<usize> {
        self.order().first().copied()
    }

    /// Draw a fresh Fisher-Yates permutation of the derived sequence.
    pub fn shuffle(&mut self) {
        let mut order = self.base.clone();
        order.shuffle(&mut rng());
        self.shuffled = Some(order);
    }

    pub fn unshuffle(&mut self) {
        self.shuffled = None;
    }

    /// Replace the derived sequence after a catalog, filter or query change.
    ///
    /// An active shuffle keeps the relative order of surviving entries; new
    /// entries are appended in derived order.
    pub fn refresh(&mut self, base: Vec<usize>) {
        if let Some(old) = self.shuffled.take() {
            let mut order = base.clone();
            order.sort_by_key(|i| old.iter().position(|o| o == i).unwrap_or(usize::MAX));
            self.shuffled = Some(order);
        }
        self.base = base;
    }

    /// Entry after `current` in `order()`, wrapping to the first. A `current`
    /// outside the playlist yields the first entry.
    pub fn next_after(&self, current: usize) -> Option<usize> {
        let order = self.order();
        if order.is_empty() {
            return None;
        }

        match order.iter().position(|&i| i == current) {
            Some(p) => Some(order[(p + 1) % order.len()]),
            None => Some(order[0]),
        }
    }

    /// Entry before `current` in `order()`, wrapping to the last. A `current`
    /// outside the playlist yields the last entry.
    pub fn prev_before(&self, current: usize) -> Option<usize> {
        let order = self.order();
        if order.is_empty() {
            return None;
        }

        match order.iter().position(|&i| i == current) {
            Some(0) | None => Some(order[order.len() - 1]),
            Some(p) => Some(order[p - 1]),
        }
    }
}
