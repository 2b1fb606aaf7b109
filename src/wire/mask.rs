//! Presence masks
//!
//! One bit per field, packed into 32-bit words. Field `i` lives in word
//! `i / 32`, bit `i % 32`.

/// Fields covered by one mask word
pub const GROUP_BITS: usize = 32;

/// Number of mask words needed for `field_count` fields
pub const fn words_for(field_count: usize) -> usize {
    field_count.div_ceil(GROUP_BITS)
}

/// Field-presence bitmap for one message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceMask {
    words: Vec<u32>,
}

impl PresenceMask {
    /// A cleared mask of `words` words
    pub fn new(words: usize) -> Self {
        Self {
            words: vec![0; words],
        }
    }

    /// A cleared mask wide enough for `field_count` fields
    pub fn for_fields(field_count: usize) -> Self {
        Self::new(words_for(field_count))
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub fn words_mut(&mut self) -> &mut [u32] {
        &mut self.words
    }

    /// Mark field `index` present.
    ///
    /// # Panics
    /// If `index` is beyond the mask width.
    pub fn set(&mut self, index: usize) {
        self.words[index / GROUP_BITS] |= 1 << (index % GROUP_BITS);
    }

    /// Mark field `index` present when `present` holds
    #[inline]
    pub fn set_if(&mut self, index: usize, present: bool) {
        if present {
            self.set(index);
        }
    }

    /// Whether field `index` is present; out-of-range indexes are absent
    #[inline]
    pub fn is_set(&self, index: usize) -> bool {
        self.words
            .get(index / GROUP_BITS)
            .is_some_and(|w| w & (1 << (index % GROUP_BITS)) != 0)
    }

    /// Zero every word, keeping the width
    pub fn clear(&mut self) {
        self.words.iter_mut().for_each(|w| *w = 0);
    }

    /// True when no field is present
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Number of present fields
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}
