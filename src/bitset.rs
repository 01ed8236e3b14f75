//! Word-packed bit vector.
//!
//! Used for set-branch membership (bit `i` = dimension code `i`) and for the
//! per-path dimension masks threaded through build and trace.

/// Bit vector backed by `u64` words
#[derive(Debug, Clone, Default)]
pub struct Bitset {
    words: Vec<u64>,
}

impl Bitset {
    /// Create an empty bitset able to hold `bits` bits without growing
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            words: vec![0; bits.div_ceil(64)],
        }
    }

    /// Create a bitset from code values. Negative codes are ignored.
    pub fn from_codes(bits: usize, codes: impl IntoIterator<Item = i64>) -> Self {
        let mut set = Self::with_capacity(bits);
        for code in codes {
            if let Ok(idx) = usize::try_from(code) {
                set.insert(idx);
            }
        }
        set
    }

    /// Set bit at index
    pub fn insert(&mut self, idx: usize) {
        let word_idx = idx / 64;
        let bit_idx = idx % 64;

        while self.words.len() <= word_idx {
            self.words.push(0);
        }

        self.words[word_idx] |= 1u64 << bit_idx;
    }

    /// Copy of this bitset with one more bit set
    pub fn with(&self, idx: usize) -> Self {
        let mut copy = self.clone();
        copy.insert(idx);
        copy
    }

    /// Get bit at index
    #[inline]
    pub fn contains(&self, idx: usize) -> bool {
        let word_idx = idx / 64;
        if word_idx >= self.words.len() {
            return false;
        }
        let bit_idx = idx % 64;
        (self.words[word_idx] >> bit_idx) & 1 == 1
    }

    /// Membership test for a dimension code; negative codes are never members
    #[inline]
    pub fn contains_code(&self, code: i64) -> bool {
        usize::try_from(code).is_ok_and(|idx| self.contains(idx))
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Indices of set bits in ascending order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words
            .iter()
            .enumerate()
            .flat_map(|(word_idx, &word)| {
                (0..64)
                    .filter(move |bit_idx| (word >> bit_idx) & 1 == 1)
                    .map(move |bit_idx| word_idx * 64 + bit_idx)
            })
    }
}

impl PartialEq for Bitset {
    fn eq(&self, other: &Self) -> bool {
        let (short, long) = if self.words.len() <= other.words.len() {
            (&self.words, &other.words)
        } else {
            (&other.words, &self.words)
        };
        short.iter().zip(long.iter()).all(|(a, b)| a == b)
            && long[short.len()..].iter().all(|&w| w == 0)
    }
}

impl Eq for Bitset {}
