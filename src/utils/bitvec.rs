//! Fixed-size bit vector used as the collector's mark set.

pub const fn bit_vector_array_length(num_bits: usize) -> usize {
    (num_bits + 31) / 32
}

#[derive(Clone)]
pub struct BitVector {
    words: Vec<u32>,
    num_bits: usize,
}

impl BitVector {
    pub fn new(num_bits: usize) -> Self {
        Self {
            words: vec![0; bit_vector_array_length(num_bits)],
            num_bits,
        }
    }

    pub fn get(&self, index: usize) -> bool {
        debug_assert!(index < self.num_bits);
        self.words[index >> 5] & (1 << (index & 31)) != 0
    }

    /// Sets the bit and returns its previous value.
    pub fn test_and_set(&mut self, index: usize) -> bool {
        debug_assert!(index < self.num_bits);
        let word = &mut self.words[index >> 5];
        let mask = 1 << (index & 31);
        let old = *word & mask != 0;
        *word |= mask;
        old
    }

    pub fn clear_all(&mut self) {
        for word in self.words.iter_mut() {
            *word = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear_across_word_boundaries() {
        let mut bits = BitVector::new(70);
        for index in [0, 31, 32, 69] {
            assert!(!bits.test_and_set(index));
        }
        assert!(bits.test_and_set(32));
        assert!(bits.get(31) && bits.get(69));
        assert!(!bits.get(30) && !bits.get(33));

        bits.clear_all();
        assert!((0..70).all(|index| !bits.get(index)));
    }
}
