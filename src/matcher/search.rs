//! Substring search with a Boyer-Moore-Horspool shift table

/// Precomputed search for one needle.
#[derive(Debug, Clone)]
pub(crate) struct Finder {
    needle: Vec<u8>,
    bad_char_table: [usize; 256],
}

impl Finder {
    pub(crate) fn new(needle: &[u8]) -> Self {
        let mut bad_char_table = [needle.len().max(1); 256];
        for (i, &byte) in needle.iter().enumerate().take(needle.len().saturating_sub(1)) {
            bad_char_table[byte as usize] = needle.len() - 1 - i;
        }

        Self {
            needle: needle.to_vec(),
            bad_char_table,
        }
    }

    /// Offset of the first occurrence of the needle. An empty needle is found at 0.
    pub(crate) fn find(&self, haystack: &[u8]) -> Option<usize> {
        let len = self.needle.len();
        if len == 0 {
            return Some(0);
        }
        if haystack.len() < len {
            return None;
        }

        let mut pos = 0;
        while pos + len <= haystack.len() {
            if haystack[pos..pos + len] == self.needle[..] {
                return Some(pos);
            }

            let shift_char = haystack[pos + len - 1];
            pos += self.bad_char_table[shift_char as usize];
        }

        None
    }
}
