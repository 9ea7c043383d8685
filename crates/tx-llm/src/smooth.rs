//! Word-level re-chunking of streamed text.

/// Buffers deltas and releases them one word at a time: a run of
/// non-whitespace followed by its trailing whitespace.
#[derive(Debug, Default)]
pub struct WordSmoother {
    buffer: String,
}

impl WordSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a delta and drain every complete word.
    pub fn push(&mut self, delta: &str) -> Vec<String> {
        self.buffer.push_str(delta);
        let mut words = Vec::new();
        while let Some(end) = word_end(&self.buffer) {
            words.push(self.buffer.drain(..end).collect());
        }
        words
    }

    /// Release whatever is left.
    pub fn flush(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }
}

/// End of the first `\S+\s+` match, counted from the start of `s`.
fn word_end(s: &str) -> Option<usize> {
    let mut seen_word = false;
    let mut trailing_space = false;
    for (i, c) in s.char_indices() {
        if c.is_whitespace() {
            trailing_space |= seen_word;
        } else if trailing_space {
            return Some(i);
        } else {
            seen_word = true;
        }
    }
    trailing_space.then_some(s.len())
}
