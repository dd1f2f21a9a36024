/// Fixed-capacity first-in-first-out queue of SPI data words
///
/// Backed by a ring buffer, so pushing and popping never move data.
#[derive(Clone, Debug)]
pub struct Fifo<const N: usize> {
    buffer: [u8; N],
    head: usize,
    len: usize,
}

impl<const N: usize> Fifo<N> {
    /// An empty FIFO
    pub const fn new() -> Self {
        Fifo {
            buffer: [0; N],
            head: 0,
            len: 0,
        }
    }

    /// Number of words the FIFO can hold
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of words currently held
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no words are held
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the FIFO is at capacity
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Append a word
    ///
    /// A full FIFO keeps its contents and hands `word` back.
    pub fn push(&mut self, word: u8) -> Result<(), u8> {
        if self.is_full() {
            return Err(word);
        }

        let tail = (self.head + self.len) % N;
        self.buffer[tail] = word;
        self.len += 1;

        Ok(())
    }

    /// Remove the oldest word
    pub fn pop(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }

        let word = self.buffer[self.head];
        self.head = (self.head + 1) % N;
        self.len -= 1;

        Some(word)
    }

    /// The oldest word, left in place
    pub fn peek(&self) -> Option<u8> {
        if self.is_empty() {
            None
        } else {
            Some(self.buffer[self.head])
        }
    }

    /// Drop every word
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}

impl<const N: usize> Default for Fifo<N> {
    fn default() -> Self {
        Self::new()
    }
}
