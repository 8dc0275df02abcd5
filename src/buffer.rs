/// Number of samples in a capture, one per display column.
pub const SAMPLE_COUNT: usize = 128;

/// Fixed-size capture buffer of 6-bit samples with a wrapping write index.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    data: [u8; SAMPLE_COUNT],
    index: u8,
}

impl SampleBuffer {
    pub fn new() -> SampleBuffer {
        SampleBuffer { data: [0; SAMPLE_COUNT], index: 0 }
    }

    pub fn data(&self) -> &[u8; SAMPLE_COUNT] {
        &self.data
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Store a sample at the write index and advance it. Returns `true` if the index wrapped,
    /// i.e. the buffer has just been filled.
    pub fn push(&mut self, sample: u8) -> bool {
        self.data[self.index as usize] = sample;
        self.index += 1;
        if self.index as usize == SAMPLE_COUNT {
            self.index = 0;
            true
        } else {
            false
        }
    }

    pub fn rewind(&mut self) {
        self.index = 0;
    }

    /// Overwrite every sample with `value`, producing a flat trace.
    pub fn fill(&mut self, value: u8) {
        self.data = [value; SAMPLE_COUNT];
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new()
    }
}
