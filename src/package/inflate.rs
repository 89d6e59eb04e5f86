use crate::error::{Result, VfsError};
use crate::stream::ByteStream;
use flate2::{Decompress, DecompressError, FlushDecompress, Status};
use tracing::trace;

/// Bounded streaming inflater
///
/// Pulls compressed bytes from a stream through a fixed scratch chunk and
/// inflates them into a caller buffer. The caller's declared length is
/// authoritative: decoding stops there even if the zlib stream continues,
/// so payloads packed back-to-back never bleed into each other.
pub struct Inflater {
    state: Decompress,
    chunk: Vec<u8>,
}

impl Inflater {
    /// Create an inflater with a scratch chunk of `chunk_size` bytes
    pub fn new(chunk_size: usize) -> Self {
        Self {
            state: Decompress::new(true),
            chunk: vec![0u8; chunk_size.max(1)],
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk.len()
    }

    /// Inflate from the current stream position into `output[..declared_length]`
    ///
    /// Returns the number of bytes produced, which is less than
    /// `declared_length` only if the zlib stream or the source ended first.
    pub fn inflate<S: ByteStream>(
        &mut self,
        source: &mut S,
        output: &mut [u8],
        declared_length: u64,
    ) -> Result<u64> {
        if declared_length > output.len() as u64 {
            return Err(VfsError::BufferSize {
                expected: declared_length,
                actual: output.len() as u64,
            });
        }

        self.state.reset(true);
        let result = self.run(source, &mut output[..declared_length as usize]);
        self.state.reset(true);
        result
    }

    fn run<S: ByteStream>(&mut self, source: &mut S, output: &mut [u8]) -> Result<u64> {
        let chunk_size = self.chunk.len();
        let declared = output.len();
        let mut written = 0usize;

        while written < declared {
            let available = source.read_bulk(&mut self.chunk)?;
            if available == 0 {
                trace!("Source exhausted after {} of {} bytes", written, declared);
                break;
            }

            let mut consumed = 0usize;
            loop {
                let window_end = declared.min(written + chunk_size);
                let window = window_end - written;

                let in_before = self.state.total_in();
                let out_before = self.state.total_out();
                let status = self
                    .state
                    .decompress(
                        &self.chunk[consumed..available],
                        &mut output[written..window_end],
                        FlushDecompress::None,
                    )
                    .map_err(corrupt)?;
                let used = (self.state.total_in() - in_before) as usize;
                let produced = (self.state.total_out() - out_before) as usize;
                consumed += used;
                written += produced;

                if status == Status::StreamEnd || written == declared {
                    return Ok(written as u64);
                }

                // Window not filled: the codec wants more input
                if produced < window && consumed == available {
                    break;
                }
                if produced == 0 && used == 0 {
                    break;
                }
            }
        }

        Ok(written as u64)
    }
}

fn corrupt(err: DecompressError) -> VfsError {
    match err.needs_dictionary() {
        Some(id) => VfsError::CorruptData(format!("stream requires preset dictionary {:08x}", id)),
        None => VfsError::CorruptData(err.to_string()),
    }
}
