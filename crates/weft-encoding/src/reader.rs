//! A byte source decoded into text, with a bounded rewind buffer.
//!
//! The first [`SNIFFING_LIMIT`] bytes are read up front, handed to the
//! resolver and kept. As long as nothing beyond them has been decoded the
//! reader can start over with another encoding; the first read past them
//! passes the boundary and drops the buffer.

use std::io::{ErrorKind, Read};

use encoding_rs::Encoding;
use weft_common::{Position, Reporter, Stage};

use crate::decoder::{ByteDecoder, MalformedSequence};
use crate::error::{EncodingError, Result};
use crate::prescan::SNIFFING_LIMIT;
use crate::registry::Confidence;
use crate::resolver::{EncodingSource, Resolution, ResolverOptions, resolve};

const CHUNK_SIZE: usize = 4096;

/// Decodes a [`Read`] source into `String` chunks.
#[allow(clippy::struct_excessive_bools)]
pub struct StreamingReader<R> {
    source: R,
    reporter: Reporter,
    resolution: Resolution,
    decoder: ByteDecoder,
    /// The rewind buffer. Emptied once the boundary is passed.
    prefix: Vec<u8>,
    prefix_decoded: bool,
    boundary_passed: bool,
    rewindable: bool,
    finished: bool,
    seen_non_ascii: bool,
    line: u32,
    column: u32,
    last_was_cr: bool,
}

impl<R> std::fmt::Debug for StreamingReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingReader")
            .field("resolution", &self.resolution)
            .field("buffered", &self.prefix.len())
            .field("boundary_passed", &self.boundary_passed)
            .field("rewindable", &self.rewindable)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl<R: Read> StreamingReader<R> {
    /// Read the sniffing window from `source` and resolve the encoding.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::Io`] if the source fails.
    pub fn new(mut source: R, options: ResolverOptions, reporter: Reporter) -> Result<Self> {
        let (prefix, complete) = fill_prefix(&mut source)?;
        let resolution = resolve(&prefix, complete, options, &reporter);
        log::debug!(
            "resolved {} ({}, {}) from {} buffered bytes",
            resolution.encoding.name(),
            resolution.confidence,
            resolution.source,
            prefix.len()
        );
        Ok(Self::from_parts(source, prefix, resolution, reporter))
    }

    /// Decode `source` with a fixed encoding. No sniffing happens and the
    /// reader never rewinds.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::Io`] if the source fails.
    pub fn with_encoding(
        mut source: R,
        encoding: &'static Encoding,
        reporter: Reporter,
    ) -> Result<Self> {
        let (prefix, _) = fill_prefix(&mut source)?;
        let resolution = Resolution {
            encoding,
            confidence: Confidence::Certain,
            source: EncodingSource::External,
            swallow_bom: true,
        };
        let mut reader = Self::from_parts(source, prefix, resolution, reporter);
        reader.rewindable = false;
        Ok(reader)
    }

    fn from_parts(source: R, prefix: Vec<u8>, resolution: Resolution, reporter: Reporter) -> Self {
        Self {
            source,
            reporter,
            resolution,
            decoder: ByteDecoder::new(resolution.encoding),
            prefix,
            prefix_decoded: false,
            boundary_passed: false,
            rewindable: resolution.confidence == Confidence::Tentative,
            finished: false,
            seen_non_ascii: false,
            line: 1,
            column: 0,
            last_was_cr: false,
        }
    }

    /// Decode the next piece of input and append it to `out`.
    ///
    /// Returns `false` once the input is exhausted. The final call may still
    /// have appended characters (a flushed incomplete sequence becomes
    /// U+FFFD).
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::Io`] if the source fails.
    pub fn read(&mut self, out: &mut String) -> Result<bool> {
        if self.finished {
            return Ok(false);
        }
        let start = out.len();

        if !self.prefix_decoded {
            self.prefix_decoded = true;
            let malformed = self.decoder.decode(&self.prefix, false, out);
            self.track(out, start, &malformed);
            return Ok(true);
        }

        let mut chunk = [0u8; CHUNK_SIZE];
        let read = read_retrying(&mut self.source, &mut chunk)?;
        let last = read == 0;
        if !last && !self.boundary_passed {
            log::trace!("passed the {SNIFFING_LIMIT}-byte boundary, dropping rewind buffer");
            self.boundary_passed = true;
            self.prefix = Vec::new();
        }
        let malformed = self.decoder.decode(&chunk[..read], last, out);
        self.track(out, start, &malformed);
        if last {
            self.finished = true;
        }
        Ok(!last)
    }

    /// Start over from the first byte, decoding with `encoding`.
    ///
    /// After a successful rewind the encoding is certain and the reader will
    /// not rewind again.
    ///
    /// # Errors
    ///
    /// [`EncodingError::RewindUnavailable`] if rewinding was disabled, and
    /// [`EncodingError::RewindPastBoundary`] if bytes past the sniffing
    /// window were already consumed.
    pub fn rewind(&mut self, encoding: &'static Encoding) -> Result<()> {
        if !self.rewindable {
            return Err(EncodingError::RewindUnavailable);
        }
        if self.boundary_passed {
            return Err(EncodingError::RewindPastBoundary {
                limit: SNIFFING_LIMIT,
            });
        }
        log::debug!(
            "rewinding {} bytes to decode as {}",
            self.prefix.len(),
            encoding.name()
        );
        self.decoder = ByteDecoder::new(encoding);
        self.resolution = Resolution {
            encoding,
            confidence: Confidence::Certain,
            source: EncodingSource::InDocument,
            swallow_bom: self.resolution.swallow_bom,
        };
        self.prefix_decoded = false;
        self.finished = false;
        self.rewindable = false;
        self.seen_non_ascii = false;
        self.line = 1;
        self.column = 0;
        self.last_was_cr = false;
        Ok(())
    }
}

impl<R> StreamingReader<R> {
    /// The encoding currently decoded with.
    #[must_use]
    pub fn encoding(&self) -> &'static Encoding {
        self.resolution.encoding
    }

    /// The confidence of the current encoding.
    #[must_use]
    pub fn confidence(&self) -> Confidence {
        self.resolution.confidence
    }

    /// How the current encoding was decided.
    #[must_use]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Returns true once bytes past the sniffing window were read.
    #[must_use]
    pub fn boundary_passed(&self) -> bool {
        self.boundary_passed
    }

    /// Returns true if [`rewind`](Self::rewind) could still succeed.
    #[must_use]
    pub fn can_rewind(&self) -> bool {
        self.rewindable && !self.boundary_passed
    }

    /// Forbid rewinding from now on. Used when the encoding became certain.
    pub fn will_not_rewind(&mut self) {
        self.rewindable = false;
        self.resolution.confidence = Confidence::Certain;
    }

    /// Returns true if any non-ASCII character was decoded since the last
    /// (re)start.
    #[must_use]
    pub fn seen_non_ascii(&self) -> bool {
        self.seen_non_ascii
    }

    fn track(&mut self, out: &str, start: usize, malformed: &[MalformedSequence]) {
        let text = &out[start..];
        if !self.seen_non_ascii && !text.is_ascii() {
            self.seen_non_ascii = true;
        }
        let mut pending = malformed.iter().peekable();
        for (offset, c) in text.char_indices() {
            match c {
                '\n' if self.last_was_cr => {}
                '\n' | '\r' => {
                    self.line += 1;
                    self.column = 0;
                }
                _ => self.column += 1,
            }
            self.last_was_cr = c == '\r';
            while let Some(bad) = pending.next_if(|m| m.output_offset == start + offset) {
                self.reporter.error(
                    Stage::Encoding,
                    format!("Malformed byte sequence: {}.", bad.describe()),
                    Position::new(self.line, self.column),
                );
            }
        }
    }
}

fn fill_prefix<R: Read>(source: &mut R) -> Result<(Vec<u8>, bool)> {
    let mut prefix = vec![0u8; SNIFFING_LIMIT];
    let mut filled = 0;
    while filled < SNIFFING_LIMIT {
        let read = read_retrying(source, &mut prefix[filled..])?;
        if read == 0 {
            prefix.truncate(filled);
            return Ok((prefix, true));
        }
        filled += read;
    }
    Ok((prefix, false))
}

fn read_retrying<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<usize> {
    loop {
        match source.read(buf) {
            Ok(read) => return Ok(read),
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(EncodingError::Io(e)),
        }
    }
}
