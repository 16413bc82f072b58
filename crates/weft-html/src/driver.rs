//! The driver: bytes in, tree mutations out.
//!
//! [§ 13.2.3 The input byte stream](https://html.spec.whatwg.org/multipage/parsing.html#the-input-byte-stream)
//!
//! The driver owns the [`StreamingReader`], decodes one chunk at a time into a
//! [`DecodeBuffer`] and hands it to the [`Tokenizer`], which pushes tokens
//! into the [`TreeBuilder`]. It is also where the
//! [§ 13.2.3.4 Changing the encoding while parsing](https://html.spec.whatwg.org/multipage/parsing.html#changing-the-encoding-while-parsing)
//! rules live: a `<meta>` declaration reported by the tree builder may make
//! the driver throw everything away and start over from the first byte.

use std::io::Read;

use encoding_rs::UTF_8;
use log::debug;
use weft_common::{DiagnosticSink, Position, Reporter, Stage};
use weft_encoding::registry;
use weft_encoding::{
    Confidence, Encoding, EncodingError, EncodingSource, ResolverOptions, StreamingReader,
};

use crate::buffer::DecodeBuffer;
use crate::config::ParserOptions;
use crate::error::ParseError;
use crate::names::Namespace;
use crate::parser::{FragmentContext, TreeBuilder, TreeSink};
use crate::tokenizer::{Tokenizer, TokenizerOptions, TokenizerResult};

/// What a call to [`Driver::step`] ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The sink asked for a pause after the last token. Call
    /// [`step`](Driver::step) again to carry on.
    Suspended,
    /// The whole input was parsed and the sink was told the parse ended.
    Done,
}

/// What an embedder gets back from a finished parse.
#[derive(Debug)]
pub struct ParseOutcome<S> {
    /// The sink, holding the tree.
    pub sink: S,
    /// The encoding the final pass decoded with.
    pub encoding: &'static Encoding,
    /// Whether that encoding was certain at the end.
    pub confidence: Confidence,
    /// How many times the parse started over because of a `<meta>`
    /// declaration.
    pub restarts: u32,
    /// Parse errors reported, restarts included.
    pub errors: usize,
    /// Warnings reported, restarts included.
    pub warnings: usize,
}

type Pipeline<S> = Tokenizer<TreeBuilder<S>>;

/// Drives one parse.
///
/// Create it with a sink, [`feed`](Self::feed) it a byte source, then call
/// [`step`](Self::step) until it returns [`Step::Done`] (or use
/// [`run`](Self::run)), and take the sink back with
/// [`finish`](Self::finish).
#[allow(clippy::struct_excessive_bools)]
pub struct Driver<S: TreeSink, R> {
    options: ParserOptions,
    reporter: Reporter,
    external_label: Option<String>,
    context: Option<FragmentContext>,

    /// The sink before [`feed`](Self::feed) builds the pipeline around it.
    idle_sink: Option<S>,
    pipeline: Option<Pipeline<S>>,
    reader: Option<StreamingReader<R>>,

    buffer: DecodeBuffer,
    chunk: String,
    at_start: bool,
    reader_exhausted: bool,
    eof_sent: bool,
    finished: bool,
    restarts: u32,
}

impl<S: TreeSink, R> std::fmt::Debug for Driver<S, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("options", &self.options)
            .field("fragment", &self.context.is_some())
            .field("restarts", &self.restarts)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl<S: TreeSink, R: Read> Driver<S, R> {
    /// A driver that will build into `sink`.
    #[must_use]
    pub fn new(sink: S, options: ParserOptions) -> Self {
        Self {
            options,
            reporter: Reporter::silent(),
            external_label: None,
            context: None,
            idle_sink: Some(sink),
            pipeline: None,
            reader: None,
            buffer: DecodeBuffer::new(),
            chunk: String::new(),
            at_start: true,
            reader_exhausted: false,
            eof_sent: false,
            finished: false,
            restarts: 0,
        }
    }

    /// Declare the encoding from outside the document, e.g. from a
    /// `Content-Type` header. It is certain unless a byte order mark says
    /// otherwise.
    #[must_use]
    pub fn with_external_encoding(mut self, label: impl Into<String>) -> Self {
        self.external_label = Some(label.into());
        self
    }

    /// Send diagnostics to `sink`. Without one they are only counted.
    #[must_use]
    pub fn with_diagnostics(self, sink: Box<dyn DiagnosticSink>) -> Self {
        self.reporter.set_sink(sink);
        self
    }

    /// Parse a fragment in `context` instead of a document.
    #[must_use]
    pub fn for_fragment(mut self, context: FragmentContext) -> Self {
        self.context = Some(context);
        self
    }

    /// The diagnostics handle shared by every stage of this parse.
    #[must_use]
    pub const fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// The sink, for looking at the tree between steps.
    #[must_use]
    pub fn sink(&self) -> Option<&S> {
        match &self.pipeline {
            Some(pipeline) => Some(pipeline.sink().sink()),
            None => self.idle_sink.as_ref(),
        }
    }

    /// Install the byte source, resolve its encoding and set up the
    /// tokenizer and tree builder.
    ///
    /// # Errors
    ///
    /// [`ParseError::Protocol`] when called twice, I/O failures while reading
    /// the sniffing window, and sink failures while setting up a fragment.
    pub fn feed(&mut self, source: R) -> Result<(), ParseError> {
        let Some(sink) = self.idle_sink.take() else {
            return Err(ParseError::Protocol(
                "the driver was already fed a byte source".to_string(),
            ));
        };
        let external = self.external_label.as_deref().and_then(|label| {
            resolve_external_label(label, &self.reporter)
        });

        let reader = if self.context.is_some() {
            // A fragment never sniffs.
            StreamingReader::with_encoding(source, external.unwrap_or(UTF_8), self.reporter.clone())?
        } else {
            let options = ResolverOptions {
                external,
                heuristics: self.options.heuristics,
            };
            StreamingReader::new(source, options, self.reporter.clone())?
        };
        debug!(
            "decoding as {} ({})",
            reader.encoding().name(),
            reader.confidence()
        );
        self.reader = Some(reader);
        self.pipeline = Some(self.build_pipeline(sink)?);
        Ok(())
    }

    fn build_pipeline(&self, sink: S) -> Result<Pipeline<S>, ParseError> {
        let mut tokenizer_options = TokenizerOptions {
            xml_violation_policy: self.options.xml_violation_policy,
            ..TokenizerOptions::default()
        };
        let builder = match &self.context {
            Some(context) => {
                tokenizer_options.initial_state =
                    context.tokenizer_state(self.options.scripting_enabled);
                if context.name.ns == Namespace::Html {
                    tokenizer_options.last_start_tag = Some(context.name.local.clone());
                }
                TreeBuilder::new_fragment(
                    sink,
                    self.options,
                    self.reporter.clone(),
                    context.clone(),
                )?
            }
            None => TreeBuilder::new(sink, self.options, self.reporter.clone()),
        };
        Ok(Tokenizer::new(
            builder,
            tokenizer_options,
            self.reporter.clone(),
        ))
    }

    /// Parse until the sink asks for a pause or the input ends.
    ///
    /// After [`Step::Done`] further calls return [`Step::Done`] again.
    ///
    /// # Errors
    ///
    /// Sink and I/O failures, a needed restart that cannot rewind, fatal XML
    /// violations, and [`ParseError::Protocol`] if nothing was fed.
    pub fn step(&mut self) -> Result<Step, ParseError> {
        if self.finished {
            return Ok(Step::Done);
        }
        loop {
            let Some(pipeline) = self.pipeline.as_mut() else {
                return Err(ParseError::Protocol(
                    "step called before a byte source was fed".to_string(),
                ));
            };
            let result = if !self.buffer.is_empty() {
                pipeline.feed(&mut self.buffer)?
            } else if self.reader_exhausted {
                self.eof_sent = true;
                pipeline.eof()?
            } else {
                self.refill()?;
                continue;
            };

            match result {
                TokenizerResult::Suspended => {
                    debug!("suspended at {}", pipeline.position());
                    return Ok(Step::Suspended);
                }
                TokenizerResult::EncodingChange(label) => {
                    let position = pipeline.position();
                    self.change_encoding(&label, position)?;
                }
                TokenizerResult::Done if self.eof_sent => {
                    self.end_parse()?;
                    return Ok(Step::Done);
                }
                TokenizerResult::Done => {}
            }
        }
    }

    /// Run to the end, stepping over suspensions.
    ///
    /// # Errors
    ///
    /// See [`step`](Self::step).
    pub fn run(&mut self) -> Result<(), ParseError> {
        while self.step()? == Step::Suspended {}
        Ok(())
    }

    fn refill(&mut self) -> Result<(), ParseError> {
        let Some(reader) = self.reader.as_mut() else {
            return Err(ParseError::Protocol("no byte source".to_string()));
        };
        self.chunk.clear();
        let more = reader.read(&mut self.chunk)?;
        if !more {
            self.reader_exhausted = true;
        }
        if reader.boundary_passed()
            && let Some(pipeline) = self.pipeline.as_mut()
        {
            pipeline.notify_meta_boundary();
        }
        self.buffer.refill(&self.chunk);
        // [§ 13.2.3.5](https://html.spec.whatwg.org/multipage/parsing.html#preprocessing-the-input-stream)
        // "One leading U+FEFF BYTE ORDER MARK character must be ignored if
        // any are present."
        if self.at_start && !self.buffer.is_empty() {
            self.at_start = false;
            if self.options.swallow_bom
                && reader.resolution().swallow_bom
                && self.buffer.skip_bom()
            {
                debug!("skipped a leading byte order mark");
            }
        }
        Ok(())
    }

    /// [§ 13.2.3.4 Changing the encoding while parsing](https://html.spec.whatwg.org/multipage/parsing.html#changing-the-encoding-while-parsing)
    fn change_encoding(&mut self, label: &str, position: Position) -> Result<(), ParseError> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(());
        };
        let current = reader.encoding();
        let Some(declared) = registry::for_label(label) else {
            self.reporter.error(
                Stage::Driver,
                format!("Internal encoding declaration named an unsupported character encoding “{label}”."),
                position,
            );
            return Ok(());
        };

        if reader.confidence() == Confidence::Certain {
            let effective = registry::coerce_declared(declared);
            let both_utf16 = registry::is_utf16(declared) && registry::is_utf16(current);
            if effective != current && !both_utf16 {
                let mut message = format!(
                    "Internal encoding declaration “{label}” disagrees with the actual encoding of the document (“{}”).",
                    current.name()
                );
                if reader.resolution().source == EncodingSource::External {
                    message.push_str(" The external declaration takes precedence.");
                }
                self.reporter.error(Stage::Driver, message, position);
            }
            return Ok(());
        }

        // STEP 1: "If the encoding that is already being used to interpret
        // the input stream is UTF-16BE/LE, then set the confidence to certain
        // and return."
        if registry::is_utf16(current) {
            reader.will_not_rewind();
            return Ok(());
        }
        // STEP 2: "If the new encoding is UTF-16BE/LE, then change it to
        // UTF-8." STEP 3: "If the new encoding is x-user-defined, then change
        // it to windows-1252."
        if registry::is_utf16(declared) {
            self.reporter.error(
                Stage::Driver,
                format!(
                    "Internal encoding declaration specified “{label}” which is not an ASCII superset. Continuing as if the encoding had been “utf-8”."
                ),
                position,
            );
        }
        let declared = registry::coerce_declared(declared);
        if !registry::is_ascii_superset(declared) {
            self.reporter.error(
                Stage::Driver,
                format!("Internal encoding declaration specified “{label}” which is not an ASCII superset. Not changing the encoding."),
                position,
            );
            return Ok(());
        }
        // STEP 4: "If the new encoding is identical or equivalent to the
        // encoding that is already being used to interpret the input stream,
        // then set the confidence to certain and return."
        if declared == current {
            debug!("in-document declaration confirms {}", current.name());
            reader.will_not_rewind();
            return Ok(());
        }

        // STEP 7: "Otherwise, restart the navigate algorithm" from the first
        // byte with the new encoding and confidence certain.
        let rewound = if self.options.allow_rewinding {
            reader.rewind(declared)
        } else {
            Err(EncodingError::RewindUnavailable)
        };
        if let Err(error) = rewound {
            self.reporter.fatal(
                Stage::Driver,
                "Changing encoding at this point would need non-streamable behavior.",
                position,
            );
            return Err(error.into());
        }
        self.reporter.error(
            Stage::Driver,
            format!("Changing character encoding “{label}” and reparsing."),
            position,
        );
        self.restart()
    }

    fn restart(&mut self) -> Result<(), ParseError> {
        let Some(pipeline) = self.pipeline.take() else {
            return Ok(());
        };
        let mut sink = pipeline.into_sink().into_sink();
        sink.reset()?;
        self.buffer.reset();
        self.chunk.clear();
        self.at_start = true;
        self.reader_exhausted = false;
        self.eof_sent = false;
        self.restarts += 1;
        debug!("restart {} with a fresh tree", self.restarts);
        self.pipeline = Some(self.build_pipeline(sink)?);
        Ok(())
    }

    fn end_parse(&mut self) -> Result<(), ParseError> {
        self.finished = true;
        if let Some(pipeline) = self.pipeline.as_mut() {
            pipeline.end()?;
        }
        let Some(reader) = self.reader.as_ref() else {
            return Ok(());
        };
        if reader.confidence() == Confidence::Tentative {
            let position = self
                .pipeline
                .as_ref()
                .map_or(Position::UNKNOWN, Tokenizer::position);
            if reader.seen_non_ascii() {
                self.reporter.error(
                    Stage::Driver,
                    format!(
                        "The character encoding of the document was not declared. Proceeding using “{}”.",
                        reader.encoding().name()
                    ),
                    position,
                );
            } else {
                self.reporter.warning(
                    Stage::Driver,
                    "The character encoding of the document was not declared.",
                    position,
                );
            }
        }
        debug!(
            "parse finished: {} errors, {} warnings, {} restarts",
            self.reporter.error_count(),
            self.reporter.warning_count(),
            self.restarts
        );
        Ok(())
    }

    /// Take the sink back.
    ///
    /// The sink holds whatever was built so far if the parse did not reach
    /// [`Step::Done`].
    ///
    /// # Errors
    ///
    /// [`ParseError::Protocol`] if the sink is gone, which cannot happen
    /// through the public API.
    pub fn finish(self) -> Result<S, ParseError> {
        match (self.pipeline, self.idle_sink) {
            (Some(pipeline), _) => Ok(pipeline.into_sink().into_sink()),
            (None, Some(sink)) => Ok(sink),
            (None, None) => Err(ParseError::Protocol("the sink was lost".to_string())),
        }
    }

    /// Take the sink back together with a summary of the parse.
    ///
    /// # Errors
    ///
    /// See [`finish`](Self::finish).
    pub fn into_outcome(self) -> Result<ParseOutcome<S>, ParseError> {
        let (encoding, confidence) = self
            .reader
            .as_ref()
            .map_or((UTF_8, Confidence::Certain), |r| (r.encoding(), r.confidence()));
        let restarts = self.restarts;
        let errors = self.reporter.error_count();
        let warnings = self.reporter.warning_count();
        Ok(ParseOutcome {
            sink: self.finish()?,
            encoding,
            confidence,
            restarts,
            errors,
            warnings,
        })
    }
}

/// [§ 13.2.3.2](https://html.spec.whatwg.org/multipage/parsing.html#determining-the-character-encoding)
/// The transport layer's label. UTF-16 labels are honored as declared.
fn resolve_external_label(label: &str, reporter: &Reporter) -> Option<&'static Encoding> {
    let Some(encoding) = registry::for_label(label) else {
        reporter.error(
            Stage::Encoding,
            format!("Unsupported character encoding name “{label}” in the external declaration. Ignoring it."),
            Position::UNKNOWN,
        );
        return None;
    };
    if !registry::is_preferred_label(label, encoding) {
        reporter.warning(
            Stage::Encoding,
            format!(
                "The external encoding label “{label}” is not the preferred name. The preferred name is “{}”.",
                encoding.name()
            ),
            Position::UNKNOWN,
        );
    }
    Some(encoding)
}

/// Parse a whole document from bytes.
///
/// # Errors
///
/// Sink failures, a needed restart that cannot rewind, and fatal XML
/// violations. Malformed markup is never an error.
pub fn parse_document<S: TreeSink>(
    bytes: &[u8],
    sink: S,
    options: ParserOptions,
) -> Result<ParseOutcome<S>, ParseError> {
    let mut driver = Driver::new(sink, options);
    driver.feed(bytes)?;
    driver.run()?;
    driver.into_outcome()
}

/// Parse `bytes` as the contents of an element named by `context`.
///
/// # Errors
///
/// See [`parse_document`].
pub fn parse_fragment<S: TreeSink>(
    bytes: &[u8],
    context: FragmentContext,
    sink: S,
    options: ParserOptions,
) -> Result<ParseOutcome<S>, ParseError> {
    let mut driver = Driver::new(sink, options).for_fragment(context);
    driver.feed(bytes)?;
    driver.run()?;
    driver.into_outcome()
}
