//! The byte layer of the weft HTML parser.
//!
//! - **Registry** - label lookup and the HTML coercions ([`registry`])
//! - **Decoder** - incremental, never-failing decoding ([`decoder`])
//! - **Resolver** - BOM, external label, `<meta>` prescan, heuristics,
//!   fallback ([`resolver`], [`prescan`], [`heuristics`])
//! - **Reader** - a rewindable decoded stream ([`reader`])
//!
//! The codecs themselves come from `encoding_rs`.

pub mod decoder;
pub mod error;
pub mod heuristics;
pub mod prescan;
pub mod reader;
pub mod registry;
pub mod resolver;

pub use decoder::{ByteDecoder, MalformedSequence};
pub use encoding_rs::Encoding;
pub use error::EncodingError;
pub use heuristics::Heuristics;
pub use prescan::{SNIFFING_LIMIT, prescan};
pub use reader::StreamingReader;
pub use registry::Confidence;
pub use resolver::{EncodingSource, Resolution, ResolverOptions, resolve, sniff_bom};
