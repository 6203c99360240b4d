//! # Rust aptX Codec
//!
//! A pure Rust implementation of the aptX sub-band adaptive differential
//! audio codec. The library converts between raw interleaved 24-bit PCM
//! sample blocks and the compact, self-synchronizing aptX bitstream, in
//! both the standard (16-bit codeword) and HD (24-bit codeword) variants.
//!
//! The codec is defined entirely in fixed-point integer arithmetic; every
//! rounding and saturation step is reproduced bit-for-bit, so encoder and
//! decoder state stay identical sample-for-sample and the output is fully
//! deterministic.
//!
//! ## Example
//!
//! ```
//! use aptx_rs::{CodecContext, Mode};
//!
//! let mut encoder = CodecContext::new(Mode::Standard);
//! // Four stereo samples of 24-bit PCM, packed little-endian.
//! let pcm = [0u8; 24];
//! let mut encoded = [0u8; 4];
//! let mut written = 0;
//! let consumed = encoder.encode(&pcm, &mut encoded, &mut written);
//! assert_eq!(consumed, 24);
//! assert_eq!(written, 4);
//! ```

pub mod channel;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod fixedpoint;
pub mod prediction;
pub mod qmf;
pub mod quantization;
pub mod sync;
pub mod tables;
pub mod types;

pub use error::{CodecError, CodecResult};
pub use types::{
    Channel, CodecContext, Mode, LATENCY_BLOCKS, LATENCY_SAMPLES, NB_CHANNELS, NB_SUBBANDS,
};
