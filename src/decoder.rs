//! Decoding pipelines and stream resynchronization
//!
//! The block decoder mirrors the encoder exactly; the interesting part is
//! the framing layer. `decode` discards the filter-bank warm-up and stops
//! on parity failure; `decode_sync` wraps it with a byte-granular
//! resynchronization state machine: on failure it resets the per-sample
//! state (keeping the carry buffer and drop accounting), advances the input
//! cursor by a single byte and tries again, counting every consumed byte as
//! dropped until 23 consecutive blocks decode cleanly.

use log::{debug, trace};

use crate::error::{CodecError, CodecResult};
use crate::sync::check_parity;
use crate::types::{CodecContext, Mode, LATENCY_BLOCKS, LATENCY_SAMPLES, NB_CHANNELS};

/// PCM bytes produced by one fully emitted block.
const BLOCK_PCM_BYTES: usize = 3 * NB_CHANNELS * 4;

impl CodecContext {
    /// Decode one block's codewords into 4 samples per channel. Returns the
    /// parity check result (non-zero means the stream is out of sync).
    pub(crate) fn decode_samples(
        &mut self,
        input: &[u8],
        samples: &mut [[i32; 4]; NB_CHANNELS],
    ) -> i32 {
        let mode = self.mode();
        for (idx, channel) in self.channels.iter_mut().enumerate() {
            channel.generate_dither();

            match mode {
                Mode::Hd => channel.unpack_codeword_hd(
                    (input[3 * idx] as u32) << 16
                        | (input[3 * idx + 1] as u32) << 8
                        | input[3 * idx + 2] as u32,
                ),
                Mode::Standard => channel.unpack_codeword(
                    (input[2 * idx] as u16) << 8 | input[2 * idx + 1] as u16,
                ),
            }
            channel.invert_quantize_and_prediction(mode);
        }

        let ret = check_parity(&self.channels, &mut self.sync_idx);

        for (channel, samples) in self.channels.iter_mut().zip(samples.iter_mut()) {
            channel.decode(samples);
        }

        ret
    }

    /// Decode one block (4 or 6 bytes) into 4 stereo samples. Returns
    /// whether the embedded parity matched.
    pub fn decode_block(
        &mut self,
        input: &[u8],
        pcm: &mut [[i32; NB_CHANNELS]; 4],
    ) -> CodecResult<bool> {
        let sample_size = self.mode().sample_size();
        if input.len() < sample_size {
            return Err(CodecError::InvalidLength {
                expected: sample_size,
                actual: input.len(),
            });
        }

        let mut samples = [[0i32; 4]; NB_CHANNELS];
        let ret = self.decode_samples(&input[..sample_size], &mut samples);
        for (sample, frame) in pcm.iter_mut().enumerate() {
            for (channel, value) in frame.iter_mut().enumerate() {
                *value = samples[channel][sample];
            }
        }
        Ok(ret == 0)
    }

    /// Decode a buffer of encoded blocks into packed 24-bit little-endian
    /// PCM triples, discarding the first 90 samples of filter-bank warm-up.
    /// Stops early on parity failure; the failed block is not counted as
    /// consumed. Returns the bytes consumed.
    pub fn decode(&mut self, input: &[u8], output: &mut [u8], written: &mut usize) -> usize {
        let sample_size = self.mode().sample_size();
        let mut ipos = 0;
        let mut opos = 0;

        while ipos + sample_size <= input.len() {
            // Never decode a block whose PCM could not be emitted: a full
            // block needs 24 bytes, the final warm-up block emits only the
            // samples past the group delay.
            let needed = match self.decode_skip_leading {
                0 => BLOCK_PCM_BYTES,
                1 => (4 - LATENCY_SAMPLES % 4) * NB_CHANNELS * 3,
                _ => 0,
            };
            if opos + needed > output.len() {
                break;
            }

            let mut samples = [[0i32; 4]; NB_CHANNELS];
            if self.decode_samples(&input[ipos..], &mut samples) != 0 {
                break;
            }
            ipos += sample_size;

            let mut sample = 0;
            if self.decode_skip_leading > 0 {
                self.decode_skip_leading -= 1;
                if self.decode_skip_leading > 0 {
                    continue;
                }
                sample = LATENCY_SAMPLES % 4;
            }
            while sample < 4 {
                for channel in 0..NB_CHANNELS {
                    let value = samples[channel][sample] as u32;
                    output[opos] = value as u8;
                    output[opos + 1] = (value >> 8) as u8;
                    output[opos + 2] = (value >> 16) as u8;
                    opos += 3;
                }
                sample += 1;
            }
        }

        *written = opos;
        ipos
    }

    /// Reset all per-sample state but keep the carry buffer and the resync
    /// accounting, so a resynchronization attempt can continue where the
    /// previous one left off.
    fn reset_decode_sync(&mut self) {
        let decode_dropped = self.decode_dropped;
        let decode_sync_packets = self.decode_sync_packets;
        let decode_sync_buffer_len = self.decode_sync_buffer_len;
        let decode_sync_buffer = self.decode_sync_buffer;

        self.reset();

        self.decode_sync_buffer = decode_sync_buffer;
        self.decode_sync_buffer_len = decode_sync_buffer_len;
        self.decode_sync_packets = decode_sync_packets;
        self.decode_dropped = decode_dropped;
    }

    /// Resynchronization-aware decode over an arbitrary byte stream.
    ///
    /// Trailing bytes that do not complete a block are carried between
    /// calls. On parity failure the stream position advances by exactly one
    /// byte and decoding restarts from clean state; consumed bytes count as
    /// dropped until 23 consecutive blocks pass the parity check, at which
    /// point the accumulated drop count is reported through `dropped`.
    /// `synced` reflects the state after the last processed block. Returns
    /// the bytes consumed.
    pub fn decode_sync(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        written: &mut usize,
        synced: &mut bool,
        dropped: &mut usize,
    ) -> usize {
        let sample_size = self.mode().sample_size();
        let input_size = input.len();
        let output_size = output.len();
        let mut ipos = 0;
        let mut opos = 0;

        *synced = false;
        *dropped = 0;

        // Top the carry buffer up to one byte short of a whole block.
        if self.decode_sync_buffer_len > 0
            && (sample_size - 1).saturating_sub(self.decode_sync_buffer_len as usize)
                <= input_size
        {
            while (self.decode_sync_buffer_len as usize) < sample_size - 1 {
                self.decode_sync_buffer[self.decode_sync_buffer_len as usize] = input[ipos];
                ipos += 1;
                self.decode_sync_buffer_len += 1;
            }
        }

        // Carry-fed decode loop, used only while a block straddles the
        // carry buffer and the fresh input.
        while self.decode_sync_buffer_len as usize == sample_size - 1
            && ipos < sample_size
            && ipos < input_size
            && (opos + BLOCK_PCM_BYTES <= output_size
                || self.decode_skip_leading > 0
                || self.decode_dropped > 0)
        {
            self.decode_sync_buffer[sample_size - 1] = input[ipos];
            ipos += 1;

            let carry = self.decode_sync_buffer;
            let mut written_step = 0;
            let processed_step =
                self.decode(&carry[..sample_size], &mut output[opos..], &mut written_step);
            opos += written_step;

            if self.decode_dropped > 0 && processed_step == sample_size {
                self.decode_dropped += processed_step;
                self.decode_sync_packets += 1;
                if self.decode_sync_packets >= LATENCY_BLOCKS {
                    *dropped += self.decode_dropped;
                    self.decode_dropped = 0;
                    self.decode_sync_packets = 0;
                }
            }

            if processed_step < sample_size {
                debug!("parity mismatch in carried block, shifting one byte");
                self.reset_decode_sync();
                *synced = false;
                self.decode_dropped += 1;
                self.decode_sync_packets = 0;
                for i in 0..sample_size - 1 {
                    self.decode_sync_buffer[i] = self.decode_sync_buffer[i + 1];
                }
            } else {
                if self.decode_dropped == 0 {
                    *synced = true;
                }
                self.decode_sync_buffer_len = 0;
            }
        }

        // If the unprocessed data now lives entirely in the input buffer,
        // the carry buffer is no longer needed.
        if self.decode_sync_buffer_len as usize == sample_size - 1 && ipos == sample_size {
            ipos = 0;
            self.decode_sync_buffer_len = 0;
        }

        // Main decode loop: bulk-decode as much as possible, restarting one
        // byte later whenever a parity failure cuts a step short.
        while ipos + sample_size <= input_size
            && (opos + BLOCK_PCM_BYTES <= output_size
                || self.decode_skip_leading > 0
                || self.decode_dropped > 0)
        {
            // Split the budgets for this step. The output-driven bound
            // keeps the reference's exact evaluation order.
            let mut input_size_step = ((output_size - opos) / 3 * NB_CHANNELS * 4
                + self.decode_skip_leading as usize)
                * sample_size;
            if input_size_step > (input_size - ipos) / sample_size * sample_size {
                input_size_step = (input_size - ipos) / sample_size * sample_size;
            }
            if input_size_step > (LATENCY_BLOCKS - self.decode_sync_packets) * sample_size
                && self.decode_dropped > 0
            {
                input_size_step = (LATENCY_BLOCKS - self.decode_sync_packets) * sample_size;
            }

            let mut written_step = 0;
            let processed_step = self.decode(
                &input[ipos..ipos + input_size_step],
                &mut output[opos..],
                &mut written_step,
            );
            ipos += processed_step;
            opos += written_step;

            if self.decode_dropped > 0 && processed_step / sample_size > 0 {
                self.decode_dropped += processed_step;
                self.decode_sync_packets += processed_step / sample_size;
                if self.decode_sync_packets >= LATENCY_BLOCKS {
                    *dropped += self.decode_dropped;
                    self.decode_dropped = 0;
                    self.decode_sync_packets = 0;
                }
            }

            if processed_step < input_size_step {
                debug!("parity mismatch at byte {ipos}, retrying one byte later");
                self.reset_decode_sync();
                *synced = false;
                ipos += 1;
                self.decode_dropped += 1;
                self.decode_sync_packets = 0;
            } else if self.decode_dropped == 0 {
                *synced = true;
            }
        }

        // Keep a trailing partial block for the next call.
        if ipos + sample_size > input_size {
            while ipos < input_size && (self.decode_sync_buffer_len as usize) < sample_size - 1 {
                self.decode_sync_buffer[self.decode_sync_buffer_len as usize] = input[ipos];
                self.decode_sync_buffer_len += 1;
                ipos += 1;
            }
        }

        trace!(
            "decode_sync: consumed {ipos} of {input_size} bytes, wrote {opos}, carrying {}",
            self.decode_sync_buffer_len
        );
        *written = opos;
        ipos
    }

    /// Finish a `decode_sync` stream: report how many carried bytes never
    /// decoded and fully reset the session.
    pub fn decode_sync_finish(&mut self) -> usize {
        let dropped = self.decode_sync_buffer_len as usize;
        self.reset();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_block_rejects_short_input() {
        let mut ctx = CodecContext::new(Mode::Hd);
        let mut pcm = [[0i32; NB_CHANNELS]; 4];
        let err = ctx.decode_block(&[0u8; 4], &mut pcm).unwrap_err();
        assert_eq!(
            err,
            CodecError::InvalidLength {
                expected: 6,
                actual: 4
            }
        );
    }

    #[test]
    fn test_decode_consumes_warmup_without_output() {
        let mut ctx = CodecContext::new(Mode::Standard);
        // 8 all-zero blocks decode cleanly (the first parity marker is due
        // at the eighth block and all-zero data fails it).
        let input = [0u8; 8 * 4];
        let mut output = [0u8; 0];
        let mut written = 0;
        let consumed = ctx.decode(&input, &mut output, &mut written);
        // Blocks 1..=7 are consumed as warm-up, the eighth stops on the
        // parity marker.
        assert_eq!(consumed, 7 * 4);
        assert_eq!(written, 0);
        assert_eq!(ctx.decode_skip_leading as usize, LATENCY_BLOCKS - 7);
    }

    #[test]
    fn test_decode_sync_finish_reports_carried_bytes() {
        let mut ctx = CodecContext::new(Mode::Standard);
        let mut output = [0u8; 256];
        let (mut written, mut synced, mut dropped) = (0, false, 0);
        // Two stray bytes cannot complete a block; they land in the carry
        // buffer.
        let consumed = ctx.decode_sync(&[0x4B, 0xBF], &mut output, &mut written, &mut synced, &mut dropped);
        assert_eq!(consumed, 2);
        assert_eq!(written, 0);
        assert_eq!(ctx.decode_sync_buffer_len, 2);

        assert_eq!(ctx.decode_sync_finish(), 2);
        assert_eq!(ctx.decode_sync_buffer_len, 0);
    }

    #[test]
    fn test_decode_sync_consumes_clean_warmup() {
        let mut ctx = CodecContext::new(Mode::Standard);
        // Four all-zero blocks stay below the first parity marker, so they
        // decode cleanly into the warm-up discard.
        let input = [0u8; 16];
        let mut output = [0u8; 16];
        let (mut written, mut synced, mut dropped) = (0, false, 0);
        let consumed = ctx.decode_sync(&input, &mut output, &mut written, &mut synced, &mut dropped);
        assert_eq!(consumed, 16);
        assert_eq!(written, 0);
        assert!(synced);
        assert_eq!(dropped, 0);
    }
}
