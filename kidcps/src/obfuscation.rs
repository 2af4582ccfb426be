//! Keystream masking applied to whole CPS files.
//!
//! The last word of an obfuscated file points (after subtracting a bias) at
//! an untouched seed word somewhere in the file. The seed starts an LCG whose
//! output, plus the file length, was added to every other word from offset 16
//! onwards.

use log::debug;
use crate::{byte_slice::ByteSlice, error::{CpsError, Result}};

const TRAILER_BIAS: u32 = 0x7534682;
const SEED_BIAS: u32 = 0x3786425;
const FIRST_WORD: usize = 0x10;
const MIN_MASKED_LEN: usize = 20;

/// The LCG masking each word. Yields the key for the current word, then advances.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Keystream {
	state: u32
}

impl Keystream {
	pub const fn new(seed: u32) -> Self {
		Self {state: seed}
	}

	pub const fn state(&self) -> u32 {
		self.state
	}
}

impl Iterator for Keystream {
	type Item = u32;

	fn next(&mut self) -> Option<u32> {
		let key = self.state;
		self.state = key.wrapping_mul(0x41c64e6d).wrapping_add(0x9b06);
		Some(key)
	}
}

/// Reverses the masking in place and drops the 4-byte trailer.
///
/// Fails without touching the buffer if the trailer is missing or points
/// outside the buffer.
pub fn deobfuscate(buf: &mut Vec<u8>) -> Result<()> {
	let len = buf.len();
	if len < 4 {
		return Err(CpsError::Format(format!("{len} bytes is too short to hold an obfuscation trailer")));
	}
	let data_size = u32::try_from(len).map_err(|_| CpsError::Format(format!("{len} bytes is too large for a cps file")))?;
	let seed_offset = buf.read_u32(len - 4, "obfuscation trailer")?.wrapping_sub(TRAILER_BIAS);
	let seed_pos = seed_offset as usize;
	if seed_pos.checked_add(4).is_none_or(|end| end > len) {
		return Err(CpsError::Format(format!("seed offset {seed_offset:#x} lies outside the {len} byte buffer")));
	}

	let cleared_word = if len >= MIN_MASKED_LEN && seed_offset != 0 {
		let seed = buf.read_u32(seed_pos, "seed word")?.wrapping_add(seed_offset).wrapping_add(SEED_BIAS);
		debug!("unmasking {len} bytes, seed word at {seed_pos:#x}");
		for (pos, key) in (FIRST_WORD..=len - 4).step_by(4).zip(Keystream::new(seed)) {
			if pos == seed_pos {
				continue;
			}
			let plain = buf.read_u32(pos, "masked word")?.wrapping_sub(key).wrapping_sub(data_size);
			buf[pos..pos + 4].copy_from_slice(&plain.to_le_bytes());
		}
		Some(len - 4)
	} else {
		// nothing was walked, so the word just before the first masked one gets cleared
		debug!("{len} byte buffer with seed offset {seed_offset:#x} is not masked");
		(len >= FIRST_WORD).then_some(FIRST_WORD - 4)
	};
	if let Some(pos) = cleared_word {
		buf[pos..pos + 4].fill(0);
	}
	buf.truncate(len - 4);
	Ok(())
}
