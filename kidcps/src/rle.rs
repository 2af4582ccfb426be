//! The run-length/back-reference compression used for CPS images (and WAF voice files).
//!
//! Every token starts with a control byte whose top two bits pick the kind:
//!
//! | bits | token |
//! |------|-------|
//! | `11` | one byte repeated |
//! | `10` | copy from earlier output, at most 1024 bytes back |
//! | `01` | a short pattern repeated |
//! | `00` | literal bytes |

use log::{trace, warn};
use crate::error::{CpsError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Token<'a> {
	ByteRun {len: usize, value: u8},
	BackRef {len: usize, distance: usize},
	Pattern {pattern: &'a [u8], count: usize},
	Literal(&'a [u8])
}

struct Input<'a> {
	buf: &'a [u8],
	pos: usize
}

impl<'a> Input<'a> {
	fn byte(&mut self) -> Result<u8> {
		let byte = *self.buf.get(self.pos).ok_or_else(|| self.exhausted(1))?;
		self.pos += 1;
		Ok(byte)
	}

	fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
		let chunk = self.buf.get(self.pos..self.pos + len).ok_or_else(|| self.exhausted(len))?;
		self.pos += len;
		Ok(chunk)
	}

	fn exhausted(&self, wanted: usize) -> CpsError {
		CpsError::Decode(format!("input ran out at offset {} (wanted {wanted} more bytes)", self.pos))
	}
}

/// Length with an optional high part: 5 low bits in the op, bit 5 says another byte supplies bits 5..13.
fn extended_len(input: &mut Input, op: u8, bias: usize) -> Result<usize> {
	let mut len = (op & 0x1F) as usize + bias;
	if op & 0x20 != 0 {
		len += (input.byte()? as usize) << 5;
	}
	Ok(len)
}

impl<'a> Token<'a> {
	fn read(input: &mut Input<'a>) -> Result<Self> {
		let op = input.byte()?;
		Ok(match (op & 0x80 != 0, op & 0x40 != 0) {
			(true, true) => {
				let len = extended_len(input, op, 2)?;
				Token::ByteRun {len, value: input.byte()?}
			}
			(true, false) => {
				let len = ((op >> 2) & 0xF) as usize + 2;
				let distance = ((op as usize & 3) << 8) + input.byte()? as usize + 1;
				Token::BackRef {len, distance}
			}
			(false, true) => {
				let len = (op & 0x3F) as usize + 2;
				let count = input.byte()? as usize + 1;
				Token::Pattern {pattern: input.bytes(len)?, count}
			}
			(false, false) => {
				let len = extended_len(input, op, 1)?;
				Token::Literal(input.bytes(len)?)
			}
		})
	}
}

fn check_space(len: usize, remaining: usize, what: &str) -> Result<()> {
	if len > remaining {
		Err(CpsError::Decode(format!("{what} of {len} bytes overruns the remaining {remaining} bytes of output")))
	} else {
		Ok(())
	}
}

/// Decompresses `input` into exactly `output_len` bytes.
///
/// Trailing input after the output is full is ignored. A pattern repeat that
/// would overrun the output is cut short instead of failing, since some
/// shipped files rely on that.
pub fn rle_decode(input: &[u8], output_len: usize) -> Result<Vec<u8>> {
	let mut out = Vec::with_capacity(output_len);
	let mut input = Input {buf: input, pos: 0};
	while out.len() < output_len {
		let remaining = output_len - out.len();
		let token = Token::read(&mut input)?;
		trace!("{token:?} at output offset {}", out.len());
		match token {
			Token::ByteRun {len, value} => {
				check_space(len, remaining, "byte run")?;
				out.resize(out.len() + len, value);
			}
			Token::BackRef {len, distance} => {
				check_space(len, remaining, "back-reference")?;
				let start = out.len().checked_sub(distance).ok_or_else(|| CpsError::Decode(
					format!("back-reference {distance} bytes back from output offset {}", out.len())
				))?;
				// source and destination may overlap, so this has to go byte by byte
				for i in start..start + len {
					let byte = out[i];
					out.push(byte);
				}
			}
			Token::Pattern {pattern, count} => {
				for _ in 0..count {
					let remaining = output_len - out.len();
					if remaining == 0 {
						break;
					}
					if remaining < pattern.len() {
						warn!("pattern repeat clipped to {remaining} of {} bytes at end of output", pattern.len());
						out.extend_from_slice(&pattern[..remaining]);
						break;
					}
					out.extend_from_slice(pattern);
				}
			}
			Token::Literal(bytes) => {
				check_space(bytes.len(), remaining, "literal run")?;
				out.extend_from_slice(bytes);
			}
		}
	}
	Ok(out)
}
