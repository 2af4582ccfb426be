//! Forward encoders used to build fixtures.
//!
//! These only exist for tests; they produce valid but unambitious streams.

#![allow(dead_code)]

const TRAILER_BIAS: u32 = 0x07534682;
const SEED_BIAS: u32 = 0x03786425;

fn lcg(key: u32) -> u32 {
	key.wrapping_mul(1103515245).wrapping_add(39686)
}

/// Masks `plain` and appends the trailer. `plain.len()` and `seed_offset` must be word aligned.
pub fn obfuscate(plain: &[u8], seed_offset: u32) -> Vec<u8> {
	assert_eq!(plain.len() % 4, 0);
	assert_eq!(seed_offset % 4, 0);
	let total = plain.len() + 4;
	assert!(total >= 20 && seed_offset != 0 && seed_offset as usize + 4 <= total);

	let mut buf = plain.to_vec();
	buf.extend(seed_offset.wrapping_add(TRAILER_BIAS).to_le_bytes());
	let word = |buf: &[u8], pos: usize| u32::from_le_bytes(buf[pos..pos + 4].try_into().unwrap());
	let mut key = word(&buf, seed_offset as usize).wrapping_add(seed_offset).wrapping_add(SEED_BIAS);
	let mut pos = 16;
	// the trailer itself stays readable
	while pos + 4 < total {
		if pos != seed_offset as usize {
			let masked = word(&buf, pos).wrapping_add(key).wrapping_add(total as u32);
			buf[pos..pos + 4].copy_from_slice(&masked.to_le_bytes());
		}
		key = lcg(key);
		pos += 4;
	}
	buf
}

/// Greedy encoder using byte runs for repeats of 3 or more and literals otherwise.
pub fn rle_encode(data: &[u8]) -> Vec<u8> {
	const MAX_RUN: usize = 2 + 0x1F + (0xFF << 5);
	const MAX_LITERAL: usize = 1 + 0x1F + (0xFF << 5);

	fn flush_literal(out: &mut Vec<u8>, literal: &[u8]) {
		for chunk in literal.chunks(MAX_LITERAL) {
			let extra = chunk.len() - 1;
			if extra > 0x1F {
				out.push(0x20 | (extra & 0x1F) as u8);
				out.push((extra >> 5) as u8);
			} else {
				out.push(extra as u8);
			}
			out.extend_from_slice(chunk);
		}
	}

	let mut out = Vec::new();
	let mut literal_start = 0;
	let mut pos = 0;
	while pos < data.len() {
		let value = data[pos];
		let run = data[pos..].iter().take(MAX_RUN).take_while(|&&x| x == value).count();
		if run >= 3 {
			flush_literal(&mut out, &data[literal_start..pos]);
			let extra = run - 2;
			if extra > 0x1F {
				out.push(0xE0 | (extra & 0x1F) as u8);
				out.push((extra >> 5) as u8);
			} else {
				out.push(0xC0 | extra as u8);
			}
			out.push(value);
			pos += run;
			literal_start = pos;
		} else {
			pos += 1;
		}
	}
	flush_literal(&mut out, &data[literal_start..]);
	out
}

pub fn cps_file(payload: &[u8], seed_in_body: bool) -> Vec<u8> {
	let mut body = rle_encode(payload);
	body.resize(body.len().div_ceil(4) * 4, 0);
	let packed_size = 20 + body.len() + 4;
	let mut plain = b"CPS\0".to_vec();
	plain.extend((packed_size as u32).to_le_bytes());
	plain.extend(0x66u16.to_le_bytes());
	plain.extend([1, 0]);
	plain.extend((payload.len() as u32).to_le_bytes());
	plain.extend([0; 4]);
	plain.extend(body);
	let seed_offset = if seed_in_body {20} else {plain.len() as u32};
	obfuscate(&plain, seed_offset)
}

pub fn prt_header(version: u16, depth: u16, palette_pos: u16, pixel_pos: u16, width: u16, height: u16, alpha: u32) -> Vec<u8> {
	let mut buf = b"PRT\0".to_vec();
	for x in [version, depth, palette_pos, pixel_pos, width, height] {
		buf.extend(x.to_le_bytes());
	}
	buf.extend(alpha.to_le_bytes());
	buf
}

/// 8-bit paletted image whose palette entry `i` is BGR `(i, 255 - i, i / 2)`.
pub fn paletted_prt(width: u16, height: u16, index: impl Fn(u16, u16) -> u8) -> Vec<u8> {
	let mut buf = prt_header(0x65, 8, 20, 20 + 1024, width, height, 0);
	buf.extend((0..=255u8).flat_map(|i| [i, 255 - i, i / 2, 0]));
	let stride = (width as usize).div_ceil(4) * 4;
	for y in 0..height {
		let mut row: Vec<u8> = (0..width).map(|x| index(x, y)).collect();
		row.resize(stride, 0);
		buf.extend(row);
	}
	buf
}
