//! Turning decompressed planes into displayable rasters.

use crate::error::{CpsError, Result};

/// Image dimensions plus the byte distance between row starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
	pub width: usize,
	pub height: usize,
	pub line_length: usize
}

impl Geometry {
	pub fn new(width: i64, height: i64, line_length: i64) -> Result<Self> {
		let dim = |value: i64, name: &str| usize::try_from(value)
			.map_err(|_| CpsError::Geometry(format!("{name} of {value}")));
		Ok(Self {
			width: dim(width, "width")?,
			height: dim(height, "height")?,
			line_length: dim(line_length, "line length")?
		})
	}

	pub fn pixel_count(&self) -> Result<usize> {
		self.width.checked_mul(self.height)
			.ok_or_else(|| CpsError::Geometry(format!("{}x{} overflows", self.width, self.height)))
	}
}

/// Rows are padded to 32-bit boundaries. `None` if the padded size overflows.
pub const fn padded_stride(row_bytes: usize) -> Option<usize> {
	row_bytes.checked_next_multiple_of(4)
}

fn checked(value: Option<usize>, what: &str) -> Result<usize> {
	value.ok_or_else(|| CpsError::Geometry(format!("{what} overflows")))
}

/// Expands 8-bit palette indices into padded 3-byte pixels.
///
/// Palette entries are 4 bytes each; only the first three are copied.
pub fn map_palette(indexed: &[u8], palette: &[u8], width: i64, height: i64) -> Result<Vec<u8>> {
	let Geometry {width, height, ..} = Geometry::new(width, height, 0)?;
	let in_stride = checked(padded_stride(width), "indexed row size")?;
	let out_stride = checked(width.checked_mul(3).and_then(padded_stride), "row size")?;
	let needed = checked(in_stride.checked_mul(height), "indexed plane size")?;
	if needed > indexed.len() {
		return Err(CpsError::Format(format!("{width}x{height} indexed image needs {needed} bytes, got {}", indexed.len())));
	}
	let mut out = vec![0u8; checked(out_stride.checked_mul(height), "raster size")?];
	if width == 0 {
		return Ok(out);
	}
	for (src_row, dst_row) in indexed.chunks(in_stride).zip(out.chunks_exact_mut(out_stride)) {
		for (&index, dst) in src_row[..width].iter().zip(dst_row.chunks_exact_mut(3)) {
			let entry = index as usize * 4;
			let color = palette.get(entry..entry + 3).ok_or_else(|| CpsError::Format(
				format!("palette index {index} beyond {} byte palette", palette.len())
			))?;
			dst.copy_from_slice(color);
		}
	}
	Ok(out)
}

/// Interleaves a 3-byte colour plane with an 8-bit alpha plane.
///
/// The alpha plane is stored upside down relative to the colour plane, so
/// output row `y` takes alpha row `height - 1 - y`, counted from the end of
/// `alpha`. Output rows are tightly packed.
pub fn mix_alpha(rgb: &[u8], alpha: &[u8], width: i64, height: i64, line_length: i64) -> Result<Vec<u8>> {
	let geometry = Geometry::new(width, height, line_length)?;
	let Geometry {width, height, line_length} = geometry;
	let pixels = geometry.pixel_count()?;
	let out_len = checked(pixels.checked_mul(4), "raster size")?;
	let row_bytes = checked(width.checked_mul(3), "row size")?;
	// the last row may stop short of a full line
	let rgb_span = match height {
		0 => 0,
		_ => checked((height - 1).checked_mul(line_length).and_then(|x| x.checked_add(row_bytes)), "colour plane size")?
	};
	if rgb.len() < pixels * 3 || rgb.len() < rgb_span {
		return Err(CpsError::InsufficientData(format!("colour plane of {} bytes for {width}x{height} at line length {line_length}", rgb.len())));
	}
	if alpha.len() < pixels {
		return Err(CpsError::InsufficientData(format!("alpha plane of {} bytes for {width}x{height}", alpha.len())));
	}

	let mut out = vec![0u8; out_len];
	if width == 0 {
		return Ok(out);
	}
	for (y, dst_row) in out.chunks_exact_mut(width * 4).enumerate() {
		let src_row = &rgb[y * line_length..][..row_bytes];
		let alpha_row = &alpha[alpha.len() - (y + 1) * width..][..width];
		for ((dst, src), &a) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(3)).zip(alpha_row) {
			dst[..3].copy_from_slice(src);
			dst[3] = a;
		}
	}
	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::CpsErrorKind;

	fn test_palette() -> Vec<u8> {
		(0..=255u8).flat_map(|i| [i, i.wrapping_mul(2), 255 - i, 0xEE]).collect()
	}

	#[test]
	fn strides() {
		assert_eq!(padded_stride(5), Some(8));
		assert_eq!(padded_stride(15), Some(16));
		assert_eq!(padded_stride(12), Some(12));
		assert_eq!(padded_stride(0), Some(0));
		assert_eq!(padded_stride(usize::MAX), None);
	}

	#[test]
	fn palette_rows_skip_padding() {
		let indexed = [1, 2, 3, 4, 5, 9, 9, 9, 10, 11, 12, 13, 14, 9, 9, 9];
		let out = map_palette(&indexed, &test_palette(), 5, 2).unwrap();
		assert_eq!(out.len(), 32);
		assert_eq!(&out[0..3], &[1, 2, 254]);
		assert_eq!(&out[12..16], &[5, 10, 250, 0]);
		assert_eq!(&out[16..19], &[10, 20, 245]);
		assert_eq!(&out[28..32], &[14, 28, 241, 0]);
		// padding index 9 maps to [9, 18, 246], which must never show up
		assert!(!out.windows(3).any(|w| w == [9, 18, 246]));
	}

	#[test]
	fn palette_needs_padded_rows() {
		let indexed = [0u8; 15];
		assert_eq!(map_palette(&indexed, &test_palette(), 5, 2).unwrap_err().kind(), CpsErrorKind::Format);
	}

	#[test]
	fn palette_index_out_of_range() {
		let short_palette = [0u8; 16];
		assert_eq!(map_palette(&[4, 0, 0, 0], &short_palette, 1, 1).unwrap_err().kind(), CpsErrorKind::Format);
		assert_eq!(map_palette(&[3, 0, 0, 0], &short_palette, 1, 1).unwrap(), vec![0, 0, 0, 0]);
	}

	#[test]
	fn palette_empty_image() {
		assert!(map_palette(&[], &[], 0, 7).unwrap().is_empty());
		assert!(map_palette(&[], &[], 3, 0).unwrap().is_empty());
	}

	#[test]
	fn alpha_plane_is_flipped() {
		let rgb = [1, 2, 3, 4, 5, 6, 0, 0, 7, 8, 9, 10, 11, 12, 0, 0];
		let alpha = [0xA0, 0xA1, 0xA2, 0xA3];
		let out = mix_alpha(&rgb, &alpha, 2, 2, 8).unwrap();
		assert_eq!(out, vec![
			1, 2, 3, 0xA2, 4, 5, 6, 0xA3,
			7, 8, 9, 0xA0, 10, 11, 12, 0xA1
		]);
	}

	#[test]
	fn alpha_is_read_from_the_end() {
		let rgb = [1, 2, 3];
		let out = mix_alpha(&rgb, &[0x11, 0x22, 0x33], 1, 1, 3).unwrap();
		assert_eq!(out, vec![1, 2, 3, 0x33]);
	}

	#[test]
	fn negative_geometry_is_rejected() {
		assert_eq!(mix_alpha(&[], &[], -1, 1, 0).unwrap_err().kind(), CpsErrorKind::Geometry);
		assert_eq!(mix_alpha(&[], &[], 1, -1, 0).unwrap_err().kind(), CpsErrorKind::Geometry);
		assert_eq!(mix_alpha(&[], &[], 1, 1, -3).unwrap_err().kind(), CpsErrorKind::Geometry);
		assert_eq!(map_palette(&[], &[], -5, 1).unwrap_err().kind(), CpsErrorKind::Geometry);
	}

	#[test]
	fn oversized_rows_are_rejected() {
		// zero height leaves no pixels, but the row size still has to fit
		assert_eq!(mix_alpha(&[], &[], i64::MAX, 0, 0).unwrap_err().kind(), CpsErrorKind::Geometry);
		let third = (usize::MAX / 3) as i64;
		assert_eq!(map_palette(&[], &[], third, 0).unwrap_err().kind(), CpsErrorKind::Geometry);
	}

	#[test]
	fn short_planes_are_rejected() {
		assert_eq!(mix_alpha(&[0; 11], &[0; 4], 2, 2, 6).unwrap_err().kind(), CpsErrorKind::InsufficientData);
		assert_eq!(mix_alpha(&[0; 12], &[0; 3], 2, 2, 6).unwrap_err().kind(), CpsErrorKind::InsufficientData);
		// enough bytes in total, but the strided second row would run off the end
		assert_eq!(mix_alpha(&[0; 12], &[0; 4], 2, 2, 8).unwrap_err().kind(), CpsErrorKind::InsufficientData);
		assert!(mix_alpha(&[0; 14], &[0; 4], 2, 2, 8).is_ok());
	}
}
