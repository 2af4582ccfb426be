use std::borrow::Cow;
use log::debug;
use crate::{
	byte_slice::ByteSlice,
	error::{CpsError, Result},
	image::{Frame, Image, PixelFormat},
	pixels::{map_palette, mix_alpha, padded_stride},
	Certainty, Decoder
};

pub const ENTRY_PRT: Decoder<Image> = Decoder {
	id: "prt",
	desc: "KID PC image format",
	detect: |buf| {
		if buf.starts_with(b"PRT\0") {
			Certainty::Certain
		} else {
			Certainty::possible_if(buf.starts_with_at(b"PRT\0", 16))
		}
	},
	decode: |buf| {
		let buf = if buf.starts_with(b"PRT\0") {
			buf
		} else {
			buf.get(16..).unwrap_or_default()
		};
		PrtImage::parse(buf)?.to_image()
	}
};

/// A parsed PRT image, borrowing its planes from the decompressed payload.
#[derive(Clone, Debug)]
pub struct PrtImage<'a> {
	pub version: u16,
	pub color_depth: u16,
	pub width: u32,
	pub height: u32,
	/// Horizontal placement of sprites, only present in version 0x66.
	pub base_x: u32,
	/// Width from the short header fields, before any override.
	pub base_width: u32,
	/// Byte distance between colour plane rows.
	pub line_length: usize,
	pub palette: Option<&'a [u8]>,
	pub pixels: &'a [u8],
	pub alpha: Option<&'a [u8]>
}

/// Display-ready pixel data, still bottom-up BGR(A) like the source planes.
#[derive(Clone, Debug)]
pub struct Raster<'a> {
	pub width: u32,
	pub height: u32,
	pub color_depth: u16,
	pub line_length: usize,
	pub data: Cow<'a, [u8]>
}

impl<'a> PrtImage<'a> {
	pub fn parse(buf: &'a [u8]) -> Result<Self> {
		if !buf.starts_with(b"PRT\0") {
			return Err(CpsError::Format("missing PRT magic".into()));
		}
		let version = buf.read_u16(4, "version")?;
		let color_depth = buf.read_u16(6, "color depth")?;
		let palette_pos = buf.read_u16(8, "palette offset")? as usize;
		let pixel_pos = buf.read_u16(10, "pixel offset")? as usize;
		let base_width = buf.read_u16(12, "width")? as u32;
		let base_height = buf.read_u16(14, "height")? as u32;
		let has_alpha = buf.read_u32(16, "alpha flag")? != 0;
		let (base_x, width_override, height_override) = match version {
			0x66 => (buf.read_u32(20, "base x")?, buf.read_u32(28, "full width")?, buf.read_u32(32, "full height")?),
			0x65 => (0, 0, 0),
			_ => return Err(CpsError::Format(format!("unsupported prt version {version:#x}")))
		};

		let palette = if pixel_pos > palette_pos {
			let palette = buf.get(palette_pos..pixel_pos)
				.ok_or_else(|| CpsError::Format(format!("palette at {palette_pos:#x}..{pixel_pos:#x} is out of bounds")))?;
			let expected = 1usize.checked_shl(color_depth as u32).and_then(|x| x.checked_mul(4));
			if expected != Some(palette.len()) {
				return Err(CpsError::Format(format!("palette of {} bytes for color depth {color_depth}", palette.len())));
			}
			Some(palette)
		} else {
			None
		};

		let width = if width_override != 0 {width_override} else {base_width};
		let height = if height_override != 0 {height_override} else {base_height};
		if color_depth % 8 != 0 {
			return Err(CpsError::Format(format!("unsupported color depth {color_depth}")));
		}
		let bytes_per_pixel = (color_depth / 8) as usize;
		let line_length = (width as usize).checked_mul(bytes_per_pixel).and_then(padded_stride)
			.ok_or_else(|| CpsError::Geometry(format!("{width} pixels at {color_depth} bits overflows")))?;
		let plane_len = line_length.checked_mul(height as usize)
			.ok_or_else(|| CpsError::Geometry(format!("{width}x{height} overflows")))?;

		let body = buf.get(pixel_pos..).unwrap_or_default();
		let (pixels, rest) = body.split_at(plane_len.min(body.len()));
		debug!(
			"prt v{version:#x}: {width}x{height} at {color_depth} bits, line length {line_length}, palette {}, alpha {has_alpha}",
			palette.is_some()
		);
		Ok(Self {
			version, color_depth, width, height, base_x, base_width, line_length, palette, pixels,
			alpha: has_alpha.then_some(rest)
		})
	}

	/// Resolves palette and alpha into a 24 or 32 bit raster.
	pub fn to_raster(&self) -> Result<Raster<'a>> {
		let (width, height) = (self.width as i64, self.height as i64);
		let (color_depth, line_length, data) = match (self.palette, self.alpha) {
			(Some(palette), _) => {
				if self.color_depth != 8 {
					return Err(CpsError::Format(format!("paletted {} bit images are unsupported", self.color_depth)));
				}
				let data = map_palette(self.pixels, palette, width, height)?;
				let line_length = (self.width as usize).checked_mul(3).and_then(padded_stride)
					.ok_or_else(|| CpsError::Geometry(format!("{} pixel rows overflow", self.width)))?;
				(24, line_length, Cow::Owned(data))
			}
			(None, Some(alpha)) => {
				if self.color_depth != 24 {
					return Err(CpsError::Format(format!("unsupported color depth {} with alpha data", self.color_depth)));
				}
				let data = mix_alpha(self.pixels, alpha, width, height, self.line_length as i64)?;
				(32, self.width as usize * 4, Cow::Owned(data))
			}
			(None, None) => (self.color_depth, self.line_length, Cow::Borrowed(self.pixels))
		};
		Ok(Raster {width: self.width, height: self.height, color_depth, line_length, data})
	}

	pub fn source_format(&self) -> Option<PixelFormat> {
		match (self.palette, self.alpha, self.color_depth) {
			(Some(_), _, 8) => Some(PixelFormat::BgrxClut8),
			(None, Some(_), 24) | (None, None, 32) => Some(PixelFormat::Bgra),
			(None, None, 24) => Some(PixelFormat::Bgr),
			_ => None
		}
	}

	pub fn to_image(&self) -> Result<Image> {
		let mut frame = self.to_raster()?.to_frame()?;
		if let Some(og_fmt) = self.source_format() {
			debug!("prt stored as {og_fmt}");
			frame = frame.with_og_fmt(og_fmt);
		}
		Ok(Image {frames: Box::new([frame])})
	}
}

impl Raster<'_> {
	pub fn to_frame(&self) -> Result<Frame> {
		let bytes_per_pixel = match self.color_depth {
			24 => 3,
			32 => 4,
			x => return Err(CpsError::Format(format!("cannot display {x} bit rasters")))
		};
		let (w, h) = (self.width as usize, self.height as usize);
		if h > 0 {
			let needed = (h - 1).checked_mul(self.line_length)
				.and_then(|x| x.checked_add(w.checked_mul(bytes_per_pixel)?));
			if needed.is_none_or(|needed| needed > self.data.len()) {
				return Err(CpsError::InsufficientData(format!("{} byte raster for {w}x{h} at line length {}", self.data.len(), self.line_length)));
			}
		}
		Ok(Frame::from_bgr_bottom_up(self.width, self.height, self.line_length, bytes_per_pixel, &self.data))
	}
}
