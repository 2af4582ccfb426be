use std::fmt::Display;
use bytemuck::{Pod, Zeroable};
use crate::error::Result;

/// How the pixels were stored before being converted to RGBA.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
	Bgra,
	Bgr,
	BgrxClut8
}

impl Display for PixelFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Bgra => write!(f, "BGRA"),
			Self::Bgr => write!(f, "BGR"),
			Self::BgrxClut8 => write!(f, "BGRX clut8")
		}
	}
}

#[repr(C)]
#[derive(Zeroable, Pod, Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct Pixel {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: u8
}

#[derive(Debug)]
pub struct Frame {
	pub width: u32,
	pub height: u32,
	pub og_fmt: PixelFormat,
	pub pixels: Box<[Pixel]>
}

impl Frame {
	/// Reads BGR or BGRA rows stored bottom row first, `stride` bytes apart.
	///
	/// Panics unless `bytes_per_pixel` is 3 or 4 and `buf` holds every row.
	pub fn from_bgr_bottom_up(width: u32, height: u32, stride: usize, bytes_per_pixel: usize, buf: &[u8]) -> Self {
		assert!(bytes_per_pixel == 3 || bytes_per_pixel == 4);
		let w = width as usize;
		let h = height as usize;
		if h > 0 {
			assert!(buf.len() >= (h - 1) * stride + w * bytes_per_pixel);
		}
		let mut pixels = Vec::with_capacity(w * h);
		for y in (0..h).rev() {
			let row = &buf[y * stride..][..w * bytes_per_pixel];
			pixels.extend(row.chunks_exact(bytes_per_pixel).map(|x| Pixel {
				r: x[2],
				g: x[1],
				b: x[0],
				a: if bytes_per_pixel == 4 {x[3]} else {255}
			}));
		}
		Self {
			width, height,
			og_fmt: if bytes_per_pixel == 4 {PixelFormat::Bgra} else {PixelFormat::Bgr},
			pixels: pixels.into()
		}
	}

	pub fn with_og_fmt(mut self, og_fmt: PixelFormat) -> Self {
		self.og_fmt = og_fmt;
		self
	}

	pub fn row(&self, y: u32) -> &[Pixel] {
		let w = self.width as usize;
		&self.pixels[y as usize * w..y as usize * w + w]
	}

	pub fn as_rgba_bytes(&self) -> &[u8] {
		bytemuck::cast_slice(&self.pixels)
	}

	/// Encodes the frame as an RGBA8 PNG in memory.
	pub fn to_png(&self) -> Result<Vec<u8>> {
		let mut out = Vec::new();
		let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
		encoder.set_color(png::ColorType::Rgba);
		encoder.set_depth(png::BitDepth::Eight);
		let mut writer = encoder.write_header()?;
		writer.write_image_data(self.as_rgba_bytes())?;
		writer.finish()?;
		Ok(out)
	}
}

#[derive(Debug)]
pub struct Image {
	pub frames: Box<[Frame]>
}
