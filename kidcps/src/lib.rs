//! Decoding of CPS image assets from KID's PC visual novel ports.
//!
//! A raw asset goes through three stages:
//!
//! 1. [`deobfuscate`] strips the keystream masking and the 4-byte trailer,
//! 2. [`rle_decode`] expands the compressed stream to its declared size,
//! 3. [`map_palette`] or [`mix_alpha`] turn the planes into a displayable raster.
//!
//! [`decode_cps`] runs the whole chain for a CPS file holding a PRT image, and
//! [`auto_decode_full`] does the same by probing the registered decoders.

use log::debug;
use crate::image::Image;

pub mod error;
pub mod byte_slice;
pub mod image;
pub mod obfuscation;
pub mod rle;
pub mod pixels;
pub mod data_formats;
pub use data_formats::DATA_DECODERS;
pub mod image_formats;
pub use image_formats::IMAGE_DECODERS;

pub use error::{CpsError, CpsErrorKind, Result};
pub use obfuscation::deobfuscate;
pub use rle::rle_decode;
pub use pixels::{map_palette, mix_alpha, Geometry};

pub enum Certainty {
	Impossible,
	Possible,
	Certain
}

impl Certainty {
	pub const fn certain_if(cond: bool) -> Self {
		if cond {
			Self::Certain
		} else {
			Self::Impossible
		}
	}

	pub const fn possible_if(cond: bool) -> Self {
		if cond {
			Self::Possible
		} else {
			Self::Impossible
		}
	}
}

#[derive(Clone, Copy)]
pub struct Decoder<T> {
	id: &'static str,
	desc: &'static str,
	detect: fn(data: &[u8]) -> Certainty,
	decode: fn(data: &[u8]) -> Result<T>
}

impl<T> Decoder<T> {
	pub fn id(&self) -> &'static str {
		self.id
	}

	pub fn desc(&self) -> &'static str {
		self.desc
	}

	pub fn detect(&self, data: &[u8]) -> Certainty {
		(self.detect)(data)
	}

	pub fn decode_bytes(&self, data: &[u8]) -> Result<T> {
		(self.decode)(data)
	}
}

pub enum DynData {
	Raw(Box<[u8]>),
	Image(Image)
}

impl From<Box<[u8]>> for DynData {
	fn from(value: Box<[u8]>) -> Self {
		Self::Raw(value)
	}
}

impl From<Image> for DynData {
	fn from(value: Image) -> Self {
		Self::Image(value)
	}
}

fn decode_step<T: Into<DynData>>(data: &[u8], decoders: &[Decoder<T>], disallow_id: Option<&'static str>, discard_low_confidence: bool) -> Result<Option<(&'static str, DynData)>> {
	for decoder in decoders {
		if let Certainty::Certain = decoder.detect(data) {
			if Some(decoder.id) == disallow_id {
				return Ok(None);
			}
			debug!("{} bytes detected as {}", data.len(), decoder.id);
			return decoder.decode_bytes(data).map(|x| Some((decoder.id, x.into())));
		}
	}
	if !discard_low_confidence {
		for decoder in decoders {
			if Some(decoder.id) != disallow_id {
				if let Certainty::Possible = decoder.detect(data) {
					match decoder.decode_bytes(data) {
						Ok(x) => return Ok(Some((decoder.id, x.into()))),
						Err(e) => debug!("{} looked possible but failed: {e}", decoder.id)
					}
				}
			}
		}
	}
	Ok(None)
}

/// Runs the first matching decoder, images before raw data.
///
/// `disallow_id` stops a decoder from being applied to its own output.
pub fn auto_decode_step(data: &[u8], disallow_id: Option<&'static str>, discard_low_confidence: bool) -> Result<(&'static str, DynData)> {
	if let Some(x) = decode_step(data, &IMAGE_DECODERS, disallow_id, discard_low_confidence)? {
		return Ok(x);
	}
	if let Some(x) = decode_step(data, &DATA_DECODERS, disallow_id, discard_low_confidence)? {
		return Ok(x);
	}
	Err(CpsError::Format("could not fully decode file".into()))
}

pub struct DecodeResult {
	pub data: DynData,
	pub steps_taken: Vec<&'static str>,
	pub error: Option<CpsError>
}

/// Keeps decoding until an image comes out or nothing matches any more.
pub fn auto_decode_full(initial_data: &[u8]) -> DecodeResult {
	let mut steps_taken = Vec::<&'static str>::new();
	let mut cur_data: Option<Box<[u8]>> = None;
	loop {
		match auto_decode_step(cur_data.as_deref().unwrap_or(initial_data), steps_taken.last().cloned(), false) {
			Ok((id, decoded)) => {
				steps_taken.push(id);
				if let DynData::Raw(new_data) = decoded {
					cur_data = Some(new_data);
				} else {
					return DecodeResult {
						data: decoded,
						steps_taken,
						error: None
					}
				}
			}
			Err(e) => {
				return DecodeResult {
					data: DynData::Raw(cur_data.unwrap_or_else(|| initial_data.into())),
					steps_taken,
					error: Some(e)
				}
			}
		}
	}
}

/// Decodes a raw CPS file holding a PRT image.
pub fn decode_cps(raw: &[u8]) -> Result<Image> {
	let payload = data_formats::cps::unpack(raw)?;
	image_formats::prt::PrtImage::parse(&payload)?.to_image()
}
