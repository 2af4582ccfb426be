use thiserror::Error;

/// Everything that can go wrong while turning a CPS asset into pixels.
///
/// All variants are terminal for the asset being decoded. Nothing here is
/// transient, so callers should never retry.
#[derive(Debug, Error)]
pub enum CpsError {
	/// Malformed obfuscation trailer, bad container/image header, or an
	/// undersized palette/indexed plane.
	#[error("format error: {0}")]
	Format(String),
	/// The compressed stream is inconsistent with the requested output size.
	#[error("decompression failed: {0}")]
	Decode(String),
	/// Caller supplied impossible image dimensions.
	#[error("invalid image dimensions / line length: {0}")]
	Geometry(String),
	/// Colour or alpha plane shorter than the geometry implies.
	#[error("insufficient input data: {0}")]
	InsufficientData(String),
	#[error("png encoding failed: {0}")]
	Png(#[from] png::EncodingError)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CpsErrorKind {
	Format,
	Decode,
	Geometry,
	InsufficientData,
	Png
}

impl CpsError {
	pub fn kind(&self) -> CpsErrorKind {
		match self {
			Self::Format(_) => CpsErrorKind::Format,
			Self::Decode(_) => CpsErrorKind::Decode,
			Self::Geometry(_) => CpsErrorKind::Geometry,
			Self::InsufficientData(_) => CpsErrorKind::InsufficientData,
			Self::Png(_) => CpsErrorKind::Png
		}
	}
}

pub type Result<T> = std::result::Result<T, CpsError>;
