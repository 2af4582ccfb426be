use log::debug;
use crate::{byte_slice::ByteSlice, error::{CpsError, Result}, obfuscation::deobfuscate, rle::rle_decode, Certainty, Decoder};

pub const HEADER_LEN: usize = 20;
const TYPE_ID: u16 = 0x66;

pub const ENTRY_CPS: Decoder<Box<[u8]>> = Decoder {
	id: "cps",
	desc: "KID PC obfuscated compression format",
	detect: |buf| Certainty::certain_if(buf.starts_with(b"CPS\0")),
	decode: |buf| unpack(buf).map(Vec::into_boxed_slice)
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
	Stored,
	Rle
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CpsHeader {
	pub packed_size: u32,
	pub compression: Compression,
	pub unpacked_size: u32
}

impl CpsHeader {
	pub fn parse(buf: &[u8]) -> Result<Self> {
		if buf.len() < HEADER_LEN {
			return Err(CpsError::Format(format!("{} bytes is shorter than the {HEADER_LEN} byte cps header", buf.len())));
		}
		if !buf.starts_with(b"CPS\0") {
			return Err(CpsError::Format(format!("unexpected magic {:02x?}", &buf[..4])));
		}
		let packed_size = buf.read_u32(4, "packed size")?;
		if packed_size as usize != buf.len() {
			return Err(CpsError::Format(format!("packed size {packed_size} does not match file size {}", buf.len())));
		}
		let type_id = buf.read_u16(8, "type id")?;
		if type_id != TYPE_ID {
			return Err(CpsError::Format(format!("unexpected type id {type_id:#x}")));
		}
		let unpacked_size = buf.read_u32(12, "unpacked size")?;
		let compression = match buf.read_u8(10, "compression type")? {
			x if x & 1 != 0 => Compression::Rle,
			0 => {
				if (packed_size as u64) < unpacked_size as u64 + HEADER_LEN as u64 {
					return Err(CpsError::Format(format!("stored payload of {unpacked_size} bytes does not fit in {packed_size}")));
				}
				Compression::Stored
			}
			x => return Err(CpsError::Format(format!("unsupported compression type {x:#x}")))
		};
		Ok(Self {packed_size, compression, unpacked_size})
	}
}

/// Deobfuscates and decompresses a whole cps file, returning the contained payload.
pub fn unpack(buf: &[u8]) -> Result<Vec<u8>> {
	let header = CpsHeader::parse(buf)?;
	debug!("cps: {:?}, {} -> {} bytes", header.compression, header.packed_size, header.unpacked_size);
	let mut data = buf.to_vec();
	deobfuscate(&mut data)?;
	let body = data.get(HEADER_LEN..).unwrap_or_default();
	let unpacked_size = header.unpacked_size as usize;
	match header.compression {
		Compression::Rle => rle_decode(body, unpacked_size),
		Compression::Stored => body.get(..unpacked_size).map(<[u8]>::to_vec).ok_or_else(|| CpsError::Format(
			format!("stored payload of {unpacked_size} bytes, only {} left after deobfuscation", body.len())
		))
	}
}
