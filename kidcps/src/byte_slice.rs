use crate::error::{CpsError, Result};

macro_rules! impl_byte_readers {
	($($t:ident),*) => {paste::paste! {$(
		fn [<read_ $t>](&self, offset: usize, name: &'static str) -> Result<$t> {
			self.[<get_ $t _at>](offset).ok_or_else(|| CpsError::Format(format!("could not read {name} at offset {offset}")))
		}
		fn [<get_ $t _at>](&self, offset: usize) -> Option<$t> {
			let end = offset.checked_add(size_of::<$t>())?;
			Some(<$t>::from_le_bytes(self.get(offset..end)?.try_into().ok()?))
		}
	)*}}
}

/// Little-endian field access that never panics on short buffers.
pub trait ByteSlice {
	fn read_u8(&self, offset: usize, name: &'static str) -> Result<u8>;
	fn read_u16(&self, offset: usize, name: &'static str) -> Result<u16>;
	fn read_u32(&self, offset: usize, name: &'static str) -> Result<u32>;
	fn get_u8_at(&self, offset: usize) -> Option<u8>;
	fn get_u16_at(&self, offset: usize) -> Option<u16>;
	fn get_u32_at(&self, offset: usize) -> Option<u32>;
	fn starts_with_at(&self, needle: &[u8], offset: usize) -> bool;
}

impl ByteSlice for [u8] {
	impl_byte_readers!(u8, u16, u32);

	fn starts_with_at(&self, needle: &[u8], offset: usize) -> bool {
		self.get(offset..).is_some_and(|x| x.starts_with(needle))
	}
}
