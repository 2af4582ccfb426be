use std::sync::LazyLock;
use super::Decoder;

pub mod cps;

pub static DATA_DECODERS: LazyLock<Vec<Decoder<Box<[u8]>>>> = LazyLock::new(|| [
	cps::ENTRY_CPS
].into());
