use std::sync::LazyLock;
use crate::image::Image;
use super::Decoder;

pub mod prt;

pub static IMAGE_DECODERS: LazyLock<Vec<Decoder<Image>>> = LazyLock::new(|| [
	prt::ENTRY_PRT
].into());
