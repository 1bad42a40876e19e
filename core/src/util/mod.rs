mod ring_bytes;
mod text;

pub use ring_bytes::RingBytes;
pub use text::{tail_chars, truncate_chars};
