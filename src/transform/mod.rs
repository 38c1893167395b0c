//! Byte-level boundaries: queue bodies in, stored records out.
pub mod decode;
pub mod encode;
