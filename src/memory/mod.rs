//! Byte-level view of a loaded executable image.

mod buffer;

pub use buffer::{Buffer, Segment};
