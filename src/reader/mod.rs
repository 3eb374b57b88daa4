//! Reader Module
//!
//! Positioned stream handles over one backing byte source, and the pool
//! that shares them across concurrent query threads.
//!
//! A [`Reader`] is cheap but not free (a file-backed reader owns an open
//! handle), so query paths borrow one from the [`ReaderPool`] for exactly
//! the duration of a decode or a range traversal. The [`PooledReader`]
//! guard returns the reader to the idle set when dropped, on every exit
//! path including early iterator abandonment and propagated errors.

mod pool;
mod source;
mod stream;

pub use pool::{PooledReader, ReaderPool};
pub use source::Source;
pub use stream::Reader;
