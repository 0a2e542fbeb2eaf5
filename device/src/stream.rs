//! Execution streams.
//!
//! A stream is an in-order queue of device work. Everything enqueued on one
//! stream executes in submission order, so a kernel launched after a copy on
//! the same stream observes the copied data without host synchronization.
//! The only blocking point is [`Stream::synchronize`].

use crate::error::Result;

pub trait Stream: Send + Sync + std::fmt::Debug {
    /// Identifier unique among live streams of the owning device.
    fn id(&self) -> u64;

    /// Block the host until all work enqueued so far has completed.
    fn synchronize(&self) -> Result<()>;
}
