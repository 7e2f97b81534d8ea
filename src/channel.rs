//! Capabilities the prober polls.
//!
//! - [`Channel`] answers "is a message from `(source, tag)` ready?" without
//!   consuming it, or blocks until one is.
//! - [`Request`] is a handle to a non-blocking operation that was already
//!   started (a receive, a reduction, a barrier...), which can be tested for
//!   completion or waited on.
//!
//! Both report failures through their own `Error` type. The prober returns
//! those errors exactly as received.

/// Message channel with a non-blocking readiness test and a blocking wait.
///
/// Implementations must allow `test_ready` to be called repeatedly with no
/// effect on the queued messages.
pub trait Channel {
    /// Sender selector. May include a wildcard if the channel supports one.
    type Source: Copy;
    /// Message tag selector. May include a wildcard if the channel supports one.
    type Tag: Copy;
    type Error;

    /// Returns `true` iff a message matching `(source, tag)` is available now.
    fn test_ready(&self, source: Self::Source, tag: Self::Tag) -> Result<bool, Self::Error>;

    /// Blocks until a message matching `(source, tag)` is available.
    fn wait_ready(&self, source: Self::Source, tag: Self::Tag) -> Result<(), Self::Error>;
}

impl<C: Channel + ?Sized> Channel for &C {
    type Source = C::Source;
    type Tag = C::Tag;
    type Error = C::Error;

    #[inline]
    fn test_ready(&self, source: Self::Source, tag: Self::Tag) -> Result<bool, Self::Error> {
        (**self).test_ready(source, tag)
    }

    #[inline]
    fn wait_ready(&self, source: Self::Source, tag: Self::Tag) -> Result<(), Self::Error> {
        (**self).wait_ready(source, tag)
    }
}

/// Pending non-blocking operation.
pub trait Request {
    type Error;

    /// Returns `true` once the operation has completed.
    fn test(&mut self) -> Result<bool, Self::Error>;

    /// Blocks until the operation has completed.
    fn wait(&mut self) -> Result<(), Self::Error>;
}

impl<R: Request + ?Sized> Request for &mut R {
    type Error = R::Error;

    #[inline]
    fn test(&mut self) -> Result<bool, Self::Error> {
        (**self).test()
    }

    #[inline]
    fn wait(&mut self) -> Result<(), Self::Error> {
        (**self).wait()
    }
}
