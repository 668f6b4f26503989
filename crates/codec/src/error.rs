use std::fmt;

/// Errors that can occur while decoding a wire frame.
///
/// Mirrors the hand-rolled `Error` style used throughout this codec: no
/// `From` blanket impls, `Display` just prints the `Debug` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The buffer was shorter than the fixed header the layout requires.
    Truncated { expected: usize, got: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn require(buf: &[u8], len: usize) -> Result<()> {
    if buf.len() < len {
        Err(Error::Truncated {
            expected: len,
            got: buf.len(),
        })
    } else {
        Ok(())
    }
}
