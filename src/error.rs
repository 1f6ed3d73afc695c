//! Errors returned by the display session.

use core::fmt;

/// Display session errors, generic over the error type of the [`DeviceSurface`].
///
/// Text that cannot be rendered is not an error: unsupported characters are replaced by a
/// placeholder glyph and the print continues.
///
/// [`DeviceSurface`]: crate::DeviceSurface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The transport failed after its own retries.
    Bus(E),
    /// Raw graph type code does not name a known bar graph.
    UnsupportedGraphType,
    /// A draw call was made without a matching graph type being initialized.
    RendererNotInitialized,
    /// Glyph slot outside of 0..=7.
    InvalidSlot,
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::Bus(e)
    }
}

impl<E> Error<E> {
    fn message(&self) -> &'static str {
        match self {
            Error::Bus(_) => "bus transfer failed",
            Error::UnsupportedGraphType => "unsupported graph type",
            Error::RendererNotInitialized => "bar graph renderer not initialized",
            Error::InvalidSlot => "glyph slot out of range",
        }
    }
}

impl<E> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl<E> ufmt::uDisplay for Error<E> {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Nack;

    fn lift() -> Result<(), Error<Nack>> {
        let r: Result<(), Nack> = Err(Nack);
        r?;
        Ok(())
    }

    #[test]
    fn test_bus_error_lifts_with_question_mark() {
        assert_eq!(lift(), Err(Error::Bus(Nack)));
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::<Nack>::RendererNotInitialized.to_string(),
            "bar graph renderer not initialized"
        );
        assert_eq!(Error::Bus(Nack).to_string(), "bus transfer failed");
    }

    #[test]
    fn test_udisplay_matches_display() {
        let mut out = heapless::String::<64>::new();
        ufmt::uwrite!(out, "{}", Error::<Nack>::InvalidSlot).unwrap();
        assert_eq!(out.as_str(), Error::<Nack>::InvalidSlot.to_string());
    }
}
