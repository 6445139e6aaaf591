//! Transfer-coding negotiation.

/// Content coding of the stored artifacts.
pub const GZIP_CODING: &str = "gzip";

/// Reports whether `coding` is one of the comma separated tokens of any of
/// the given `Accept-Encoding` values. Tokens are trimmed and compared
/// exactly, so `gzip;q=0` or `GZIP` do not match.
pub fn accepts_coding<'a, I>(header_values: I, coding: &str) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    header_values
        .into_iter()
        .flat_map(|value| value.split(','))
        .any(|token| token.trim() == coding)
}
