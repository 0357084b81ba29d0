use std::fmt;

use miette::{Diagnostic, LabeledSpan, SourceSpan};
use nom::{
    IResult, Parser,
    error::{ErrorKind, ParseError},
};
use thiserror::Error;

pub type ParseResult<'a, O> = IResult<&'a str, O, ShorthandParseError<'a>>;

// Public API ==========================================================================================================

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("{kind}")]
pub struct ShorthandError {
    shorthand: String,
    span: SourceSpan,
    kind: ShorthandErrorKind,
}

impl ShorthandError {
    #[must_use]
    pub const fn kind(&self) -> ShorthandErrorKind {
        self.kind
    }

    #[must_use]
    pub const fn span(&self) -> SourceSpan {
        self.span
    }
}

impl Diagnostic for ShorthandError {
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.shorthand)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.kind.help()
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let label = self.kind.label();
        Some(Box::new(
            label
                .into_iter()
                .map(|l| LabeledSpan::new_with_span(Some(l.to_owned()), self.span)),
        ))
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Diagnostic, Error)]
pub enum ShorthandErrorKind {
    #[diagnostic(help("ether-linked chains are written like O-16:0 (alkyl) or P-18:0 (alkenyl)"))]
    #[error("expected '-' after the linkage prefix")]
    ExpectedLinkageSeparator,

    #[error("expected a carbon count, like the 18 in 18:1")]
    ExpectedCarbons,

    #[diagnostic(help(
        "a carbon count can't start with 0, if you've mistakenly included a leading zero, like 018:1, try just \
        18:1 instead"
    ))]
    #[error("counts cannot start with 0")]
    ExpectedNoLeadingZero,

    #[error("expected ':' to separate the carbon and double-bond counts")]
    ExpectedColon,

    #[error("expected a double-bond count, like the 1 in 18:1")]
    ExpectedDoubleBonds,

    #[diagnostic(help("a chain with n carbons can carry at most n - 1 double bonds"))]
    #[error("the chain has more double bonds than its carbon backbone can hold")]
    TooManyDoubleBonds,

    #[diagnostic(help(
        "check the unparsed region for errors, or remove it from the rest of the shorthand"
    ))]
    #[error("could not interpret the full input as a fatty acid shorthand")]
    Incomplete,

    #[diagnostic(help(
        "this is an internal error that you shouldn't ever see! If you have gotten this error, then please report \
        it as a bug!"
    ))]
    #[error("internal `nom` error: {0:?}")]
    NomError(ErrorKind),
}

impl ShorthandErrorKind {
    const fn label(self) -> Option<&'static str> {
        Some(match self {
            Self::ExpectedLinkageSeparator => "expected '-'",
            Self::ExpectedCarbons => "expected a carbon count",
            Self::ExpectedNoLeadingZero => "expected non-zero",
            Self::ExpectedColon => "expected ':'",
            Self::ExpectedDoubleBonds => "expected a double-bond count",
            Self::TooManyDoubleBonds => "too many double bonds",
            Self::Incomplete => "input was valid up until this point",
            Self::NomError(_) => "the region that triggered this bug!",
        })
    }
}

// Parser Error Plumbing ===============================================================================================

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ShorthandParseError<'a> {
    input: &'a str,
    length: usize,
    kind: ShorthandErrorKind,
}

impl<'a> ShorthandParseError<'a> {
    pub(crate) const fn new(input: &'a str, kind: ShorthandErrorKind) -> Self {
        Self {
            input,
            length: 0,
            kind,
        }
    }

    pub(crate) const fn with_length(input: &'a str, length: usize, kind: ShorthandErrorKind) -> Self {
        Self {
            input,
            length,
            kind,
        }
    }

    // NOTE: `self.input` is always a suffix of `full_input`, so the offset can be recovered from the lengths alone
    pub(crate) fn into_final_error(self, full_input: &str) -> ShorthandError {
        let start = full_input.len() - self.input.len();
        // NOTE: The additional space is added so that labels can point to the end of an input
        ShorthandError {
            shorthand: format!("{full_input} "),
            span: SourceSpan::from(start..start + self.length),
            kind: self.kind,
        }
    }
}

impl<'a> ParseError<&'a str> for ShorthandParseError<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        let kind = match kind {
            ErrorKind::Eof => ShorthandErrorKind::Incomplete,
            kind => ShorthandErrorKind::NomError(kind),
        };
        Self::new(input, kind)
    }

    fn append(_input: &str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

/// Replaces any error raised by `parser` with one of `kind`, keeping the `Error` / `Failure` distinction intact
pub(crate) fn expect<'a, O, P>(
    mut parser: P,
    kind: ShorthandErrorKind,
) -> impl FnMut(&'a str) -> ParseResult<'a, O>
where
    P: Parser<&'a str, O, ShorthandParseError<'a>>,
{
    move |i| {
        parser
            .parse(i)
            .map_err(|e| e.map(|_| ShorthandParseError::new(i, kind)))
    }
}
