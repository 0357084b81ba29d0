use nom::{
    Err, Finish,
    branch::alt,
    character::complete::{char, u32},
    combinator::{all_consuming, consumed, cut, not, opt, value},
    sequence::{preceded, terminated, tuple},
};

use crate::{FattyAcid, Linkage};

use super::errors::{ParseResult, ShorthandError, ShorthandErrorKind, ShorthandParseError, expect};

/// Parses a complete fatty acid shorthand, rejecting any trailing input
pub fn parse_fatty_acid(shorthand: &str) -> Result<FattyAcid, ShorthandError> {
    all_consuming(fatty_acid)(shorthand)
        .finish()
        .map(|(_, fatty_acid)| fatty_acid)
        .map_err(|e| e.into_final_error(shorthand))
}

/// Fatty Acid = [ Linkage , "-" ] , Carbons , ":" , Double Bonds ;
pub fn fatty_acid(i: &str) -> ParseResult<FattyAcid> {
    let separator = expect(cut(char('-')), ShorthandErrorKind::ExpectedLinkageSeparator);
    let colon = expect(char(':'), ShorthandErrorKind::ExpectedColon);
    let chain = tuple((opt(terminated(linkage, separator)), carbons, colon, double_bonds));

    let (rest, (chain_text, (linkage, carbons, _, double_bonds))) = consumed(chain)(i)?;

    if double_bonds >= carbons {
        return Err(Err::Failure(ShorthandParseError::with_length(
            i,
            chain_text.len(),
            ShorthandErrorKind::TooManyDoubleBonds,
        )));
    }

    let fatty_acid = FattyAcid::new(carbons, double_bonds, linkage.unwrap_or_default());
    Ok((rest, fatty_acid))
}

/// Linkage = "O" | "P" ;
fn linkage(i: &str) -> ParseResult<Linkage> {
    alt((
        value(Linkage::Alkyl, char('O')),
        value(Linkage::Alkenyl, char('P')),
    ))(i)
}

/// Carbons = digit - "0" , { digit } ;
fn carbons(i: &str) -> ParseResult<u32> {
    let not_zero = expect(
        cut(not(char('0'))),
        ShorthandErrorKind::ExpectedNoLeadingZero,
    );
    let digits = expect(u32, ShorthandErrorKind::ExpectedCarbons);
    preceded(not_zero, digits)(i)
}

/// Double Bonds = "0" | digit - "0" , { digit } ;
fn double_bonds(i: &str) -> ParseResult<u32> {
    expect(
        alt((value(0, char('0')), u32)),
        ShorthandErrorKind::ExpectedDoubleBonds,
    )(i)
}
