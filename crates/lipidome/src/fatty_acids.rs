use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use crate::{
    FattyAcid, Linkage,
    parsers::{errors::ShorthandError, fatty_acid::parse_fatty_acid},
};

// Public API ==========================================================================================================

impl FattyAcid {
    #[must_use]
    pub const fn new(carbons: u32, double_bonds: u32, linkage: Linkage) -> Self {
        Self {
            carbons,
            double_bonds,
            linkage,
        }
    }

    #[must_use]
    pub const fn acyl(carbons: u32, double_bonds: u32) -> Self {
        Self::new(carbons, double_bonds, Linkage::Acyl)
    }

    pub fn parse(shorthand: impl AsRef<str>) -> Result<Self, ShorthandError> {
        parse_fatty_acid(shorthand.as_ref())
    }

    #[must_use]
    pub const fn carbons(&self) -> u32 {
        self.carbons
    }

    #[must_use]
    pub const fn double_bonds(&self) -> u32 {
        self.double_bonds
    }

    #[must_use]
    pub const fn linkage(&self) -> Linkage {
        self.linkage
    }

    #[must_use]
    pub const fn is_saturated(&self) -> bool {
        self.double_bonds == 0
    }

    /// The chain left attached to the head-group after this chain is cleaved into `product`: the product's length
    /// and unsaturation, but this chain's linkage
    #[must_use]
    pub(crate) const fn truncate_to(&self, product: &Self) -> Self {
        Self::new(product.carbons, product.double_bonds, self.linkage)
    }
}

// Display and FromStr Trait Implementations ===========================================================================

impl Display for FattyAcid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            carbons,
            double_bonds,
            linkage,
        } = self;
        write!(f, "{linkage}{carbons}:{double_bonds}")
    }
}

impl FromStr for FattyAcid {
    type Err = ShorthandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    #[test]
    fn display_shorthand() {
        assert_eq!(FattyAcid::acyl(16, 0).to_string(), "16:0");
        assert_eq!(FattyAcid::acyl(22, 6).to_string(), "22:6");
        assert_eq!(FattyAcid::new(16, 0, Linkage::Alkyl).to_string(), "O-16:0");
        assert_eq!(FattyAcid::new(18, 1, Linkage::Alkenyl).to_string(), "P-18:1");
    }

    #[test]
    fn shorthand_round_trips() {
        for shorthand in ["9:0", "18:1", "20:4", "O-16:0", "P-18:0"] {
            let fatty_acid: FattyAcid = shorthand.parse().unwrap();
            assert_eq!(fatty_acid.to_string(), shorthand);
        }
    }

    #[test]
    fn canonical_order() {
        let fatty_acids = ["18:1", "P-16:0", "16:0", "18:0", "O-16:0", "16:1", "20:4"]
            .into_iter()
            .map(|s| FattyAcid::parse(s).unwrap())
            .sorted()
            .map(|fa| fa.to_string())
            .collect_vec();
        assert_eq!(
            fatty_acids,
            ["16:0", "O-16:0", "P-16:0", "16:1", "18:0", "18:1", "20:4"]
        );
    }

    #[test]
    fn truncation_keeps_linkage() {
        let product = FattyAcid::acyl(9, 0);
        let oleic = FattyAcid::acyl(18, 1);
        let plasmalogen = FattyAcid::new(18, 1, Linkage::Alkenyl);
        assert_eq!(oleic.truncate_to(&product), FattyAcid::acyl(9, 0));
        assert_eq!(
            plasmalogen.truncate_to(&product),
            FattyAcid::new(9, 0, Linkage::Alkenyl)
        );
    }

    #[test]
    fn saturation() {
        assert!(FattyAcid::acyl(16, 0).is_saturated());
        assert!(!FattyAcid::acyl(18, 2).is_saturated());
    }
}
