//! Closed-form estimates of lipidome sizes
//!
//! Rather than enumerating species, these functions count them directly from the number of fatty acids, selected
//! lipid classes, and selected modifications. Oxidized fatty acids are modelled by the number of oxidizable sites on
//! each chain (see [`SiteMode`]): every site may carry one oxygen addition, chains may be cleaved between sites, and
//! chains with three or more double bonds may also cyclize into prostane rings (or other cyclic products).
//!
//! Every count can be taken [`Counting::Combinatorial`] (only which chains and modifications are present matters) or
//! [`Counting::PositionSpecific`] (the site of each modification and the backbone position of each chain matter too).

use std::str::FromStr;

use ahash::{HashMap, HashMapExt};
use derive_more::Display;
use thiserror::Error;

use crate::{LipidClass, ModificationGroup, reference_catalog::ReferenceCatalog, run_config::Selection};

// Public API ==========================================================================================================

/// How the number of oxidizable sites on a chain follows from its number of double bonds
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Display)]
pub enum SiteMode {
    /// One site between each pair of neighbouring double bonds
    #[default]
    #[display("bis-allylic")]
    BisAllylic,
    /// One site on either side of each double bond
    #[display("allylic")]
    Allylic,
    /// One site per double bond
    #[display("double-bond")]
    DoubleBond,
}

impl SiteMode {
    pub const ALL: [Self; 3] = [Self::BisAllylic, Self::DoubleBond, Self::Allylic];

    #[must_use]
    pub const fn sites(self, double_bonds: u32) -> u32 {
        match self {
            Self::BisAllylic => double_bonds.saturating_sub(1),
            Self::Allylic => double_bonds + 1,
            Self::DoubleBond => double_bonds,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
pub enum Counting {
    #[display("combinatorial")]
    Combinatorial,
    #[display("position-specific")]
    PositionSpecific,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct TheoreticalLipidome {
    fatty_acids: u128,
    // NOTE: Maps a number of double bonds (always > 0) to the number of fatty acids with that many
    unsaturated: Vec<(u32, u128)>,
    classes: Vec<ClassLayout>,
    oxygen_additions: u128,
    cleavages: u128,
    cyclizations: u128,
}

impl TheoreticalLipidome {
    #[must_use]
    pub fn new(catalog: &ReferenceCatalog, selection: &Selection<'_>) -> Self {
        let mut unsaturated = HashMap::new();
        for fatty_acid in catalog.fatty_acids().iter().filter(|fa| !fa.is_saturated()) {
            *unsaturated.entry(fatty_acid.double_bonds()).or_insert(0) += 1;
        }
        let mut unsaturated: Vec<_> = unsaturated.into_iter().collect();
        unsaturated.sort_unstable();

        let selected_in = |group| {
            selection
                .modifications()
                .iter()
                .filter(|m| m.group() == group)
                .count() as u128
        };

        Self {
            fatty_acids: catalog.fatty_acids().len() as u128,
            unsaturated,
            classes: selection.classes().iter().copied().map(ClassLayout::new).collect(),
            oxygen_additions: selected_in(ModificationGroup::OxygenAddition),
            cleavages: selected_in(ModificationGroup::Cleavage),
            cyclizations: selected_in(ModificationGroup::ProstaneRing)
                + selected_in(ModificationGroup::Other),
        }
    }

    /// Oxygen-addition products of a chain with `sites` oxidizable sites, excluding the unmodified chain
    #[must_use]
    pub fn oxygen_addition_products(&self, sites: u32, counting: Counting) -> u128 {
        match counting {
            Counting::Combinatorial => {
                binomial(self.oxygen_additions + u128::from(sites), u128::from(sites)) - 1
            }
            Counting::PositionSpecific => self.oxygen_additions.pow(sites).saturating_sub(1),
        }
    }

    /// Cleavage products of a chain with `sites` oxidizable sites
    ///
    /// A chain may be cut at any site, and the fragment left on the lipid keeps whatever oxygen additions were made
    /// upstream of the cut
    #[must_use]
    pub fn cleavage_products(&self, sites: u32, counting: Counting) -> u128 {
        let upstream_products: u128 = (2..sites)
            .map(|i| self.oxygen_addition_products(i - 1, counting) + 1)
            .sum();
        self.cleavages * (1 + upstream_products)
    }

    /// Prostane-ring and other cyclic products of a chain with `double_bonds` double bonds
    #[must_use]
    pub fn cyclic_products(&self, double_bonds: u32, counting: Counting) -> u128 {
        if double_bonds < 3 {
            return 0;
        }
        match counting {
            Counting::Combinatorial => self.cyclizations,
            // NOTE: Each run of three consecutive double bonds can close a ring
            Counting::PositionSpecific => u128::from(double_bonds - 2) * self.cyclizations,
        }
    }

    /// The number of distinct oxidized fatty acids, excluding unmodified ones
    #[must_use]
    pub fn oxidized_fatty_acids(&self, site_mode: SiteMode, counting: Counting) -> u128 {
        self.unsaturated
            .iter()
            .map(|&(double_bonds, fatty_acids)| {
                let sites = site_mode.sites(double_bonds);
                fatty_acids
                    * (self.oxygen_addition_products(sites, counting)
                        + self.cleavage_products(sites, counting)
                        + self.cyclic_products(double_bonds, counting))
            })
            .sum()
    }

    #[must_use]
    pub fn unoxidized_lipids(&self, counting: Counting) -> u128 {
        self.lipids(counting, |layout, chains| layout.count(chains, 0, self.fatty_acids, 0))
    }

    /// Lipids with exactly one oxidized chain
    #[must_use]
    pub fn single_oxidized_chain_lipids(&self, site_mode: SiteMode, counting: Counting) -> u128 {
        let oxidized = self.oxidized_fatty_acids(site_mode, counting);
        self.lipids(counting, |layout, chains| {
            layout.count(chains, oxidized, self.fatty_acids, 1)
        })
    }

    /// Lipids with at least one oxidized chain, up to every chain being oxidized
    #[must_use]
    pub fn all_oxidized_chain_lipids(&self, site_mode: SiteMode, counting: Counting) -> u128 {
        let oxidized = self.oxidized_fatty_acids(site_mode, counting);
        self.lipids(counting, |layout, chains| {
            (1..=chains)
                .map(|j| layout.count(chains, oxidized, self.fatty_acids, j))
                .sum()
        })
    }

    fn lipids(&self, counting: Counting, count_in: impl Fn(Layout, u32) -> u128) -> u128 {
        self.classes
            .iter()
            .map(|class| match counting {
                Counting::Combinatorial => count_in(Layout::Unordered, class.chains),
                Counting::PositionSpecific => class
                    .layouts
                    .iter()
                    .map(|&layout| count_in(layout, class.chains))
                    .sum(),
            })
            .sum()
    }
}

// Positional Layouts ==================================================================================================

/// How the chains of a lipid sit on its backbone
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Layout {
    /// Positions don't matter (a multiset of chains)
    Unordered,
    /// Every position is distinguishable
    Ordered,
    /// Positions are distinguishable up to reversing the backbone, as in TG (sn1 / sn3) or CL
    Mirrored,
}

#[derive(Clone, Eq, PartialEq, Debug)]
struct ClassLayout {
    chains: u32,
    layouts: Vec<Layout>,
}

// NOTE: Classes are recognised by either their abbreviation or their full name
const LYSOPHOSPHOLIPIDS: [&str; 6] = ["LPA", "LPC", "LPE", "LPG", "LPI", "LPS"];
const MONOACYLGLYCEROLS: [&str; 2] = ["MG", "Monoacylglycerol"];
const DIACYLGLYCEROLS: [&str; 2] = ["DG", "Diacylglycerol"];
const TRIACYLGLYCEROLS: [&str; 2] = ["TG", "Triacylglycerol"];
const CARDIOLIPINS: [&str; 2] = ["CL", "Cardiolipin"];

impl ClassLayout {
    fn new(class: &LipidClass) -> Self {
        let is = |aliases: &[&str], chains| {
            class.chains() == chains
                && aliases
                    .iter()
                    .any(|&alias| alias == class.abbr() || alias == class.name())
        };

        let layouts = if is(&LYSOPHOSPHOLIPIDS, 1) {
            // The chain can sit on either sn1 or sn2
            vec![Layout::Ordered; 2]
        } else if is(&MONOACYLGLYCEROLS, 1) {
            vec![Layout::Ordered; 3]
        } else if is(&DIACYLGLYCEROLS, 2) {
            // 1,2-DG, then the symmetric 1,3-DG
            vec![Layout::Ordered, Layout::Mirrored]
        } else if is(&TRIACYLGLYCEROLS, 3) || is(&CARDIOLIPINS, 4) {
            vec![Layout::Mirrored]
        } else {
            vec![Layout::Ordered]
        };

        Self {
            chains: class.chains() as u32,
            layouts,
        }
    }
}

impl Layout {
    /// Lipids with `chains` chains, exactly `oxidized_chains` of which are drawn from `oxidized` fatty acids and the
    /// rest from `unoxidized` ones
    fn count(self, chains: u32, oxidized: u128, unoxidized: u128, oxidized_chains: u32) -> u128 {
        let (k, j) = (chains, oxidized_chains);
        if j > k {
            return 0;
        }
        match self {
            Self::Unordered => {
                multichoose(oxidized, u128::from(j)) * multichoose(unoxidized, u128::from(k - j))
            }
            Self::Ordered => {
                binomial(u128::from(k), u128::from(j)) * oxidized.pow(j) * unoxidized.pow(k - j)
            }
            Self::Mirrored => {
                // NOTE: Burnside's lemma over {identity, reversal}: palindromes are the only arrangements fixed by
                // the reversal
                let ordered = Self::Ordered.count(k, oxidized, unoxidized, j);
                let (pairs, middle) = (k / 2, k % 2);
                let palindromes: u128 = (0..=pairs)
                    .filter_map(|p| {
                        let in_middle = j.checked_sub(2 * p)?;
                        (in_middle <= middle).then(|| {
                            let middle_choices = match (middle, in_middle) {
                                (0, _) => 1,
                                (_, 0) => unoxidized,
                                _ => oxidized,
                            };
                            Self::Ordered.count(pairs, oxidized, unoxidized, p)
                                * middle_choices
                        })
                    })
                    .sum();
                (ordered + palindromes) / 2
            }
        }
    }
}

// Combinatorial Helpers ===============================================================================================

/// Exact binomial coefficients, C(n, k)
#[must_use]
pub fn binomial(n: u128, k: u128) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    // NOTE: Each partial product is itself a binomial coefficient, so every division here is exact
    (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
}

/// Multisets of size `k` drawn from `n` kinds of item, C(n + k - 1, k)
#[must_use]
pub fn multichoose(n: u128, k: u128) -> u128 {
    if k == 0 {
        1
    } else {
        binomial(n + k - 1, k)
    }
}

// FromStr Trait Implementations =======================================================================================

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("{0:?} is not a site mode")]
pub struct UnknownSiteMode(pub String);

impl FromStr for SiteMode {
    type Err = UnknownSiteMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "bis-allylic" | "bisallylic" | "bis allylic" => Self::BisAllylic,
            "allylic" => Self::Allylic,
            "double-bond" | "db" | "n_db" | "C=C" | "n" => Self::DoubleBond,
            _ => return Err(UnknownSiteMode(s.to_owned())),
        })
    }
}

// Module Tests ========================================================================================================
