use std::str::FromStr;

use thiserror::Error;

use crate::{ChainConstraints, FattyAcid, Modification, ModificationGroup};

// Public API ==========================================================================================================

impl ModificationGroup {
    pub const ALL: [Self; 4] = [
        Self::Cleavage,
        Self::OxygenAddition,
        Self::ProstaneRing,
        Self::Other,
    ];

    /// Whether modifications in this group are terminal unless a catalog says otherwise
    #[must_use]
    pub const fn terminal_by_default(self) -> bool {
        matches!(self, Self::Cleavage)
    }

    /// Whether a modification of this group may share a chain with a terminal modification
    #[must_use]
    pub const fn accepts_terminal(self) -> bool {
        matches!(self, Self::Cleavage | Self::OxygenAddition)
    }
}

impl Modification {
    #[must_use]
    pub const fn group(&self) -> ModificationGroup {
        self.group
    }

    #[must_use]
    pub fn abbr(&self) -> &str {
        &self.abbr
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn constraints(&self) -> ChainConstraints {
        self.constraints
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.terminal
    }

    #[must_use]
    pub const fn is_stackable(&self) -> bool {
        self.stackable
    }

    #[must_use]
    pub const fn product(&self) -> Option<FattyAcid> {
        self.product
    }

    /// Whether this modification can be placed on `chain` at all
    ///
    /// Cleavage products must also fit inside the chain they're cut from: strictly shorter, and with no more double
    /// bonds than the original chain
    #[must_use]
    pub const fn applies_to(&self, chain: &FattyAcid) -> bool {
        if !self.constraints.admits(chain) {
            return false;
        }
        match self.product {
            Some(product) => {
                product.carbons() < chain.carbons() && product.double_bonds() <= chain.double_bonds()
            }
            None => true,
        }
    }

    /// Whether `self` and `other` may both sit on the same chain
    #[must_use]
    pub fn stacks_with(&self, other: &Self) -> bool {
        let forecloses = |a: &Self, b: &Self| a.terminal && !b.group.accepts_terminal();
        self.group != other.group
            && self.stackable
            && other.stackable
            && !forecloses(self, other)
            && !forecloses(other, self)
    }
}

impl ChainConstraints {
    #[must_use]
    pub const fn new(
        min_carbons: u32,
        max_carbons: Option<u32>,
        min_double_bonds: u32,
        max_double_bonds: Option<u32>,
    ) -> Self {
        Self {
            min_carbons,
            max_carbons,
            min_double_bonds,
            max_double_bonds,
        }
    }

    #[must_use]
    pub const fn min_carbons(&self) -> u32 {
        self.min_carbons
    }

    #[must_use]
    pub const fn max_carbons(&self) -> Option<u32> {
        self.max_carbons
    }

    #[must_use]
    pub const fn min_double_bonds(&self) -> u32 {
        self.min_double_bonds
    }

    #[must_use]
    pub const fn max_double_bonds(&self) -> Option<u32> {
        self.max_double_bonds
    }

    #[must_use]
    pub const fn admits(&self, chain: &FattyAcid) -> bool {
        const fn within(value: u32, min: u32, max: Option<u32>) -> bool {
            value >= min
                && match max {
                    Some(max) => value <= max,
                    None => true,
                }
        }

        within(chain.carbons(), self.min_carbons, self.max_carbons)
            && within(
                chain.double_bonds(),
                self.min_double_bonds,
                self.max_double_bonds,
            )
    }

    /// A constraint is contradictory when no chain could ever satisfy it
    #[must_use]
    pub const fn is_contradictory(&self) -> bool {
        const fn inverted(min: u32, max: Option<u32>) -> bool {
            match max {
                Some(max) => min > max,
                None => false,
            }
        }

        inverted(self.min_carbons, self.max_carbons)
            || inverted(self.min_double_bonds, self.max_double_bonds)
    }
}

// FromStr Trait Implementations =======================================================================================

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("{0:?} is not a modification group")]
pub struct UnknownModificationGroup(pub String);

impl FromStr for ModificationGroup {
    type Err = UnknownModificationGroup;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // NOTE: The `m_*` spellings are accepted so that older configurations keep working
        Ok(match s {
            "cleavage" | "m_ocp" => Self::Cleavage,
            "oxygen-addition" | "m_oap" => Self::OxygenAddition,
            "prostane-ring" | "m_p" => Self::ProstaneRing,
            "other" | "m_o" => Self::Other,
            _ => return Err(UnknownModificationGroup(s.to_owned())),
        })
    }
}

// Module Tests ========================================================================================================
