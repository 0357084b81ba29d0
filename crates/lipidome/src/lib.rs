//! Combinatorial enumeration of theoretical (oxidized) lipidomes

pub mod combinations;
pub mod composer;
pub mod errors;
pub mod estimate;
mod fatty_acids;
pub mod lipidome;
mod modifications;
pub mod parsers;
pub mod reference_catalog;
pub mod run_config;
mod species;

// External Crate Imports
use derive_more::Display;
use serde::Serialize;
use static_assertions::assert_impl_all;

// FIXME: Work on what's publicly exported / part of the API! Maybe create a prelude?
pub use combinations::Combinations;
pub use composer::{Composer, ModifiedCombinations};
pub use errors::{LipidomeError, Result};
pub use estimate::{Counting, SiteMode, TheoreticalLipidome, UnknownSiteMode};
pub use lipidome::{Enumeration, Lipidome};
pub use modifications::UnknownModificationGroup;
pub use reference_catalog::ReferenceCatalog;
pub use run_config::{RunConfig, Selection};
pub use species::render;

// NOTE: For the types in this module, 'c lifetimes indicate references to the `ReferenceCatalog`. Enumerated values
// borrow their classes and modifications from the catalog instead of cloning them

// NOTE: The field order here matters! The derived `Ord` is the canonical chain order: ascending carbon count, then
// double-bond count, then linkage
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize)]
pub struct FattyAcid {
    carbons: u32,
    double_bonds: u32,
    linkage: Linkage,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Display, Serialize)]
pub enum Linkage {
    #[default]
    #[display("")]
    Acyl,
    #[display("O-")]
    Alkyl,
    #[display("P-")]
    Alkenyl,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize)]
pub struct LipidClass {
    abbr: String,
    name: String,
    chains: usize,
    stacking: bool,
}

// ---------------------------------------------------------------------------------------------------------------------

// NOTE: The variant order is the order in which modifications are rendered on a chain
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Serialize)]
pub enum ModificationGroup {
    #[display("cleavage")]
    Cleavage,
    #[display("oxygen-addition")]
    OxygenAddition,
    #[display("prostane-ring")]
    ProstaneRing,
    #[display("other")]
    Other,
}

// NOTE: `group` must stay the first field so that the derived `Ord` sorts modifications into rendering order
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize)]
pub struct Modification {
    group: ModificationGroup,
    abbr: String,
    name: String,
    constraints: ChainConstraints,
    terminal: bool,
    stackable: bool,
    product: Option<FattyAcid>,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Serialize)]
pub struct ChainConstraints {
    min_carbons: u32,
    max_carbons: Option<u32>,
    min_double_bonds: u32,
    max_double_bonds: Option<u32>,
}

// ---------------------------------------------------------------------------------------------------------------------

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Combination<'c> {
    class: &'c LipidClass,
    fatty_acids: Vec<FattyAcid>,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ModifiedCombination<'c> {
    class: &'c LipidClass,
    chains: Vec<Chain<'c>>,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize)]
pub struct Chain<'c> {
    source: FattyAcid,
    identity: FattyAcid,
    modifications: Vec<&'c Modification>,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize)]
pub struct Species<'c> {
    class: &'c LipidClass,
    chains: Vec<Chain<'c>>,
    name: String,
}

// NOTE: Species (and everything they borrow) are plain data, so classes can be enumerated on separate threads
assert_impl_all!(ReferenceCatalog: Send, Sync);
assert_impl_all!(Species<'static>: Send, Sync);

// Core Type Accessors =================================================================================================

impl LipidClass {
    #[must_use]
    pub fn new(abbr: impl Into<String>, name: impl Into<String>, chains: usize) -> Self {
        Self {
            abbr: abbr.into(),
            name: name.into(),
            chains,
            stacking: true,
        }
    }

    #[must_use]
    pub const fn with_stacking(mut self, stacking: bool) -> Self {
        self.stacking = stacking;
        self
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
    pub const fn chains(&self) -> usize {
        self.chains
    }

    #[must_use]
    pub const fn stacking(&self) -> bool {
        self.stacking
    }
}

impl<'c> Combination<'c> {
    #[must_use]
    pub const fn class(&self) -> &'c LipidClass {
        self.class
    }

    #[must_use]
    pub fn fatty_acids(&self) -> &[FattyAcid] {
        &self.fatty_acids
    }
}

impl<'c> ModifiedCombination<'c> {
    #[must_use]
    pub const fn class(&self) -> &'c LipidClass {
        self.class
    }

    #[must_use]
    pub fn chains(&self) -> &[Chain<'c>] {
        &self.chains
    }

    #[must_use]
    pub fn is_oxidized(&self) -> bool {
        self.chains.iter().any(Chain::is_modified)
    }
}

impl<'c> Chain<'c> {
    #[must_use]
    pub const fn source(&self) -> FattyAcid {
        self.source
    }

    #[must_use]
    pub const fn identity(&self) -> FattyAcid {
        self.identity
    }

    #[must_use]
    pub fn modifications(&self) -> &[&'c Modification] {
        &self.modifications
    }

    #[must_use]
    pub fn is_modified(&self) -> bool {
        !self.modifications.is_empty()
    }
}
