use miette::Diagnostic;
use thiserror::Error;

use crate::{LipidClass, ModificationGroup};

pub type Result<T, E = Box<LipidomeError>> = std::result::Result<T, E>;

// FIXME: Check all of the errors returned from public API are wrapped in this!
#[derive(Debug, Diagnostic, Clone, Eq, PartialEq, Error)]
pub enum LipidomeError {
    #[diagnostic(help("every lipid class needs at least one fatty acid chain"))]
    #[error("the lipid class {abbr:?} declares {chains} fatty acid chains")]
    InvalidClassArity { abbr: String, chains: usize },

    #[diagnostic(help(
        "select fewer fatty acids or modifications, set `max-oxidized-chains`, or raise the `limit`"
    ))]
    #[error("the lipid class {class:?} would produce {count} species, exceeding the limit of {limit}")]
    EnumerationTooLarge {
        class: String,
        count: u128,
        limit: u128,
    },

    #[error("the lipid class {abbr:?} could not be found in the supplied reference catalog")]
    ClassLookup { abbr: String },

    #[error("the modification {abbr:?} could not be found in the supplied reference catalog")]
    ModificationLookup { abbr: String },

    #[diagnostic(help("move {abbr:?} under the {actual} group"))]
    #[error("the modification {abbr:?} was selected as {selected}, but belongs to the {actual} group")]
    ModificationGroupMismatch {
        abbr: String,
        selected: ModificationGroup,
        actual: ModificationGroup,
    },

    #[diagnostic(help("remove the duplicate entry from the run configuration"))]
    #[error("the {kind} {abbr:?} was selected more than once")]
    DuplicateSelection { kind: &'static str, abbr: String },
}

impl LipidomeError {
    pub(crate) fn invalid_class_arity(class: &LipidClass) -> Self {
        let abbr = class.abbr().to_owned();
        let chains = class.chains();

        Self::InvalidClassArity { abbr, chains }
    }

    pub(crate) fn enumeration_too_large(class: &LipidClass, count: u128, limit: u128) -> Self {
        let class = class.abbr().to_owned();

        Self::EnumerationTooLarge {
            class,
            count,
            limit,
        }
    }

    pub(crate) fn class_lookup(abbr: &str) -> Self {
        let abbr = abbr.to_owned();

        Self::ClassLookup { abbr }
    }

    pub(crate) fn modification_lookup(abbr: &str) -> Self {
        let abbr = abbr.to_owned();

        Self::ModificationLookup { abbr }
    }

    pub(crate) fn modification_group_mismatch(
        abbr: &str,
        selected: ModificationGroup,
        actual: ModificationGroup,
    ) -> Self {
        let abbr = abbr.to_owned();

        Self::ModificationGroupMismatch {
            abbr,
            selected,
            actual,
        }
    }

    pub(crate) fn duplicate_selection(kind: &'static str, abbr: &str) -> Self {
        let abbr = abbr.to_owned();

        Self::DuplicateSelection { kind, abbr }
    }
}
