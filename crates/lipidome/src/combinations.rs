use std::iter::FusedIterator;

use crate::{
    Combination, FattyAcid, LipidClass,
    errors::{LipidomeError, Result},
    estimate::multichoose,
};

// Public API ==========================================================================================================

/// Every multiset of fatty acids that can fill the chains of a lipid class
///
/// Combinations are produced lazily in lexicographic order, and each one lists its fatty acids in canonical order, so
/// no two combinations are permutations of each other
#[derive(Clone, Debug)]
pub struct Combinations<'c> {
    class: &'c LipidClass,
    fatty_acids: &'c [FattyAcid],
    // NOTE: Always non-decreasing, and `None` once every combination has been produced
    indices: Option<Vec<usize>>,
    remaining: usize,
}

impl<'c> Combinations<'c> {
    /// `fatty_acids` should already be unique and in canonical order, as [`ReferenceCatalog::fatty_acids`] is
    ///
    /// [`ReferenceCatalog::fatty_acids`]: crate::ReferenceCatalog::fatty_acids
    pub fn new(fatty_acids: &'c [FattyAcid], class: &'c LipidClass) -> Result<Self> {
        let chains = class.chains();
        if chains == 0 {
            return Err(LipidomeError::invalid_class_arity(class).into());
        }

        let indices = (!fatty_acids.is_empty()).then(|| vec![0; chains]);
        let remaining = multichoose(fatty_acids.len() as u128, chains as u128);

        Ok(Self {
            class,
            fatty_acids,
            indices,
            remaining: usize::try_from(remaining).unwrap_or(usize::MAX),
        })
    }

    #[must_use]
    pub const fn class(&self) -> &'c LipidClass {
        self.class
    }
}

impl<'c> Iterator for Combinations<'c> {
    type Item = Combination<'c>;

    fn next(&mut self) -> Option<Self::Item> {
        let indices = self.indices.as_mut()?;
        let combination = Combination {
            class: self.class,
            fatty_acids: indices.iter().map(|&i| self.fatty_acids[i]).collect(),
        };

        let last = self.fatty_acids.len() - 1;
        if let Some(position) = indices.iter().rposition(|&i| i < last) {
            let next = indices[position] + 1;
            indices[position..].fill(next);
        } else {
            self.indices = None;
        }
        self.remaining = self.remaining.saturating_sub(1);

        Some(combination)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Combinations<'_> {}

impl FusedIterator for Combinations<'_> {}

// Module Tests ========================================================================================================
