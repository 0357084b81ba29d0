//! Decorates the chains of each [`Combination`] with every valid set of oxidative modifications

use std::{borrow::Cow, iter::FusedIterator};

use ahash::{HashMap, HashSet, HashSetExt};
use itertools::Itertools;
use log::{debug, trace};

use crate::{
    Chain, Combination, FattyAcid, LipidClass, Modification, ModificationGroup, ModifiedCombination,
    estimate::multichoose,
};

// Public API ==========================================================================================================

/// Precomputed chain variants for every fatty acid, ready to be composed into [`ModifiedCombination`]s
///
/// The variants of a fatty acid always start with its unmodified form. A variant that could have come from more than
/// one fatty acid (like two chains cleaved into the same product) is only kept for the first of those fatty acids in
/// canonical order, so every distinct species is composed exactly once.
#[derive(Clone, Debug)]
pub struct Composer<'c> {
    index: HashMap<FattyAcid, usize>,
    stacking: Vec<Vec<Chain<'c>>>,
    non_stacking: Vec<Vec<Chain<'c>>>,
    max_oxidized_chains: Option<usize>,
}

impl<'c> Composer<'c> {
    #[must_use]
    pub fn new(fatty_acids: &[FattyAcid], modifications: &[&'c Modification]) -> Self {
        let index = fatty_acids.iter().enumerate().map(|(i, &fa)| (fa, i)).collect();
        let stacking = variants(fatty_acids, modifications, true);
        let non_stacking = variants(fatty_acids, modifications, false);

        debug!(
            "composed {} chain variants ({} without stacking) from {} fatty acids",
            stacking.iter().map(Vec::len).sum::<usize>(),
            non_stacking.iter().map(Vec::len).sum::<usize>(),
            fatty_acids.len()
        );

        Self {
            index,
            stacking,
            non_stacking,
            max_oxidized_chains: None,
        }
    }

    /// Limits how many chains of a single species may carry modifications
    #[must_use]
    pub const fn with_max_oxidized_chains(mut self, max_oxidized_chains: Option<usize>) -> Self {
        self.max_oxidized_chains = max_oxidized_chains;
        self
    }

    /// The chain variants of `fatty_acid`, starting with its unmodified form
    #[must_use]
    pub fn variants(&self, fatty_acid: &FattyAcid, stacking: bool) -> Option<&[Chain<'c>]> {
        let table = if stacking {
            &self.stacking
        } else {
            &self.non_stacking
        };
        self.index.get(fatty_acid).map(|&i| table[i].as_slice())
    }

    pub fn compose<'a>(&'a self, combination: &Combination<'c>) -> ModifiedCombinations<'a, 'c> {
        let class = combination.class();
        let candidates = combination
            .fatty_acids()
            .iter()
            .map(|fatty_acid| {
                self.variants(fatty_acid, class.stacking()).map_or_else(
                    || {
                        trace!("{fatty_acid} is missing from the composer, so it will be left unmodified");
                        Cow::Owned(vec![Chain::unmodified(*fatty_acid)])
                    },
                    Cow::Borrowed,
                )
            })
            .collect_vec();
        let continues_run = combination
            .fatty_acids()
            .iter()
            .enumerate()
            .map(|(i, fatty_acid)| i > 0 && combination.fatty_acids()[i - 1] == *fatty_acid)
            .collect();

        ModifiedCombinations {
            class,
            indices: Some(vec![0; candidates.len()]),
            candidates,
            continues_run,
            max_oxidized_chains: self.max_oxidized_chains.unwrap_or(usize::MAX),
        }
    }

    /// Counts the species that composing every combination of `class` would produce, without composing any
    #[must_use]
    pub fn count(&self, class: &LipidClass) -> u128 {
        let table = if class.stacking() {
            &self.stacking
        } else {
            &self.non_stacking
        };
        let unmodified = table.len() as u128;
        let modified: u128 = table.iter().map(|v| v.len() as u128 - 1).sum();

        let chains = class.chains();
        let max_oxidized_chains = self.max_oxidized_chains.unwrap_or(chains).min(chains);
        (0..=max_oxidized_chains)
            .map(|j| {
                multichoose(unmodified, (chains - j) as u128) * multichoose(modified, j as u128)
            })
            .sum()
    }
}

/// Every [`ModifiedCombination`] of a single [`Combination`]
///
/// Chains are produced in position order. When neighbouring positions hold the same fatty acid, their variants are
/// only chosen in non-decreasing order, so swapping two identical chains never yields a second species.
#[derive(Clone, Debug)]
pub struct ModifiedCombinations<'a, 'c> {
    class: &'c LipidClass,
    candidates: Vec<Cow<'a, [Chain<'c>]>>,
    continues_run: Vec<bool>,
    max_oxidized_chains: usize,
    indices: Option<Vec<usize>>,
}

impl<'c> Iterator for ModifiedCombinations<'_, 'c> {
    type Item = ModifiedCombination<'c>;

    fn next(&mut self) -> Option<Self::Item> {
        let indices = self.indices.as_ref()?;
        let chains = indices
            .iter()
            .zip(&self.candidates)
            .map(|(&i, variants)| variants[i].clone())
            .collect();
        let modified_combination = ModifiedCombination {
            class: self.class,
            chains,
        };

        self.advance();
        Some(modified_combination)
    }
}

impl FusedIterator for ModifiedCombinations<'_, '_> {}

impl ModifiedCombinations<'_, '_> {
    // NOTE: Steps to the next valid set of indices in lexicographic order. Index 0 is always the unmodified chain, so
    // incrementing any index from 0 oxidizes that chain, and every later position in the same run is then forced to
    // be oxidized too
    fn advance(&mut self) {
        let Some(indices) = self.indices.as_mut() else {
            return;
        };

        let positions = indices.len();
        for p in (0..positions).rev() {
            if indices[p] + 1 >= self.candidates[p].len() {
                continue;
            }

            let oxidized_before = indices[..p].iter().filter(|&&i| i > 0).count();
            let forced = (p + 1..positions)
                .take_while(|&q| self.continues_run[q])
                .count();
            if oxidized_before + 1 + forced > self.max_oxidized_chains {
                continue;
            }

            indices[p] += 1;
            for q in p + 1..positions {
                indices[q] = if self.continues_run[q] {
                    indices[q - 1]
                } else {
                    0
                };
            }
            return;
        }

        self.indices = None;
    }
}

// Chain Variants ======================================================================================================

impl Chain<'_> {
    pub(crate) fn unmodified(fatty_acid: FattyAcid) -> Self {
        Self {
            source: fatty_acid,
            identity: fatty_acid,
            modifications: Vec::new(),
        }
    }
}

impl<'c> From<Combination<'c>> for ModifiedCombination<'c> {
    fn from(combination: Combination<'c>) -> Self {
        let chains = combination
            .fatty_acids
            .into_iter()
            .map(Chain::unmodified)
            .collect();
        Self {
            class: combination.class,
            chains,
        }
    }
}

fn variants<'c>(
    fatty_acids: &[FattyAcid],
    modifications: &[&'c Modification],
    stacking: bool,
) -> Vec<Vec<Chain<'c>>> {
    let mut seen = HashSet::new();
    fatty_acids
        .iter()
        .map(|&fatty_acid| {
            let mut variants = vec![Chain::unmodified(fatty_acid)];
            for assignment in assignments(&fatty_acid, modifications, stacking) {
                let chain = modify(fatty_acid, assignment);
                if seen.insert((chain.identity, chain.modifications.clone())) {
                    variants.push(chain);
                } else {
                    trace!("{chain} can already be made from another fatty acid, skipping it for {fatty_acid}");
                }
            }
            variants
        })
        .collect()
}

/// Every non-empty set of modifications that can share `fatty_acid`, each in group order
fn assignments<'c>(
    fatty_acid: &FattyAcid,
    modifications: &[&'c Modification],
    stacking: bool,
) -> Vec<Vec<&'c Modification>> {
    let applicable = modifications
        .iter()
        .copied()
        .filter(|m| {
            let applies = m.applies_to(fatty_acid);
            if !applies {
                trace!("{} is incompatible with {fatty_acid}", m.abbr());
            }
            applies
        })
        .collect_vec();

    let mut assignments = applicable.iter().map(|&m| vec![m]).collect_vec();
    // NOTE: A stack never holds two modifications from the same group
    if stacking {
        for size in 2..=applicable.len().min(ModificationGroup::ALL.len()) {
            let stacks = applicable
                .iter()
                .copied()
                .combinations(size)
                .filter(|stack| stack.iter().tuple_combinations().all(|(a, b)| a.stacks_with(b)));
            assignments.extend(stacks);
        }
    }
    assignments
}

fn modify<'c>(source: FattyAcid, modifications: Vec<&'c Modification>) -> Chain<'c> {
    let identity = modifications
        .iter()
        .find_map(|m| m.product())
        .map_or(source, |product| source.truncate_to(&product));
    Chain {
        source,
        identity,
        modifications,
    }
}

// Module Tests ========================================================================================================
