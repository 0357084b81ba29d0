//! Enumerates the species of every selected lipid class

use std::{iter, mem};

use itertools::Either;
use log::{debug, info, warn};

use crate::{
    Combinations, Composer, LipidClass, ModifiedCombination, ReferenceCatalog, RunConfig, Selection, Species,
    errors::{LipidomeError, Result},
    estimate::multichoose,
    species::render,
};

// Public API ==========================================================================================================

/// A theoretical lipidome, resolved from a [`RunConfig`] and ready to be enumerated
///
/// When no modifications are selected, only unoxidized species are produced and the [`Composer`] is skipped entirely.
#[derive(Clone, Debug)]
pub struct Lipidome<'c> {
    catalog: &'c ReferenceCatalog,
    selection: Selection<'c>,
    composer: Option<Composer<'c>>,
    limit: Option<u64>,
}

impl<'c> Lipidome<'c> {
    pub fn new(catalog: &'c ReferenceCatalog, config: &RunConfig) -> Result<Self> {
        let selection = config.select(catalog)?;
        let composer = selection.is_oxidized().then(|| {
            Composer::new(catalog.fatty_acids(), selection.modifications())
                .with_max_oxidized_chains(config.max_oxidized_chains)
        });

        info!(
            "built an {} lipidome from {} fatty acids",
            if composer.is_some() { "oxidized" } else { "unoxidized" },
            catalog.fatty_acids().len()
        );

        Ok(Self {
            catalog,
            selection,
            composer,
            limit: config.limit,
        })
    }

    #[must_use]
    pub const fn catalog(&self) -> &'c ReferenceCatalog {
        self.catalog
    }

    #[must_use]
    pub const fn selection(&self) -> &Selection<'c> {
        &self.selection
    }

    /// Every combination of catalog fatty acids that fits `class`, before any modifications are applied
    pub fn combinations(&self, class: &'c LipidClass) -> Result<Combinations<'c>> {
        Combinations::new(self.catalog.fatty_acids(), class)
    }

    /// The exact number of species [`Lipidome::species`] would produce for `class`, computed without enumerating them
    pub fn count(&self, class: &LipidClass) -> Result<u128> {
        let chains = class.chains();
        if chains == 0 {
            return Err(LipidomeError::invalid_class_arity(class).into());
        }

        let count = self.composer.as_ref().map_or_else(
            || multichoose(self.catalog.fatty_acids().len() as u128, chains as u128),
            |composer| composer.count(class),
        );
        debug!("the lipid class {} has {count} species", class.abbr());
        Ok(count)
    }

    pub fn species(&self, class: &'c LipidClass) -> Result<impl Iterator<Item = Species<'c>> + '_> {
        let count = self.count(class)?;
        if let Some(limit) = self.limit.map(u128::from).filter(|&limit| count > limit) {
            return Err(LipidomeError::enumeration_too_large(class, count, limit).into());
        }

        let composer = self.composer.as_ref();
        let species = self
            .combinations(class)?
            .flat_map(move |combination| match composer {
                Some(composer) => Either::Left(composer.compose(&combination)),
                None => Either::Right(iter::once(ModifiedCombination::from(combination))),
            })
            .map(render);
        Ok(species)
    }

    /// Lazily enumerates every selected class in configuration order
    ///
    /// Classes that can't be enumerated are skipped (and logged), rather than failing the whole lipidome.
    pub fn enumerate(&self) -> Enumeration<'_, 'c> {
        let mut skipped = Vec::new();
        let mut classes = Vec::new();
        for &class in self.selection.classes() {
            match self.species(class) {
                Ok(species) => classes.push(species),
                Err(error) => {
                    warn!("skipping the lipid class {}: {error}", class.abbr());
                    skipped.push(*error);
                }
            }
        }

        Enumeration {
            species: Box::new(classes.into_iter().flatten()),
            skipped,
        }
    }
}

/// The species of every selected class that could be enumerated, plus the errors of those that couldn't
pub struct Enumeration<'a, 'c> {
    species: Box<dyn Iterator<Item = Species<'c>> + 'a>,
    skipped: Vec<LipidomeError>,
}

impl Enumeration<'_, '_> {
    #[must_use]
    pub fn skipped(&self) -> &[LipidomeError] {
        &self.skipped
    }

    pub fn take_skipped(&mut self) -> Vec<LipidomeError> {
        mem::take(&mut self.skipped)
    }
}

impl<'c> Iterator for Enumeration<'_, 'c> {
    type Item = Species<'c>;

    fn next(&mut self) -> Option<Self::Item> {
        self.species.next()
    }
}

// Module Tests ========================================================================================================
