use std::fmt::{self, Display, Formatter};

use itertools::Itertools;

use crate::{Chain, LipidClass, ModifiedCombination, Species};

// Public API ==========================================================================================================

/// Names a [`ModifiedCombination`], like `PC 16:0_18:1<OH>`
///
/// The class abbreviation is followed by every chain in position order, joined with underscores. Modified chains list
/// their modifications in group order between angle brackets, and cleaved chains are written as their product.
/// Positions follow the source fatty acids, so a cleaved chain keeps the place of the chain it was cleaved from
/// (`PC 16:0_9:0<Aldehyde>`), and is never re-sorted by its product.
#[must_use]
pub fn render(modified_combination: ModifiedCombination<'_>) -> Species<'_> {
    let ModifiedCombination { class, chains } = modified_combination;
    let name = format!("{} {}", class.abbr(), chains.iter().join("_"));
    Species { class, chains, name }
}

impl<'c> ModifiedCombination<'c> {
    #[must_use]
    pub fn render(&self) -> Species<'c> {
        render(self.clone())
    }
}

impl<'c> Species<'c> {
    #[must_use]
    pub const fn class(&self) -> &'c LipidClass {
        self.class
    }

    #[must_use]
    pub fn chains(&self) -> &[Chain<'c>] {
        &self.chains
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_oxidized(&self) -> bool {
        self.chains.iter().any(Chain::is_modified)
    }
}

impl Display for Chain<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.identity)?;
        if self.is_modified() {
            let abbrs = self.modifications.iter().map(|m| m.abbr()).join(",");
            write!(f, "<{abbrs}>")?;
        }
        Ok(())
    }
}

impl Display for Species<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// Module Tests ========================================================================================================
