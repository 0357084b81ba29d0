//! The reference tables that every enumeration draws from: fatty acids, lipid classes, and oxidative modifications

// Standard Library Imports
use std::collections::hash_map::Entry;

// External Crate Imports
use ahash::{HashMap, HashMapExt};
use knus::{
    Decode,
    span::{Span, Spanned},
};
use log::{info, warn};
use miette::{Diagnostic, LabeledSpan, NamedSource};
use thiserror::Error;

// Local Crate Imports
use crate::{
    ChainConstraints, FattyAcid, Linkage, LipidClass, Modification, ModificationGroup,
    errors::{LipidomeError, Result},
    parsers::errors::ShorthandError,
};

// Public API ==========================================================================================================

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ReferenceCatalog {
    fatty_acids: Vec<FattyAcid>,
    fatty_acid_names: HashMap<FattyAcid, String>,
    lipid_classes: Vec<LipidClass>,
    lipid_class_index: HashMap<String, usize>,
    modifications: Vec<Modification>,
    modification_index: HashMap<String, usize>,
}

impl ReferenceCatalog {
    pub fn new(file_name: impl AsRef<str>, kdl_text: impl AsRef<str>) -> miette::Result<Self> {
        let parsed_catalog: ReferenceCatalogKdl =
            knus::parse(file_name.as_ref(), kdl_text.as_ref())?;
        let catalog = parsed_catalog
            .validate(())
            .map_err(|e| e.finalize(file_name.as_ref(), kdl_text))?;

        info!(
            "loaded {}: {} fatty acids, {} lipid classes, {} modifications",
            file_name.as_ref(),
            catalog.fatty_acids.len(),
            catalog.lipid_classes.len(),
            catalog.modifications.len()
        );

        Ok(catalog)
    }

    /// Every distinct fatty acid, in canonical order
    #[must_use]
    pub fn fatty_acids(&self) -> &[FattyAcid] {
        &self.fatty_acids
    }

    #[must_use]
    pub fn fatty_acid_name(&self, fatty_acid: &FattyAcid) -> Option<&str> {
        self.fatty_acid_names.get(fatty_acid).map(String::as_str)
    }

    /// Lipid classes, in the order they were declared
    #[must_use]
    pub fn lipid_classes(&self) -> &[LipidClass] {
        &self.lipid_classes
    }

    pub fn lipid_class(&self, abbr: impl AsRef<str>) -> Result<&LipidClass> {
        let abbr = abbr.as_ref();
        self.lipid_class_index
            .get(abbr)
            .map(|&i| &self.lipid_classes[i])
            .ok_or_else(|| LipidomeError::class_lookup(abbr).into())
    }

    /// Modifications, sorted by group, then by the order they were declared in
    #[must_use]
    pub fn modifications(&self) -> &[Modification] {
        &self.modifications
    }

    pub fn modification(&self, abbr: impl AsRef<str>) -> Result<&Modification> {
        let abbr = abbr.as_ref();
        self.modification_index
            .get(abbr)
            .map(|&i| &self.modifications[i])
            .ok_or_else(|| LipidomeError::modification_lookup(abbr).into())
    }

    pub fn modifications_in(
        &self,
        group: ModificationGroup,
    ) -> impl Iterator<Item = &Modification> + '_ {
        self.modifications.iter().filter(move |m| m.group == group)
    }
}

// KDL File Schema =====================================================================================================

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct ReferenceCatalogKdl {
    #[knus(child, unwrap(children))]
    fatty_acids: Vec<FattyAcidKdl>,
    #[knus(child, unwrap(children))]
    lipid_classes: Vec<LipidClassKdl>,
    #[knus(child)]
    modifications: Option<ModificationsKdl>,
}

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct ModificationsKdl {
    #[knus(children)]
    groups: Vec<ModificationGroupKdl>,
}

// ---------------------------------------------------------------------------------------------------------------------

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct FattyAcidKdl {
    #[knus(span)]
    span: Span,
    #[knus(node_name)]
    shorthand: String,
    #[knus(argument)]
    name: Option<String>,
}

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct LipidClassKdl {
    #[knus(span)]
    span: Span,
    #[knus(node_name)]
    abbr: String,
    #[knus(argument)]
    name: String,
    #[knus(property(name = "chains"))]
    chains: u32,
    #[knus(property(name = "stacking"))]
    stacking: Option<bool>,
}

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct ModificationGroupKdl {
    #[knus(span)]
    span: Span,
    #[knus(node_name)]
    group: String,
    #[knus(property(name = "stackable"))]
    stackable: Option<bool>,
    #[knus(children)]
    modifications: Vec<ModificationKdl>,
}

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct ModificationKdl {
    #[knus(span)]
    span: Span,
    #[knus(node_name)]
    abbr: String,
    #[knus(argument)]
    name: String,
    #[knus(property(name = "min-carbons"))]
    min_carbons: Option<u32>,
    #[knus(property(name = "max-carbons"))]
    max_carbons: Option<u32>,
    #[knus(property(name = "min-double-bonds"))]
    min_double_bonds: Option<u32>,
    #[knus(property(name = "max-double-bonds"))]
    max_double_bonds: Option<u32>,
    #[knus(property(name = "terminal"))]
    terminal: Option<bool>,
    #[knus(property(name = "stackable"))]
    stackable: Option<bool>,
    #[knus(property(name = "product"))]
    product: Option<ShorthandKdl>,
}

type ShorthandKdl = Spanned<String, Span>;

// Contextual Validation Trait  ========================================================================================

type TableResult<T> = Result<T, ReferenceTableErrorKind>;

trait ValidateInto<'c, T> {
    type Context: 'c;

    fn validate(self, ctx: Self::Context) -> TableResult<T>;
}

// Reference Catalog Validation ========================================================================================

impl ValidateInto<'_, ReferenceCatalog> for ReferenceCatalogKdl {
    type Context = ();

    fn validate(self, _ctx: Self::Context) -> TableResult<ReferenceCatalog> {
        let (fatty_acids, fatty_acid_names) = self.fatty_acids.validate(())?;
        let (lipid_classes, lipid_class_index) = self.lipid_classes.validate(())?;
        let (modifications, modification_index) = self
            .modifications
            .map_or_else(|| Ok(Vec::new()), |m| m.groups.validate(()))?
            .validate(())?;

        Ok(ReferenceCatalog {
            fatty_acids,
            fatty_acid_names,
            lipid_classes,
            lipid_class_index,
            modifications,
            modification_index,
        })
    }
}

// Validate Fatty Acids ================================================================================================

type FattyAcids = (Vec<FattyAcid>, HashMap<FattyAcid, String>);

impl ValidateInto<'_, FattyAcids> for Vec<FattyAcidKdl> {
    type Context = ();

    fn validate(self, _ctx: Self::Context) -> TableResult<FattyAcids> {
        let mut seen_fatty_acids: HashMap<FattyAcid, (Span, Option<String>)> = HashMap::new();

        for fatty_acid_kdl in self {
            let fatty_acid = FattyAcid::parse(&fatty_acid_kdl.shorthand).map_err(|e| {
                ReferenceTableErrorKind::MalformedShorthand(fatty_acid_kdl.span, e)
            })?;

            match seen_fatty_acids.entry(fatty_acid) {
                Entry::Occupied(mut e) => {
                    let (first_defined_at, name) = e.get_mut();
                    // NOTE: A row without a name never conflicts, it just inherits the name of its duplicate
                    let conflicting = matches!(
                        (&*name, &fatty_acid_kdl.name),
                        (Some(first), Some(second)) if first != second
                    );
                    if conflicting {
                        return Err(ReferenceTableErrorKind::DuplicateReferenceEntry(
                            *first_defined_at,
                            fatty_acid_kdl.span,
                            fatty_acid.to_string(),
                        ));
                    }
                    if name.is_none() {
                        *name = fatty_acid_kdl.name;
                    }
                    warn!("the fatty acid {fatty_acid} is listed more than once, merging the duplicate rows");
                }
                Entry::Vacant(e) => {
                    e.insert((fatty_acid_kdl.span, fatty_acid_kdl.name));
                }
            }
        }

        let mut fatty_acids: Vec<_> = seen_fatty_acids.keys().copied().collect();
        fatty_acids.sort_unstable();

        let names = seen_fatty_acids
            .into_iter()
            .filter_map(|(fatty_acid, (_, name))| Some((fatty_acid, name?)))
            .collect();

        Ok((fatty_acids, names))
    }
}

// Validate Lipid Classes ==============================================================================================

type LipidClasses = (Vec<LipidClass>, HashMap<String, usize>);

impl ValidateInto<'_, LipidClasses> for Vec<LipidClassKdl> {
    type Context = ();

    fn validate(self, _ctx: Self::Context) -> TableResult<LipidClasses> {
        let mut seen_classes = HashMap::new();
        let mut lipid_classes = Vec::with_capacity(self.len());

        for class_kdl in self {
            match seen_classes.entry(class_kdl.abbr.clone()) {
                Entry::Occupied(e) => {
                    let (abbr, (first_defined_at, _)) = e.remove_entry();
                    return Err(ReferenceTableErrorKind::DuplicateLipidClass(
                        first_defined_at,
                        class_kdl.span,
                        abbr,
                    ));
                }
                Entry::Vacant(e) => e.insert((class_kdl.span, lipid_classes.len())),
            };

            lipid_classes.push(LipidClass {
                abbr: class_kdl.abbr,
                name: class_kdl.name,
                chains: class_kdl.chains as usize,
                stacking: class_kdl.stacking.unwrap_or(true),
            });
        }

        let index = seen_classes.into_iter().map(|(k, (_, i))| (k, i)).collect();
        Ok((lipid_classes, index))
    }
}

// Validate Modifications ==============================================================================================

type SpannedModification = (Span, Modification);

impl ValidateInto<'_, Vec<SpannedModification>> for Vec<ModificationGroupKdl> {
    type Context = ();

    fn validate(self, _ctx: Self::Context) -> TableResult<Vec<SpannedModification>> {
        let mut seen_groups = HashMap::new();
        let mut modifications = Vec::new();

        for group_kdl in self {
            let group: ModificationGroup = group_kdl.group.parse().map_err(|_| {
                ReferenceTableErrorKind::UnknownModificationGroup(group_kdl.span, group_kdl.group.clone())
            })?;

            if let Some(first_defined_at) = seen_groups.insert(group, group_kdl.span) {
                return Err(ReferenceTableErrorKind::DuplicateModificationGroup(
                    first_defined_at,
                    group_kdl.span,
                    group_kdl.group,
                ));
            }

            let stackable = group_kdl.stackable.unwrap_or(true);
            for modification_kdl in group_kdl.modifications {
                let span = modification_kdl.span;
                modifications.push((span, modification_kdl.validate((group, stackable))?));
            }
        }

        // NOTE: This sort is stable, so declaration order is kept within each group
        modifications.sort_by_key(|(_, m)| m.group);
        Ok(modifications)
    }
}

// ---------------------------------------------------------------------------------------------------------------------

type Modifications = (Vec<Modification>, HashMap<String, usize>);

impl ValidateInto<'_, Modifications> for Vec<SpannedModification> {
    type Context = ();

    fn validate(self, _ctx: Self::Context) -> TableResult<Modifications> {
        let mut seen_modifications: HashMap<String, (Span, usize)> = HashMap::new();

        for (i, (span, modification)) in self.iter().enumerate() {
            match seen_modifications.entry(modification.abbr.clone()) {
                Entry::Occupied(e) => {
                    let (abbr, (first_defined_at, _)) = e.remove_entry();
                    // NOTE: Sorting by group may have swapped the two definitions, so report them in file order
                    let (first, second) = if first_defined_at.0 <= span.0 {
                        (first_defined_at, *span)
                    } else {
                        (*span, first_defined_at)
                    };
                    return Err(ReferenceTableErrorKind::DuplicateModification(
                        first, second, abbr,
                    ));
                }
                Entry::Vacant(e) => e.insert((*span, i)),
            };
        }

        let modifications = self.into_iter().map(|(_, m)| m).collect();
        let index = seen_modifications
            .into_iter()
            .map(|(k, (_, i))| (k, i))
            .collect();
        Ok((modifications, index))
    }
}

// ---------------------------------------------------------------------------------------------------------------------

impl ValidateInto<'_, Modification> for ModificationKdl {
    type Context = (ModificationGroup, bool);

    fn validate(self, (group, group_stackable): Self::Context) -> TableResult<Modification> {
        let conflict = |reason| {
            ReferenceTableErrorKind::ConflictingConstraints(self.span, self.abbr.clone(), reason)
        };

        let product = match (group, self.product) {
            (ModificationGroup::Cleavage, None) => {
                return Err(ReferenceTableErrorKind::MissingCleavageProduct(
                    self.span,
                    self.abbr.clone(),
                ));
            }
            (ModificationGroup::Cleavage, Some(product)) => Some(product.validate(())?),
            (_, Some(product)) => {
                return Err(ReferenceTableErrorKind::UnexpectedCleavageProduct(
                    *product.span(),
                    self.abbr.clone(),
                ));
            }
            (_, None) => None,
        };

        let constraints = ChainConstraints::new(
            self.min_carbons.unwrap_or(0),
            self.max_carbons,
            self.min_double_bonds.unwrap_or(0),
            self.max_double_bonds,
        );
        if constraints.is_contradictory() {
            return Err(conflict("a minimum is larger than its maximum"));
        }
        if let Some(product) = product {
            if constraints.max_carbons().is_some_and(|max| max <= product.carbons()) {
                return Err(conflict(
                    "its cleavage product is at least as long as the longest chain it can cleave",
                ));
            }
            if constraints.max_double_bonds().is_some_and(|max| max < product.double_bonds()) {
                return Err(conflict(
                    "its cleavage product is more unsaturated than any chain it can cleave",
                ));
            }
        }

        let terminal = self.terminal.unwrap_or(group.terminal_by_default());
        if group.terminal_by_default() && !terminal {
            return Err(conflict(
                "cleavages replace the rest of their chain, so they can't be declared non-terminal",
            ));
        }
        if terminal && !group.accepts_terminal() {
            return Err(conflict(
                "terminal modifications exclude every prostane-ring or other modification, including themselves",
            ));
        }

        Ok(Modification {
            group,
            abbr: self.abbr,
            name: self.name,
            constraints,
            terminal,
            stackable: self.stackable.unwrap_or(group_stackable),
            product,
        })
    }
}

// ---------------------------------------------------------------------------------------------------------------------

impl ValidateInto<'_, FattyAcid> for ShorthandKdl {
    type Context = ();

    fn validate(self, _ctx: Self::Context) -> TableResult<FattyAcid> {
        let span = *self.span();
        let product = FattyAcid::parse(&*self)
            .map_err(|e| ReferenceTableErrorKind::MalformedShorthand(span, e))?;

        if product.linkage() == Linkage::Acyl {
            Ok(product)
        } else {
            Err(ReferenceTableErrorKind::LinkedCleavageProduct(
                span,
                product.to_string(),
            ))
        }
    }
}

// Validation Error Types and Trait Implementations  ===================================================================

#[derive(Debug, Error)]
#[error("failed to validate reference catalog file")]
pub struct MalformedReferenceTable {
    kdl: NamedSource<String>,
    #[source]
    kind: ReferenceTableErrorKind,
}

impl MalformedReferenceTable {
    #[must_use]
    pub const fn kind(&self) -> &ReferenceTableErrorKind {
        &self.kind
    }
}

// NOTE: This is manually implemented because the list of labels is dynamic and needs to be extracted from `self.kind`
impl Diagnostic for MalformedReferenceTable {
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.kdl)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(self.kind.labels().into_iter().map(|(s, l)| {
            LabeledSpan::new_with_span(Some(l.to_owned()), *s)
        })))
    }

    fn diagnostic_source(&self) -> Option<&dyn Diagnostic> {
        Some(&self.kind)
    }
}

#[derive(Clone, Debug, Diagnostic, Error)]
pub enum ReferenceTableErrorKind {
    #[error("the fatty acid {2} has already been listed under a different name")]
    #[diagnostic(help("remove one of the rows, or make their names agree"))]
    DuplicateReferenceEntry(Span, Span, String),

    #[error("the lipid class {2:?} has already been defined")]
    #[diagnostic(help("double-check for typos, or remove the duplicate lipid class"))]
    DuplicateLipidClass(Span, Span, String),

    #[error("the modification {2:?} has already been defined")]
    #[diagnostic(help("modification abbreviations must be unique across every group"))]
    DuplicateModification(Span, Span, String),

    #[error("the modification group {2:?} has already been defined")]
    #[diagnostic(help("merge the modifications of both groups into a single node"))]
    DuplicateModificationGroup(Span, Span, String),

    #[error("{1:?} is not a modification group")]
    #[diagnostic(help("expected one of: cleavage, oxygen-addition, prostane-ring, or other"))]
    UnknownModificationGroup(Span, String),

    #[error("reference catalog file contained an invalid fatty acid shorthand")]
    MalformedShorthand(
        Span,
        #[source]
        #[diagnostic_source]
        ShorthandError,
    ),

    #[error("the cleavage modification {1:?} is missing its product")]
    #[diagnostic(help("add the remaining chain as a property, like product=\"9:0\""))]
    MissingCleavageProduct(Span, String),

    #[error("the modification {1:?} has a product, but only cleavage modifications can")]
    #[diagnostic(help("remove the product, or move {1:?} into the cleavage group"))]
    UnexpectedCleavageProduct(Span, String),

    #[error("the cleavage product {1} has a linkage prefix")]
    #[diagnostic(help(
        "cleaved chains keep the linkage of the chain they were cut from, so products are written as plain acyl chains"
    ))]
    LinkedCleavageProduct(Span, String),

    #[error("the modification {1:?} can never be applied: {2}")]
    #[diagnostic(help("double-check the modification's properties"))]
    ConflictingConstraints(Span, String, &'static str),
}

impl ReferenceTableErrorKind {
    fn labels(&self) -> Vec<(&Span, &'static str)> {
        match self {
            Self::DuplicateReferenceEntry(s1, s2, _)
            | Self::DuplicateLipidClass(s1, s2, _)
            | Self::DuplicateModification(s1, s2, _)
            | Self::DuplicateModificationGroup(s1, s2, _) => {
                vec![(s1, "first defined here"), (s2, "then again here")]
            }
            Self::UnknownModificationGroup(s, _) => vec![(s, "unknown group")],
            Self::MalformedShorthand(s, _) => vec![(s, "invalid shorthand")],
            Self::MissingCleavageProduct(s, _) => vec![(s, "no product")],
            Self::UnexpectedCleavageProduct(s, _) => vec![(s, "unexpected product")],
            Self::LinkedCleavageProduct(s, _) => vec![(s, "linked product")],
            Self::ConflictingConstraints(s, _, _) => vec![(s, "unsatisfiable modification")],
        }
    }

    fn finalize(self, file_name: impl AsRef<str>, kdl: impl AsRef<str>) -> MalformedReferenceTable {
        let kdl = NamedSource::new(file_name, kdl.as_ref().to_owned());
        MalformedReferenceTable { kdl, kind: self }
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use itertools::Itertools;
    use once_cell::sync::Lazy;

    use super::*;

    const KDL: &str = include_str!("../tests/data/reference_catalog.kdl");

    static CATALOG: Lazy<ReferenceCatalog> =
        Lazy::new(|| ReferenceCatalog::new("reference_catalog.kdl", KDL).unwrap());

    fn error_kind(kdl: &str) -> ReferenceTableErrorKind {
        let report = ReferenceCatalog::new("test.kdl", kdl).unwrap_err();
        report
            .downcast_ref::<MalformedReferenceTable>()
            .unwrap()
            .kind()
            .clone()
    }

    fn abbrs<'a>(modifications: impl IntoIterator<Item = &'a Modification>) -> Vec<&'a str> {
        modifications.into_iter().map(Modification::abbr).collect()
    }

    #[test]
    fn fatty_acids_are_canonical() {
        let fatty_acids = CATALOG.fatty_acids().iter().map(ToString::to_string).collect_vec();
        assert_eq!(
            fatty_acids,
            ["16:0", "P-16:0", "18:0", "18:1", "18:2", "20:4"]
        );

        let oleic = FattyAcid::acyl(18, 1);
        assert_eq!(CATALOG.fatty_acid_name(&oleic), Some("Oleic Acid"));
        let plasmalogen = FattyAcid::new(16, 0, Linkage::Alkenyl);
        assert_eq!(CATALOG.fatty_acid_name(&plasmalogen), None);
    }

    #[test]
    fn lipid_classes_keep_declaration_order() {
        let classes = CATALOG.lipid_classes().iter().map(LipidClass::abbr).collect_vec();
        assert_eq!(classes, ["FA", "LPC", "PC", "TG", "CL"]);

        let pc = CATALOG.lipid_class("PC").unwrap();
        assert_eq!(pc.name(), "Phosphatidylcholine");
        assert_eq!(pc.chains(), 2);
        assert!(pc.stacking());

        let tg = CATALOG.lipid_class("TG").unwrap();
        assert_eq!(tg.chains(), 3);
        assert!(!tg.stacking());

        assert_eq!(
            *CATALOG.lipid_class("PX").unwrap_err(),
            LipidomeError::ClassLookup {
                abbr: "PX".to_owned()
            }
        );
    }

    #[test]
    fn modifications_are_grouped() {
        assert_eq!(
            abbrs(CATALOG.modifications()),
            ["Aldehyde", "CarboxylicAcid", "OH", "OOH", "KETO", "A", "D-IsoK"]
        );
        assert_eq!(
            abbrs(CATALOG.modifications_in(ModificationGroup::OxygenAddition)),
            ["OH", "OOH", "KETO"]
        );

        let aldehyde = CATALOG.modification("Aldehyde").unwrap();
        assert_eq!(aldehyde.group(), ModificationGroup::Cleavage);
        assert_eq!(aldehyde.product(), Some(FattyAcid::acyl(9, 0)));
        assert_eq!(aldehyde.constraints().min_double_bonds(), 1);
        assert!(aldehyde.is_terminal());
        assert!(aldehyde.is_stackable());

        let keto = CATALOG.modification("KETO").unwrap();
        assert_eq!(keto.product(), None);
        assert!(!keto.is_terminal());

        let isok = CATALOG.modification("D-IsoK").unwrap();
        assert_eq!(isok.constraints().min_carbons(), 20);
        assert!(!isok.is_stackable());

        assert_eq!(
            *CATALOG.modification("OOOH").unwrap_err(),
            LipidomeError::ModificationLookup {
                abbr: "OOOH".to_owned()
            }
        );
    }

    #[test]
    fn declaration_order_of_groups_is_irrelevant() {
        let catalog = ReferenceCatalog::new(
            "reversed.kdl",
            indoc! {r#"
                fatty-acids {
                    "18:2"
                }
                lipid-classes {
                    FA "Fatty Acid" chains=1
                }
                modifications {
                    other stackable=false {
                        TXA "Thromboxane A"
                    }
                    oxygen-addition {
                        OH "Hydroxy"
                    }
                    m_ocp {
                        Aldehyde "Aldehyde" product="9:0"
                    }
                }
            "#},
        )
        .unwrap();
        assert_eq!(abbrs(catalog.modifications()), ["Aldehyde", "OH", "TXA"]);
        assert!(catalog.modification("OH").unwrap().is_stackable());
        assert!(!catalog.modification("TXA").unwrap().is_stackable());
    }

    #[test]
    fn unoxidized_catalogs() {
        let catalog = ReferenceCatalog::new(
            "unoxidized.kdl",
            indoc! {r#"
                fatty-acids {
                    "16:0" "Palmitic Acid"
                    "16:0" "Palmitic Acid"
                    "O-16:0"
                }
                lipid-classes {
                    PE "Phosphatidylethanolamine" chains=2
                }
            "#},
        )
        .unwrap();
        assert_eq!(catalog.fatty_acids().len(), 2);
        assert!(catalog.modifications().is_empty());
    }

    #[test]
    fn missing_fields_fail_to_decode() {
        let missing_chains = indoc! {r#"
            fatty-acids {
                "16:0"
            }
            lipid-classes {
                PC "Phosphatidylcholine"
            }
        "#};
        let related = |kdl| {
            let report = ReferenceCatalog::new("test.kdl", kdl).unwrap_err();
            assert!(report.downcast_ref::<MalformedReferenceTable>().is_none());
            insta::allow_duplicates! {
                insta::assert_snapshot!(report, @"error parsing KDL");
            }
            report.related().unwrap().map(ToString::to_string).join("\n")
        };

        let message = related(missing_chains);
        assert!(message.contains("chains") && message.contains("required"), "{message}");

        let missing_classes = indoc! {r#"
            fatty-acids {
                "16:0"
            }
        "#};
        let message = related(missing_classes);
        assert!(message.contains("lipid-classes") && message.contains("required"), "{message}");
    }

    #[test]
    fn malformed_fatty_acids() {
        let kind = error_kind(indoc! {r#"
            fatty-acids {
                "16:0"
                "18:19"
            }
            lipid-classes {}
        "#});
        assert!(matches!(kind, ReferenceTableErrorKind::MalformedShorthand(..)));

        let kind = error_kind(indoc! {r#"
            fatty-acids {
                "18:1" "Oleic Acid"
                "18:1" "Elaidic Acid"
            }
            lipid-classes {}
        "#});
        assert!(
            matches!(kind, ReferenceTableErrorKind::DuplicateReferenceEntry(_, _, ref fa) if fa == "18:1")
        );
    }

    #[test]
    fn unnamed_duplicates_are_merged() {
        let catalog = ReferenceCatalog::new(
            "test.kdl",
            indoc! {r#"
                fatty-acids {
                    "18:1" "Oleic Acid"
                    "18:1"
                    "20:4"
                    "20:4" "Arachidonic Acid"
                }
                lipid-classes {}
            "#},
        )
        .unwrap();
        assert_eq!(catalog.fatty_acids().len(), 2);
        let name = |fa| catalog.fatty_acid_name(&FattyAcid::parse(fa).unwrap());
        assert_eq!(name("18:1"), Some("Oleic Acid"));
        assert_eq!(name("20:4"), Some("Arachidonic Acid"));
    }

    #[test]
    fn duplicate_definitions() {
        let kind = error_kind(indoc! {r#"
            fatty-acids {}
            lipid-classes {
                PC "Phosphatidylcholine" chains=2
                PC "Phosphatidylcholine" chains=2
            }
        "#});
        assert!(matches!(kind, ReferenceTableErrorKind::DuplicateLipidClass(..)));

        let kind = error_kind(indoc! {r#"
            fatty-acids {}
            lipid-classes {}
            modifications {
                oxygen-addition {
                    OH "Hydroxy"
                }
                m_oap {
                    OOH "Hydroperoxy"
                }
            }
        "#});
        assert!(matches!(kind, ReferenceTableErrorKind::DuplicateModificationGroup(..)));

        let kind = error_kind(indoc! {r#"
            fatty-acids {}
            lipid-classes {}
            modifications {
                other {
                    A "Isoketal A"
                }
                prostane-ring {
                    A "Prostane A-Ring"
                }
            }
        "#});
        let ReferenceTableErrorKind::DuplicateModification(first, second, abbr) = kind else {
            panic!("expected a duplicate modification error");
        };
        assert_eq!(abbr, "A");
        assert!(first.0 < second.0);
    }

    #[test]
    fn malformed_modifications() {
        let kind = error_kind(indoc! {r#"
            fatty-acids {}
            lipid-classes {}
            modifications {
                oxidation {
                    OH "Hydroxy"
                }
            }
        "#});
        assert!(matches!(kind, ReferenceTableErrorKind::UnknownModificationGroup(..)));

        let kind = error_kind(indoc! {r#"
            fatty-acids {}
            lipid-classes {}
            modifications {
                cleavage {
                    Aldehyde "Aldehyde"
                }
            }
        "#});
        assert!(matches!(kind, ReferenceTableErrorKind::MissingCleavageProduct(..)));

        let kind = error_kind(indoc! {r#"
            fatty-acids {}
            lipid-classes {}
            modifications {
                oxygen-addition {
                    OH "Hydroxy" product="9:0"
                }
            }
        "#});
        assert!(matches!(kind, ReferenceTableErrorKind::UnexpectedCleavageProduct(..)));

        let kind = error_kind(indoc! {r#"
            fatty-acids {}
            lipid-classes {}
            modifications {
                cleavage {
                    Aldehyde "Aldehyde" product="P-9:0"
                }
            }
        "#});
        assert!(matches!(kind, ReferenceTableErrorKind::LinkedCleavageProduct(..)));

        let kind = error_kind(indoc! {r#"
            fatty-acids {}
            lipid-classes {}
            modifications {
                cleavage {
                    Aldehyde "Aldehyde" product="9"
                }
            }
        "#});
        assert!(matches!(kind, ReferenceTableErrorKind::MalformedShorthand(..)));
    }

    #[test]
    fn conflicting_constraints() {
        let conflicts = [
            r#"oxygen-addition { OH "Hydroxy" min-carbons=20 max-carbons=18; }"#,
            r#"oxygen-addition { OH "Hydroxy" min-double-bonds=3 max-double-bonds=2; }"#,
            r#"cleavage { Aldehyde "Aldehyde" product="9:0" max-carbons=9; }"#,
            r#"cleavage { Aldehyde "Aldehyde" product="9:1" max-double-bonds=0; }"#,
            r#"prostane-ring { A "Prostane A-Ring" terminal=true; }"#,
            r#"other { TXB "Thromboxane B" terminal=true; }"#,
            r#"cleavage { Aldehyde "Aldehyde" product="9:0" terminal=false; }"#,
        ];
        for modifications in conflicts {
            let kdl = format!("fatty-acids {{}}\nlipid-classes {{}}\nmodifications {{ {modifications} }}");
            let kind = error_kind(&kdl);
            assert!(
                matches!(kind, ReferenceTableErrorKind::ConflictingConstraints(..)),
                "{modifications} produced {kind:?}"
            );
        }

        // Oxygen-additions may be declared terminal
        let catalog = ReferenceCatalog::new(
            "test.kdl",
            indoc! {r#"
                fatty-acids {}
                lipid-classes {}
                modifications {
                    cleavage {
                        Aldehyde "Aldehyde" product="9:0" terminal=true max-carbons=10
                    }
                    oxygen-addition {
                        OOH "Hydroperoxy" terminal=true
                    }
                }
            "#},
        )
        .unwrap();
        assert!(catalog.modification("Aldehyde").unwrap().is_terminal());
        assert!(catalog.modification("OOH").unwrap().is_terminal());
    }

    #[test]
    fn error_messages() {
        let kind = error_kind(indoc! {r#"
            fatty-acids {}
            lipid-classes {}
            modifications {
                cleavage {
                    Aldehyde "Aldehyde"
                }
            }
        "#});
        insta::assert_snapshot!(kind, @r#"the cleavage modification "Aldehyde" is missing its product"#);
    }
}
