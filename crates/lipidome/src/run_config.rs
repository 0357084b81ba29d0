//! Which lipid classes and modifications a run enumerates, and how

// Standard Library Imports
use std::collections::hash_map::Entry;

// External Crate Imports
use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};
use knus::{
    Decode,
    span::{Span, Spanned},
};
use log::{info, warn};
use miette::{Diagnostic, LabeledSpan, NamedSource};
use thiserror::Error;

// Local Crate Imports
use crate::{
    LipidClass, Modification, ModificationGroup, SiteMode,
    errors::{LipidomeError, Result},
    reference_catalog::ReferenceCatalog,
};

// Public API ==========================================================================================================

/// A run configuration, either read from KDL or built up in code
///
/// Lipid classes are listed under free-form group labels (conventionally `x1` through `x4`, after their number of
/// chains), but the number of chains a class takes always comes from the [`ReferenceCatalog`]. Leaving
/// `modifications` empty selects the unoxidized lipidome.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct RunConfig {
    pub lipid_classes: Vec<(String, Vec<String>)>,
    pub modifications: Vec<(ModificationGroup, Vec<String>)>,
    pub max_oxidized_chains: Option<usize>,
    pub limit: Option<u64>,
    pub site_mode: SiteMode,
}

impl RunConfig {
    pub fn new(file_name: impl AsRef<str>, kdl_text: impl AsRef<str>) -> miette::Result<Self> {
        let parsed_config: RunConfigKdl = knus::parse(file_name.as_ref(), kdl_text.as_ref())?;
        parsed_config
            .validate()
            .map_err(|e| e.finalize(file_name, kdl_text).into())
    }

    #[must_use]
    pub fn with_classes<S: Into<String>>(
        mut self,
        label: impl Into<String>,
        abbrs: impl IntoIterator<Item = S>,
    ) -> Self {
        let abbrs = abbrs.into_iter().map(Into::into).collect();
        self.lipid_classes.push((label.into(), abbrs));
        self
    }

    #[must_use]
    pub fn with_modifications<S: Into<String>>(
        mut self,
        group: ModificationGroup,
        abbrs: impl IntoIterator<Item = S>,
    ) -> Self {
        let abbrs = abbrs.into_iter().map(Into::into).collect();
        self.modifications.push((group, abbrs));
        self
    }

    #[must_use]
    pub const fn with_max_oxidized_chains(mut self, max_oxidized_chains: usize) -> Self {
        self.max_oxidized_chains = Some(max_oxidized_chains);
        self
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn with_site_mode(mut self, site_mode: SiteMode) -> Self {
        self.site_mode = site_mode;
        self
    }

    /// Resolves every abbreviation in this configuration against `catalog`
    pub fn select<'c>(&self, catalog: &'c ReferenceCatalog) -> Result<Selection<'c>> {
        let mut classes = Vec::new();
        let mut seen_classes = HashSet::new();
        for (label, abbrs) in &self.lipid_classes {
            for abbr in abbrs {
                let class = catalog.lipid_class(abbr)?;
                if !seen_classes.insert(abbr.as_str()) {
                    return Err(LipidomeError::duplicate_selection("lipid class", abbr).into());
                }
                warn_on_mislabelled_class(label, class);
                classes.push(class);
            }
        }

        let mut selected_modifications = HashSet::new();
        for (group, abbrs) in &self.modifications {
            for abbr in abbrs {
                let modification = catalog.modification(abbr)?;
                if modification.group() != *group {
                    return Err(LipidomeError::modification_group_mismatch(
                        abbr,
                        *group,
                        modification.group(),
                    )
                    .into());
                }
                if !selected_modifications.insert(abbr.as_str()) {
                    return Err(LipidomeError::duplicate_selection("modification", abbr).into());
                }
            }
        }
        let modifications: Vec<_> = catalog
            .modifications()
            .iter()
            .filter(|m| selected_modifications.contains(m.abbr()))
            .collect();

        info!(
            "selected {} lipid classes and {} modifications",
            classes.len(),
            modifications.len()
        );

        Ok(Selection {
            classes,
            modifications,
        })
    }
}

/// Lipid classes (in configuration order) and modifications (in catalog order) chosen for a run
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Selection<'c> {
    classes: Vec<&'c LipidClass>,
    modifications: Vec<&'c Modification>,
}

impl<'c> Selection<'c> {
    #[must_use]
    pub fn classes(&self) -> &[&'c LipidClass] {
        &self.classes
    }

    #[must_use]
    pub fn modifications(&self) -> &[&'c Modification] {
        &self.modifications
    }

    #[must_use]
    pub fn is_oxidized(&self) -> bool {
        !self.modifications.is_empty()
    }
}

// NOTE: Labels like `x2` promise a number of chains, so a class filed under the wrong one is probably a typo
fn warn_on_mislabelled_class(label: &str, class: &LipidClass) {
    let promised_chains = label.strip_prefix('x').and_then(|n| n.parse::<usize>().ok());
    if let Some(chains) = promised_chains.filter(|&n| n != class.chains()) {
        warn!(
            "the lipid class {} is listed under {label}, but has {} chains, not {chains}",
            class.abbr(),
            class.chains()
        );
    }
}

// KDL File Schema =====================================================================================================

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct RunConfigKdl {
    #[knus(child, unwrap(children))]
    lipid_classes: Vec<SelectionKdl>,
    #[knus(child)]
    modifications: Option<ModificationSelectionsKdl>,
    #[knus(child, unwrap(argument))]
    max_oxidized_chains: Option<u32>,
    #[knus(child, unwrap(argument))]
    limit: Option<u64>,
    #[knus(child, unwrap(argument))]
    site_mode: Option<Spanned<String, Span>>,
}

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct ModificationSelectionsKdl {
    #[knus(children)]
    groups: Vec<SelectionKdl>,
}

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct SelectionKdl {
    #[knus(span)]
    span: Span,
    #[knus(node_name)]
    label: String,
    #[knus(arguments)]
    abbrs: Vec<String>,
}

// Run Config Validation ===============================================================================================

type ConfigResult<T> = Result<T, RunConfigErrorKind>;

impl RunConfigKdl {
    fn validate(self) -> ConfigResult<RunConfig> {
        let lipid_classes = self
            .lipid_classes
            .into_iter()
            .map(|s| (s.label, s.abbrs))
            .collect();

        let mut seen_groups = HashMap::new();
        let mut modifications = Vec::new();
        for selection in self.modifications.map(|m| m.groups).unwrap_or_default() {
            let group: ModificationGroup = selection.label.parse().map_err(|_| {
                RunConfigErrorKind::UnknownModificationGroup(selection.span, selection.label.clone())
            })?;

            match seen_groups.entry(group) {
                Entry::Occupied(e) => {
                    return Err(RunConfigErrorKind::DuplicateModificationGroup(
                        *e.get(),
                        selection.span,
                        selection.label,
                    ));
                }
                Entry::Vacant(e) => e.insert(selection.span),
            };

            modifications.push((group, selection.abbrs));
        }

        let site_mode = self
            .site_mode
            .map(|mode| {
                mode.parse::<SiteMode>()
                    .map_err(|_| RunConfigErrorKind::UnknownSiteMode(*mode.span(), (*mode).clone()))
            })
            .transpose()?
            .unwrap_or_default();

        Ok(RunConfig {
            lipid_classes,
            modifications,
            max_oxidized_chains: self.max_oxidized_chains.map(|n| n as usize),
            limit: self.limit,
            site_mode,
        })
    }
}

// Validation Error Types and Trait Implementations  ===================================================================

#[derive(Debug, Error)]
#[error("failed to validate run configuration file")]
pub struct MalformedRunConfig {
    kdl: NamedSource<String>,
    #[source]
    kind: RunConfigErrorKind,
}

impl MalformedRunConfig {
    #[must_use]
    pub const fn kind(&self) -> &RunConfigErrorKind {
        &self.kind
    }
}

impl Diagnostic for MalformedRunConfig {
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
pub enum RunConfigErrorKind {
    #[error("{1:?} is not a modification group")]
    #[diagnostic(help("expected one of: cleavage, oxygen-addition, prostane-ring, or other"))]
    UnknownModificationGroup(Span, String),

    #[error("the modification group {2:?} has already been selected")]
    #[diagnostic(help("merge the two selections into a single node"))]
    DuplicateModificationGroup(Span, Span, String),

    #[error("{1:?} is not a site mode")]
    #[diagnostic(help("expected one of: bis-allylic, allylic, or db"))]
    UnknownSiteMode(Span, String),
}

impl RunConfigErrorKind {
    fn labels(&self) -> Vec<(&Span, &'static str)> {
        match self {
            Self::UnknownModificationGroup(s, _) => vec![(s, "unknown group")],
            Self::DuplicateModificationGroup(s1, s2, _) => {
                vec![(s1, "first selected here"), (s2, "then again here")]
            }
            Self::UnknownSiteMode(s, _) => vec![(s, "unknown site mode")],
        }
    }

    fn finalize(self, file_name: impl AsRef<str>, kdl: impl AsRef<str>) -> MalformedRunConfig {
        let kdl = NamedSource::new(file_name, kdl.as_ref().to_owned());
        MalformedRunConfig { kdl, kind: self }
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use itertools::Itertools;
    use once_cell::sync::Lazy;

    use super::*;

    const CATALOG_KDL: &str = include_str!("../tests/data/reference_catalog.kdl");

    static CATALOG: Lazy<ReferenceCatalog> =
        Lazy::new(|| ReferenceCatalog::new("reference_catalog.kdl", CATALOG_KDL).unwrap());

    const CONFIG_KDL: &str = indoc! {r#"
        lipid-classes {
            x1 "LPC"
            x2 "PC"
            x3 "TG"
        }
        modifications {
            m_oap "OOH" "OH"
            prostane-ring "A"
        }
        max-oxidized-chains 1
        limit 100000
        site-mode "allylic"
    "#};

    fn error_kind(kdl: &str) -> RunConfigErrorKind {
        let report = RunConfig::new("test.kdl", kdl).unwrap_err();
        report
            .downcast_ref::<MalformedRunConfig>()
            .unwrap()
            .kind()
            .clone()
    }

    #[test]
    fn parse_run_config() {
        let config = RunConfig::new("run_config.kdl", CONFIG_KDL).unwrap();
        let expected = RunConfig::default()
            .with_classes("x1", ["LPC"])
            .with_classes("x2", ["PC"])
            .with_classes("x3", ["TG"])
            .with_modifications(ModificationGroup::OxygenAddition, ["OOH", "OH"])
            .with_modifications(ModificationGroup::ProstaneRing, ["A"])
            .with_max_oxidized_chains(1)
            .with_limit(100_000)
            .with_site_mode(SiteMode::Allylic);
        assert_eq!(config, expected);
    }

    #[test]
    fn optional_settings() {
        let config = RunConfig::new(
            "unoxidized.kdl",
            indoc! {r#"
                lipid-classes {
                    x2 "PC" "PE"
                }
            "#},
        )
        .unwrap();
        assert!(config.modifications.is_empty());
        assert_eq!(config.max_oxidized_chains, None);
        assert_eq!(config.limit, None);
        assert_eq!(config.site_mode, SiteMode::BisAllylic);
    }

    #[test]
    fn select_from_catalog() {
        let config = RunConfig::new("run_config.kdl", CONFIG_KDL).unwrap();
        let selection = config.select(&CATALOG).unwrap();

        let classes = selection.classes().iter().map(|c| c.abbr()).collect_vec();
        assert_eq!(classes, ["LPC", "PC", "TG"]);
        // Modifications come back in catalog order, not configuration order
        let modifications = selection.modifications().iter().map(|m| m.abbr()).collect_vec();
        assert_eq!(modifications, ["OH", "OOH", "A"]);
        assert!(selection.is_oxidized());

        let unoxidized = RunConfig::default().with_classes("x4", ["CL"]);
        assert!(!unoxidized.select(&CATALOG).unwrap().is_oxidized());
    }

    #[test]
    fn selection_errors() {
        let unknown_class = RunConfig::default().with_classes("x2", ["PC", "PX"]);
        assert_eq!(
            *unknown_class.select(&CATALOG).unwrap_err(),
            LipidomeError::ClassLookup {
                abbr: "PX".to_owned()
            }
        );

        let unknown_modification = RunConfig::default()
            .with_classes("x2", ["PC"])
            .with_modifications(ModificationGroup::OxygenAddition, ["EPOXY"]);
        assert_eq!(
            *unknown_modification.select(&CATALOG).unwrap_err(),
            LipidomeError::ModificationLookup {
                abbr: "EPOXY".to_owned()
            }
        );

        let misfiled = RunConfig::default()
            .with_classes("x2", ["PC"])
            .with_modifications(ModificationGroup::Cleavage, ["OH"]);
        assert_eq!(
            *misfiled.select(&CATALOG).unwrap_err(),
            LipidomeError::ModificationGroupMismatch {
                abbr: "OH".to_owned(),
                selected: ModificationGroup::Cleavage,
                actual: ModificationGroup::OxygenAddition,
            }
        );

        let repeated_class = RunConfig::default()
            .with_classes("x1", ["LPC"])
            .with_classes("x2", ["PC", "LPC"]);
        assert_eq!(
            *repeated_class.select(&CATALOG).unwrap_err(),
            LipidomeError::DuplicateSelection {
                kind: "lipid class",
                abbr: "LPC".to_owned()
            }
        );

        let repeated_modification = RunConfig::default()
            .with_classes("x2", ["PC"])
            .with_modifications(ModificationGroup::OxygenAddition, ["OH", "OH"]);
        assert_eq!(
            *repeated_modification.select(&CATALOG).unwrap_err(),
            LipidomeError::DuplicateSelection {
                kind: "modification",
                abbr: "OH".to_owned()
            }
        );
    }

    #[test]
    fn malformed_configs() {
        let kind = error_kind(indoc! {r#"
            lipid-classes {}
            modifications {
                oxidation "OH"
            }
        "#});
        assert!(matches!(kind, RunConfigErrorKind::UnknownModificationGroup(_, ref g) if g == "oxidation"));

        let kind = error_kind(indoc! {r#"
            lipid-classes {}
            modifications {
                oxygen-addition "OH"
                m_oap "OOH"
            }
        "#});
        assert!(matches!(kind, RunConfigErrorKind::DuplicateModificationGroup(..)));

        let kind = error_kind(indoc! {r#"
            lipid-classes {}
            site-mode "vinylic"
        "#});
        assert!(matches!(kind, RunConfigErrorKind::UnknownSiteMode(_, ref m) if m == "vinylic"));

        // Missing sections and malformed values are caught while decoding
        assert!(RunConfig::new("test.kdl", "limit 10").is_err());
        assert!(RunConfig::new("test.kdl", "lipid-classes {}\nlimit \"lots\"").is_err());
    }
}
