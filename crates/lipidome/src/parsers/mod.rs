//! `nom` grammars for the textual notations used in reference catalogs

pub mod errors;
pub mod fatty_acid;
