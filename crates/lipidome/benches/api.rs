use divan::{AllocProfiler, Bencher, black_box};
use lipidome::{
    Combinations, Composer, Counting, FattyAcid, Lipidome, ReferenceCatalog, RunConfig, SiteMode,
    TheoreticalLipidome,
};
use once_cell::sync::Lazy;

#[global_allocator]
static ALLOC: AllocProfiler = AllocProfiler::system();

const CATALOG_KDL: &str = include_str!("../data/reference_catalog.kdl");
const CONFIG_KDL: &str = include_str!("../data/run_config.kdl");
const SHORTHANDS: [&str; 6] = ["16:0", "18:1", "20:4", "22:6", "O-16:0", "P-18:0"];

static CATALOG: Lazy<ReferenceCatalog> =
    Lazy::new(|| ReferenceCatalog::new("reference_catalog.kdl", CATALOG_KDL).unwrap());

static CONFIG: Lazy<RunConfig> = Lazy::new(|| RunConfig::new("run_config.kdl", CONFIG_KDL).unwrap());

static LIPIDOME: Lazy<Lipidome> = Lazy::new(|| Lipidome::new(&CATALOG, &CONFIG).unwrap());

fn main() {
    Lazy::force(&CATALOG);
    Lazy::force(&CONFIG);
    Lazy::force(&LIPIDOME);
    divan::main();
}

mod tables {
    use super::*;

    #[divan::bench]
    fn build_reference_catalog() -> ReferenceCatalog {
        ReferenceCatalog::new("reference_catalog.kdl", CATALOG_KDL).unwrap()
    }

    #[divan::bench]
    fn parse_run_config() -> RunConfig {
        RunConfig::new("run_config.kdl", CONFIG_KDL).unwrap()
    }

    #[divan::bench]
    fn parse_fatty_acids() {
        for shorthand in SHORTHANDS {
            black_box(FattyAcid::parse(shorthand).unwrap());
        }
    }
}

mod enumeration {
    use super::*;

    #[divan::bench]
    fn build_composer() -> Composer<'static> {
        let selection = CONFIG.select(&CATALOG).unwrap();
        Composer::new(CATALOG.fatty_acids(), selection.modifications())
    }

    #[divan::bench(args = ["LPC", "PC", "TG"])]
    fn combinations(abbr: &str) -> usize {
        let class = CATALOG.lipid_class(abbr).unwrap();
        Combinations::new(CATALOG.fatty_acids(), class).unwrap().count()
    }

    #[divan::bench(args = ["LPC", "PC"])]
    fn species(bencher: Bencher, abbr: &str) {
        let class = CATALOG.lipid_class(abbr).unwrap();
        bencher.bench(|| LIPIDOME.species(class).unwrap().count());
    }

    #[divan::bench]
    fn count_every_class() -> u128 {
        LIPIDOME
            .selection()
            .classes()
            .iter()
            .map(|class| LIPIDOME.count(class).unwrap())
            .sum()
    }
}

mod estimates {
    use super::*;

    #[divan::bench]
    fn estimate_every_site_mode() {
        let selection = CONFIG.select(&CATALOG).unwrap();
        let estimate = TheoreticalLipidome::new(&CATALOG, &selection);
        for site_mode in SiteMode::ALL {
            for counting in [Counting::Combinatorial, Counting::PositionSpecific] {
                black_box(estimate.single_oxidized_chain_lipids(site_mode, counting));
                black_box(estimate.all_oxidized_chain_lipids(site_mode, counting));
            }
        }
    }
}
