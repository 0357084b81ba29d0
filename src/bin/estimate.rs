use lipidome::{Counting, ReferenceCatalog, RunConfig, SiteMode, TheoreticalLipidome};
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

fn main() -> miette::Result<()> {
    TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .unwrap();

    let catalog = ReferenceCatalog::new(
        "reference_catalog.kdl",
        include_str!("../../crates/lipidome/data/reference_catalog.kdl"),
    )?;
    let config = RunConfig::new(
        "run_config.kdl",
        include_str!("../../crates/lipidome/data/run_config.kdl"),
    )?;
    let selection = config.select(&catalog).map_err(|e| *e)?;
    let estimate = TheoreticalLipidome::new(&catalog, &selection);

    for counting in [Counting::Combinatorial, Counting::PositionSpecific] {
        println!("Unoxidized lipids ({counting}): {}", estimate.unoxidized_lipids(counting));
        for site_mode in SiteMode::ALL {
            println!("\nOxidation sites = {site_mode} ({counting}):");
            println!(
                "  Oxidized fatty acids: {}",
                estimate.oxidized_fatty_acids(site_mode, counting)
            );
            println!(
                "  Lipids with at most one oxidized chain: {}",
                estimate.single_oxidized_chain_lipids(site_mode, counting)
            );
            println!(
                "  Lipids with any number of oxidized chains: {}",
                estimate.all_oxidized_chain_lipids(site_mode, counting)
            );
        }
        println!();
    }

    Ok(())
}
