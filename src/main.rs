use std::fmt::Write;

use lipidome::{Lipidome, ReferenceCatalog, Result, RunConfig};
use log::LevelFilter;
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme};
use once_cell::sync::Lazy;
use rustyline::DefaultEditor;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

static CATALOG: Lazy<ReferenceCatalog> = Lazy::new(|| {
    ReferenceCatalog::new(
        "reference_catalog.kdl",
        include_str!("../crates/lipidome/data/reference_catalog.kdl"),
    )
    .unwrap()
});

static CONFIG: Lazy<RunConfig> = Lazy::new(|| {
    RunConfig::new(
        "run_config.kdl",
        include_str!("../crates/lipidome/data/run_config.kdl"),
    )
    .unwrap()
});

static LIPIDOME: Lazy<Lipidome> = Lazy::new(|| Lipidome::new(&CATALOG, &CONFIG).unwrap());

fn main() {
    TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .unwrap();

    print!("{}", summary());

    let mut rl = DefaultEditor::new().unwrap();
    while let Ok(abbr) = rl.readline("Lipid Class: ") {
        rl.add_history_entry(&abbr).unwrap();
        match species_list(abbr.trim()) {
            Ok(list) => print!("{list}"),
            Err(diagnostic) => render_error(*diagnostic),
        }
    }
}

fn summary() -> String {
    let mut buf = String::new();
    let mut total = 0;
    for class in LIPIDOME.selection().classes() {
        match LIPIDOME.count(class) {
            Ok(count) => {
                total += count;
                writeln!(buf, "{:<4} {:<32} {count:>12}", class.abbr(), class.name()).unwrap();
            }
            Err(diagnostic) => render_error(*diagnostic),
        }
    }
    writeln!(buf, "{:<37} {total:>12}\n", "Total").unwrap();
    buf
}

fn species_list(abbr: &str) -> Result<String> {
    let class = CATALOG.lipid_class(abbr)?;

    let mut buf = String::new();
    let mut count = 0;
    for species in LIPIDOME.species(class)? {
        count += 1;
        writeln!(buf, "{species}").unwrap();
    }
    writeln!(buf, "\n{count} species of {}\n", class.name()).unwrap();

    Ok(buf)
}

fn render_error(diagnostic: impl Into<Box<dyn Diagnostic + 'static>>) {
    let mut buf = String::new();
    GraphicalReportHandler::new_themed(GraphicalTheme::unicode())
        .render_report(&mut buf, diagnostic.into().as_ref())
        .unwrap();
    println!("{buf}");
}
