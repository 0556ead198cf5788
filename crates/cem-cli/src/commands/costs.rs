use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use cem_io::{CostTable, DataSource, SourceCache, TechnologyCosts};
use cem_model::ModelConfig;
use tabwriter::TabWriter;

pub fn handle(
    config_path: Option<&Path>,
    costs: Option<&str>,
    year: Option<u16>,
    technologies: &[String],
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => ModelConfig::from_path(path)?,
        None => ModelConfig::default(),
    };
    if let Some(year) = year {
        config.data.cost_year = year;
        config.data.costs = None;
    }
    if let Some(costs) = costs {
        config.data.costs = Some(costs.to_string());
    }

    let source: DataSource = config.costs_source().parse()?;
    let path = SourceCache::default_location()?
        .resolve(&source)
        .with_context(|| format!("resolving cost data {}", source))?;
    let table = CostTable::from_path(&path)?;

    let rows: Vec<&TechnologyCosts> = if technologies.is_empty() {
        table.iter().collect()
    } else {
        technologies
            .iter()
            .map(|t| table.get(t))
            .collect::<Result<_, _>>()?
    };
    print_costs(&rows)?;
    if !table.diagnostics.is_empty() {
        eprintln!("{}", table.diagnostics);
    }
    Ok(())
}

fn print_costs(rows: &[&TechnologyCosts]) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(
        writer,
        "TECHNOLOGY\tCAPITAL COST [EUR/MW/a]\tMARGINAL COST [EUR/MWh]\tEFFICIENCY\tLIFETIME [a]\tCO2 [t/MWh_th]"
    )?;
    for c in rows {
        writeln!(
            writer,
            "{}\t{:.1}\t{:.2}\t{:.3}\t{:.0}\t{:.3}",
            c.technology, c.capital_cost, c.marginal_cost, c.efficiency, c.lifetime, c.co2_intensity
        )?;
    }
    writer.flush()?;
    Ok(())
}
