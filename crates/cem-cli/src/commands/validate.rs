use std::io::{self, Write};
use std::path::Path;

use anyhow::{bail, Result};
use cem_io::load_network;
use tabwriter::TabWriter;

pub fn handle(path: &Path) -> Result<()> {
    let export = load_network(path)?;
    let network = &export.network;
    let stats = network.stats();

    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "snapshots\t{}", stats.num_snapshots)?;
    writeln!(writer, "buses\t{}", stats.num_buses)?;
    writeln!(writer, "carriers\t{}", stats.num_carriers)?;
    writeln!(writer, "generators\t{}", stats.num_generators)?;
    writeln!(writer, "storage units\t{}", stats.num_storage_units)?;
    writeln!(writer, "stores\t{}", stats.num_stores)?;
    writeln!(writer, "links\t{}", stats.num_links)?;
    writeln!(writer, "lines\t{}", stats.num_lines)?;
    writeln!(writer, "global constraints\t{}", stats.num_global_constraints)?;
    writeln!(writer, "peak load [MW]\t{:.1}", stats.peak_load_mw)?;
    writeln!(writer, "results\t{}", if export.results.is_some() { "yes" } else { "no" })?;
    writer.flush()?;

    let diagnostics = network.validate();
    print!("{}", diagnostics);
    if diagnostics.has_errors() {
        bail!("{} has {}", path.display(), diagnostics.summary());
    }
    Ok(())
}
