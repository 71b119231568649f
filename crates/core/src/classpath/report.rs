//! Plain-text collision report, grouped by jar.

use crate::classpath::scanner::ClassIndex;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes one section per jar, listing each of its classes that another
/// archive also defines, cross-referenced to those archives. Callers only
/// invoke this when the index actually has collisions.
pub fn write_report(index: &ClassIndex, destination: &Path) -> std::io::Result<()> {
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(File::create(destination)?);

    writeln!(out, "Classpath collision report")?;
    writeln!(out, "==========================")?;

    // label -> [(class, other labels)], label order keeps the report stable
    let mut sections: BTreeMap<String, Vec<(String, Vec<String>)>> = BTreeMap::new();
    for (class, jar_indices) in index.collision_indices() {
        for &jar_index in jar_indices {
            let others: Vec<String> = jar_indices
                .iter()
                .filter(|&&other| other != jar_index)
                .map(|&other| index.jar(other).label())
                .collect();
            sections
                .entry(index.jar(jar_index).label())
                .or_default()
                .push((class.clone(), others));
        }
    }

    for (label, classes) in sections {
        writeln!(out)?;
        writeln!(out, "{label}")?;
        for (class, others) in classes {
            writeln!(out, "    {class}")?;
            for other in others {
                writeln!(out, "        also defined in: {other}")?;
            }
        }
    }

    out.flush()
}
