//! The `syntaxdrill generators` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use syntaxdrill_core::GeneratorRegistry;

pub fn execute(samples: usize) -> Result<()> {
    let registry = GeneratorRegistry::with_builtins();

    let mut table = Table::new();
    table.set_header(vec!["Generator", "Parameters", "Distinct", "Status"]);

    for report in registry.self_check(samples) {
        let keys = registry
            .generate(&report.generator, "syntaxdrill:keys")
            .map(|params| params.keys().collect::<Vec<_>>().join(", "))
            .unwrap_or_default();
        let status = if !report.is_consistent() {
            format!("FAIL ({} seeds)", report.failing_seeds.len())
        } else if !report.is_diverse() {
            "constant".to_string()
        } else {
            "ok".to_string()
        };
        table.add_row(vec![
            Cell::new(&report.generator),
            Cell::new(keys),
            Cell::new(format!("{}/{}", report.distinct, report.samples)),
            Cell::new(status),
        ]);
    }

    println!("{table}");
    println!("{} generators, {samples} seeds each", registry.len());

    Ok(())
}
