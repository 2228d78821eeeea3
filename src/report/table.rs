//! Bin statistics table

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::{BinStats, FittedBinning};

const HEADERS: [&str; 9] = ["bin", "freq", "miss", "bads", "rate", "woe", "iv", "ks", "rule"];

fn numeric(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

fn woe_cell(bin: &BinStats) -> Cell {
    match bin.woe {
        Some(woe) => numeric(format!("{:.4}", woe)).fg(if woe >= 0.0 { Color::Red } else { Color::Green }),
        None => numeric("-".to_string()).fg(Color::DarkGrey),
    }
}

/// Render the bins of a fitted binning.
///
/// Display rounding only: rate, woe and iv to 4 decimals, ks to 2. An
/// undefined WoE is shown as `-`.
pub fn render_bin_table(binning: &FittedBinning) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(
        HEADERS
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );

    for bin in binning.bins() {
        table.add_row(vec![
            numeric(bin.bin.to_string()),
            numeric(bin.freq.to_string()),
            numeric(bin.miss.to_string()),
            numeric(format!("{}", bin.bads)),
            numeric(format!("{:.4}", bin.rate)),
            woe_cell(bin),
            numeric(format!("{:.4}", bin.iv)),
            numeric(format!("{:.2}", bin.ks)),
            Cell::new(&bin.rule),
        ]);
    }

    table
}

/// Print a feature's bin table under a heading, indented like the rest of
/// the CLI output
pub fn print_bin_table(feature: &str, binning: &FittedBinning) {
    let summary = binning.summarize();
    println!();
    println!(
        "    {} {}  {}",
        style("▸").cyan(),
        style(feature).white().bold(),
        style(format!(
            "{} | iv {:.4} | ks {:.2}",
            binning.direction(),
            summary.iv,
            summary.ks
        ))
        .dim()
    );

    for line in render_bin_table(binning).to_string().lines() {
        println!("    {}", line);
    }
}
