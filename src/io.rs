//! Block-file parsing and result writing.
//!
//! Input is one module per line, `<name> (<w> <h> <col> <row>) ...`,
//! with one parenthesized group per dimension option. Output is the
//! fixed-format placement file plus an optional appended summary row
//! per search run.

use crate::model::{Block, BlockModel, Dimension};
use crate::search::SearchReport;
use crate::tree::FloorTree;
use log::warn;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Everything that can go wrong at the crate's file boundaries.
#[derive(Debug, Error)]
pub enum ParafloorError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// A line named a module but none of its parenthesized groups
    /// parsed into a dimension option.
    #[error("module {name:?} has no valid dimension option")]
    EmptyOptions { name: String },

    #[error("input contains no modules")]
    NoBlocks,
}

/// Reads a block file into an immutable problem model.
pub fn read_blocks(path: &Path) -> Result<BlockModel, ParafloorError> {
    let file = File::open(path)?;
    parse_blocks(BufReader::new(file))
}

/// Parses block lines from any buffered reader.
///
/// Lines without a parenthesized group (blank lines, comments, stray
/// tokens) are skipped with a warning; a line that opens a group but
/// yields no valid option is fatal.
pub fn parse_blocks(reader: impl BufRead) -> Result<BlockModel, ParafloorError> {
    let mut blocks = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let Some(name) = line.split_whitespace().next() else {
            continue;
        };
        let rest = &line[line.find(name).unwrap_or(0) + name.len()..];
        if !rest.contains('(') {
            if !name.is_empty() {
                warn!("skipping input line without dimension groups: {line:?}");
            }
            continue;
        }

        let dimensions = parse_dimension_groups(rest);
        if dimensions.is_empty() {
            return Err(ParafloorError::EmptyOptions {
                name: name.to_string(),
            });
        }
        blocks.push(Block {
            name: name.to_string(),
            dimensions,
        });
    }
    if blocks.is_empty() {
        return Err(ParafloorError::NoBlocks);
    }
    Ok(BlockModel::new(blocks))
}

/// Extracts every `(w h col row)` group from a line remainder.
fn parse_dimension_groups(rest: &str) -> Vec<Dimension> {
    let mut dimensions = Vec::new();
    let mut cursor = rest;
    while let Some(open) = cursor.find('(') {
        let Some(close) = cursor[open..].find(')') else {
            break;
        };
        let inner = &cursor[open + 1..open + close];
        if let Some(dim) = parse_dimension(inner) {
            dimensions.push(dim);
        } else {
            warn!("skipping malformed dimension group: ({inner})");
        }
        cursor = &cursor[open + close + 1..];
    }
    dimensions
}

fn parse_dimension(inner: &str) -> Option<Dimension> {
    let mut tokens = inner.split_whitespace();
    let width: f64 = tokens.next()?.parse().ok()?;
    let height: f64 = tokens.next()?.parse().ok()?;
    let col_multiple: u32 = tokens.next()?.parse().ok()?;
    let row_multiple: u32 = tokens.next()?.parse().ok()?;
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some(Dimension {
        width,
        height,
        col_multiple,
        row_multiple,
    })
}

/// Writes the final placement file.
pub fn write_placement(
    path: &Path,
    tree: &FloorTree,
    model: &BlockModel,
) -> Result<(), ParafloorError> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    render_placement(&mut out, tree, model)?;
    out.flush()?;
    Ok(())
}

/// Renders the placement in the fixed output format: chip area, chip
/// extents, INL, then one module per line in natural name order.
pub fn render_placement(
    out: &mut impl Write,
    tree: &FloorTree,
    model: &BlockModel,
) -> io::Result<()> {
    writeln!(out, "{:.4}", tree.chip_area)?;
    writeln!(out, "{:.2} {:.2}", tree.chip_width, tree.chip_height)?;
    let inl = if tree.inl.is_finite() { tree.inl } else { 0.0 };
    writeln!(out, "{inl:.2}")?;

    // Each block occupies exactly one node; index node state by block.
    let mut node_of = vec![0usize; tree.len()];
    for (i, node) in tree.nodes.iter().enumerate() {
        node_of[node.block] = i;
    }
    for &block_id in model.natural_order() {
        let block = model.block(block_id);
        let node = &tree.nodes[node_of[block_id]];
        let dim = block.dimensions[node.dim];
        writeln!(
            out,
            "{} {:.3} {:.3} ({:.2} {:.2} {} {})",
            block.name, node.x, node.y, dim.width, dim.height, dim.col_multiple, dim.row_multiple
        )?;
    }
    Ok(())
}

const SUMMARY_HEADER: &str = "strategy,threads,wall_time_s,best_cost,chip_area,chip_width,\
                              chip_height,inl,moves_total,moves_accepted,accept_ratio,sa_runs";

/// Appends one summary row for a finished search, creating the file
/// (with header) on first use.
pub fn append_summary(path: &Path, report: &SearchReport) -> Result<(), ParafloorError> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let fresh = file.metadata()?.len() == 0;
    let mut out = BufWriter::new(file);
    if fresh {
        writeln!(out, "{SUMMARY_HEADER}")?;
    }
    let best = &report.best;
    let inl = if best.inl.is_finite() { best.inl } else { 0.0 };
    writeln!(
        out,
        "{},{},{:.4},{:.6},{:.4},{:.2},{:.2},{:.2},{},{},{:.4},{}",
        report.strategy,
        report.workers,
        report.wall_time.as_secs_f64(),
        best.cost,
        best.chip_area,
        best.chip_width,
        best.chip_height,
        inl,
        report.moves_total,
        report.moves_accepted,
        report.accept_ratio(),
        report.sa_runs,
    )?;
    out.flush()?;
    Ok(())
}
