use std::path::PathBuf;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use phc_cli::types::{BuildResult, TableRole};
use phc_model::QualityKind;

pub fn print_summary(result: &BuildResult) {
    println!("Raw exports: {}", result.raw_dir.display());
    if result.dry_run {
        println!("Output: {} (dry run, nothing written)", result.output_dir.display());
    } else {
        println!("Output: {}", result.output_dir.display());
    }
    if let Some(path) = &result.quality_report {
        println!("Quality report: {}", path.display());
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("Role"),
        header_cell("Rows"),
        header_cell("Columns"),
        header_cell("Unmatched keys"),
        header_cell("Written"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    align_column(&mut table, 5, CellAlignment::Center);
    for summary in &result.tables {
        table.add_row(vec![
            table_cell(&summary.name, summary.role),
            role_cell(summary.role),
            Cell::new(summary.rows),
            Cell::new(summary.columns),
            count_cell(summary.unmatched_keys, Color::Yellow),
            output_cell(summary.output.as_ref()),
        ]);
    }
    println!("{table}");
    print_missing_keys_table(result);
    print_quality_table(result);
}

/// Per-column breakdown of fact keys that found no dimension entry.
fn print_missing_keys_table(result: &BuildResult) {
    let rows: Vec<_> = result
        .report
        .missing_keys
        .iter()
        .flat_map(|diagnostic| {
            diagnostic
                .keys
                .iter()
                .filter(|key| key.unmatched > 0)
                .map(move |key| (diagnostic.table.as_str(), key))
        })
        .collect();
    if rows.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Fact table"),
        header_cell("Key"),
        header_cell("Unmatched"),
        header_cell("Rows"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for (name, key) in rows {
        table.add_row(vec![
            Cell::new(name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(&key.column),
            count_cell(Some(key.unmatched), Color::Yellow),
            Cell::new(key.total),
        ]);
    }
    println!("{table}");
}

fn print_quality_table(result: &BuildResult) {
    let entries = &result.report.quality.entries;
    if entries.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Dataset"),
        header_cell("Kind"),
        header_cell("Step"),
        header_cell("Rows"),
        header_cell("Reason"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    align_column(&mut table, 3, CellAlignment::Right);
    for entry in entries {
        table.add_row(vec![
            Cell::new(&entry.dataset)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            kind_cell(entry.kind),
            Cell::new(&entry.step),
            Cell::new(entry.rows),
            Cell::new(&entry.reason),
        ]);
    }
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn table_cell(name: &str, role: TableRole) -> Cell {
    match role {
        TableRole::Fact => Cell::new(name)
            .fg(Color::Blue)
            .add_attribute(Attribute::Bold),
        TableRole::Dimension => Cell::new(name).fg(Color::Magenta),
    }
}

fn role_cell(role: TableRole) -> Cell {
    match role {
        TableRole::Fact => Cell::new("fact"),
        TableRole::Dimension => dim_cell("dimension"),
    }
}

fn kind_cell(kind: QualityKind) -> Cell {
    match kind {
        QualityKind::Excluded => Cell::new("EXCLUDED")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        QualityKind::Unmapped => Cell::new("UNMAPPED").fg(Color::Yellow),
        QualityKind::Unmatched => Cell::new("UNMATCHED").fg(Color::Yellow),
    }
}

fn output_cell(path: Option<&PathBuf>) -> Cell {
    match path {
        Some(_) => Cell::new("✓")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
        None => dim_cell("-"),
    }
}

fn count_cell(count: Option<usize>, color: Color) -> Cell {
    match count {
        Some(value) if value > 0 => Cell::new(value).fg(color).add_attribute(Attribute::Bold),
        Some(value) => dim_cell(value),
        None => dim_cell("-"),
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
