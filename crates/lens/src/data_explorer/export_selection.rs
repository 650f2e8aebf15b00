//
// export_selection.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use relay::comm::data_explorer_comm::DataSelectionCellRange;
use relay::comm::data_explorer_comm::DataSelectionIndices;
use relay::comm::data_explorer_comm::DataSelectionRange;
use relay::comm::data_explorer_comm::DataSelectionSingleCell;
use relay::comm::data_explorer_comm::ExportFormat;
use relay::comm::data_explorer_comm::Selection;
use relay::comm::data_explorer_comm::TableSelection;
use relay::comm::data_explorer_comm::TableSelectionKind;

use crate::data_explorer::backend::TableAdapter;
use crate::data_explorer::utils::checked_column;
use crate::data_explorer::utils::checked_index;
use crate::data_explorer::utils::view_rows;
use crate::error::Error;
use crate::value::Value;

// Returns the selected region of the view exported in the requested format
//
// Arguments:
// - adapter: The table being viewed
// - view_indices: The order of rows, and maybe filtered rows, of the view.
//   Row selections are positions in this order.
// - selection: The selected region of the view
// - format: The format to export to (csv, tsv and html)
pub fn export_selection<A: TableAdapter + ?Sized>(
    adapter: &A,
    view_indices: Option<&[usize]>,
    selection: &TableSelection,
    format: ExportFormat,
) -> crate::Result<String> {
    let num_view_rows = match view_indices {
        Some(indices) => indices.len(),
        None => adapter.num_rows(),
    };
    let num_columns = adapter.num_columns();

    let check_row = |index: i64| checked_index(index, num_view_rows);
    let check_column = |index: i64| checked_column(index, num_columns);

    let (positions, columns) = match (selection.kind, &selection.selection) {
        (
            TableSelectionKind::SingleCell,
            Selection::SingleCell(DataSelectionSingleCell {
                row_index,
                column_index,
            }),
        ) => (vec![check_row(*row_index)?], vec![check_column(*column_index)?]),

        (
            TableSelectionKind::CellRange,
            Selection::CellRange(DataSelectionCellRange {
                first_row_index,
                last_row_index,
                first_column_index,
                last_column_index,
            }),
        ) => (
            checked_range(*first_row_index, *last_row_index, check_row)?,
            checked_range(*first_column_index, *last_column_index, check_column)?,
        ),

        (
            TableSelectionKind::RowRange,
            Selection::IndexRange(DataSelectionRange {
                first_index,
                last_index,
            }),
        ) => (
            checked_range(*first_index, *last_index, check_row)?,
            (0..num_columns).collect(),
        ),

        (
            TableSelectionKind::ColumnRange,
            Selection::IndexRange(DataSelectionRange {
                first_index,
                last_index,
            }),
        ) => (
            (0..num_view_rows).collect(),
            checked_range(*first_index, *last_index, check_column)?,
        ),

        (TableSelectionKind::RowIndices, Selection::Indices(DataSelectionIndices { indices })) => (
            checked_all(indices, check_row)?,
            (0..num_columns).collect(),
        ),

        (
            TableSelectionKind::ColumnIndices,
            Selection::Indices(DataSelectionIndices { indices }),
        ) => ((0..num_view_rows).collect(), checked_all(indices, check_column)?),

        (kind, selection) => {
            return Err(crate::anyhow!(
                "Selection {selection:?} doesn't match selection kind {kind:?}"
            ));
        },
    };

    let rows = view_rows(view_indices, &positions);

    // A single cell is copied as its bare text
    if selection.kind == TableSelectionKind::SingleCell && format != ExportFormat::Html {
        if !adapter.export_formats().contains(&format) {
            return Err(Error::UnsupportedFeature(format!("{format} export")));
        }
        let values = adapter.column_values(columns[0], Some(&rows))?;
        return Ok(values.first().map(cell_text).unwrap_or_default());
    }

    let include_header = selection.kind != TableSelectionKind::SingleCell;

    adapter.export(&rows, &columns, format, include_header)
}

// Both ends are checked before anything is allocated for the range
fn checked_range(
    first: i64,
    last: i64,
    check: impl Fn(i64) -> crate::Result<usize>,
) -> crate::Result<Vec<usize>> {
    let first = check(first)?;
    let last = check(last)?;
    Ok((first..=last).collect())
}

fn checked_all(
    indices: &[i64],
    check: impl Fn(i64) -> crate::Result<usize>,
) -> crate::Result<Vec<usize>> {
    indices.iter().map(|index| check(*index)).collect()
}

/// Row-at-a-time rendering of a block of cells. `rows` are rows of the
/// underlying table.
pub fn export_values<A: TableAdapter + ?Sized>(
    adapter: &A,
    rows: &[usize],
    columns: &[usize],
    format: ExportFormat,
    include_header: bool,
) -> crate::Result<String> {
    let mut names = Vec::with_capacity(columns.len());
    let mut cells = Vec::with_capacity(columns.len());

    for index in columns {
        let name = adapter
            .column_name(*index)
            .ok_or(Error::InvalidColumnIndex {
                index: *index as i64,
                num_columns: adapter.num_columns(),
            })?;
        names.push(name);

        let values = adapter.column_values(*index, Some(rows))?;
        cells.push(values.iter().map(cell_text).collect::<Vec<String>>());
    }

    match format {
        ExportFormat::Csv | ExportFormat::Tsv => {
            let mut builder = csv::WriterBuilder::new();
            builder
                .delimiter(delimiter(format))
                .terminator(csv::Terminator::Any(b'\n'))
                .quote_style(csv::QuoteStyle::Necessary);
            let mut writer = builder.from_writer(Vec::new());

            if include_header {
                writer.write_record(&names)?;
            }
            for i in 0..rows.len() {
                writer.write_record(cells.iter().map(move |column| column[i].as_str()))?;
            }

            let buffer = writer
                .into_inner()
                .map_err(|err| crate::anyhow!("Can't finish the export: {}", err.error()))?;
            exported_text(buffer)
        },

        ExportFormat::Html => {
            let mut html = String::from("<table>\n");
            if include_header {
                html.push_str("<thead>\n<tr>");
                for name in names.iter() {
                    html.push_str(&format!("<th>{}</th>", escape_html(name)));
                }
                html.push_str("</tr>\n</thead>\n");
            }
            html.push_str("<tbody>\n");
            for i in 0..rows.len() {
                html.push_str("<tr>");
                for column in cells.iter() {
                    html.push_str(&format!("<td>{}</td>", escape_html(&column[i])));
                }
                html.push_str("</tr>\n");
            }
            html.push_str("</tbody>\n</table>");
            Ok(html)
        },
    }
}

pub fn delimiter(format: ExportFormat) -> u8 {
    match format {
        ExportFormat::Tsv => b'\t',
        _ => b',',
    }
}

/// The text written by a CSV writer, without the final record terminator.
pub fn exported_text(buffer: Vec<u8>) -> crate::Result<String> {
    let mut text = String::from_utf8(buffer)
        .map_err(|err| crate::anyhow!("Exported data is not valid UTF-8: {err}"))?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

// Missing values are exported as empty fields
fn cell_text(value: &Value) -> String {
    match value.is_missing() {
        true => String::new(),
        false => value.to_string(),
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
