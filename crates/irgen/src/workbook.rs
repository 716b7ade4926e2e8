use std::path::Path;

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use regsheet::{Cell, Sheet, Workbook};
use tracing::debug;

/// Read every worksheet of the spreadsheet at `path` (xlsx, xls, ods).
pub fn read_workbook(path: &Path) -> Result<Workbook> {
    let mut book = open_workbook_auto(path)
        .with_context(|| format!("could not read workbook {}", path.display()))?;
    let names = book.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = book
            .worksheet_range(&name)
            .with_context(|| format!("read sheet '{name}' of {}", path.display()))?;
        let sheet = sheet_from_range(&name, &range);
        debug!(sheet = %name, rows = sheet.rows.len(), "loaded sheet");
        sheets.push(sheet);
    }
    Ok(Workbook::new(sheets))
}

fn sheet_from_range(name: &str, range: &Range<Data>) -> Sheet {
    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<Cell>>());
    let header = rows
        .next()
        .map(|row| row.into_iter().map(Option::unwrap_or_default).collect())
        .unwrap_or_default();
    Sheet::new(name, header, rows.collect())
}

/// Text of a cell as the sheet author sees it under the General number
/// format: integral floats lose their fractional part, so `16.0` reads as
/// `16` and a VERSION typed as the number `1.0` reads as `1`. Cells that must
/// keep a trailing `.0` have to be entered as text.
fn cell_text(data: &Data) -> Cell {
    let text = match data {
        Data::Empty | Data::Error(_) => return None,
        Data::String(text) => text.trim().to_string(),
        Data::Int(value) => value.to_string(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        Data::Float(value) => value.to_string(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}
