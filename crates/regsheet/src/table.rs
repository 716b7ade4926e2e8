//! In-memory workbook tables and typed projection of register sheet rows.

use thiserror::Error;
use tracing::debug;

/// Text of one cell; `None` for a blank cell.
pub type Cell = Option<String>;

/// Errors raised while reading a sheet as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SheetError {
    #[error("sheet '{sheet}' has no '{column}' column")]
    MissingColumn { sheet: String, column: String },
}

/// One worksheet: a header row followed by data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, header: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Sheet {
            name: name.into(),
            header,
            rows,
        }
    }

    /// Build a sheet from plain text rows; the first row is the header and
    /// empty strings become blank cells.
    pub fn from_rows<R, S>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rows = rows.into_iter().map(|row| {
            row.into_iter()
                .map(|cell| {
                    let text = cell.as_ref().trim();
                    (!text.is_empty()).then(|| text.to_string())
                })
                .collect::<Vec<Cell>>()
        });
        let header = rows
            .next()
            .map(|row| row.into_iter().map(Option::unwrap_or_default).collect())
            .unwrap_or_default();
        Sheet::new(name, header, rows.collect())
    }

    /// Index of the column titled `title` (case-insensitive).
    pub fn column(&self, title: &str) -> Option<usize> {
        self.header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(title))
    }

    /// Indices of every column in `titles`, failing on the first one absent.
    pub fn columns(&self, titles: &[&str]) -> Result<Vec<usize>, SheetError> {
        titles
            .iter()
            .map(|title| {
                self.column(title).ok_or_else(|| SheetError::MissingColumn {
                    sheet: self.name.clone(),
                    column: (*title).to_string(),
                })
            })
            .collect()
    }

    /// Trimmed, non-empty text at `row`/`column`.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        cell_text(self.rows.get(row)?, Some(column))
    }
}

fn cell_text(row: &[Cell], column: Option<usize>) -> Option<&str> {
    row.get(column?)?
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

/// Ordered collection of sheets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Workbook { sheets }
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str())
    }
}

const ADDR: &str = "ADDR";
const REG: &str = "REG";
const FIELD: &str = "FIELD";
const BIT: &str = "BIT";
const WIDTH: &str = "WIDTH";
const ATTRIBUTE: &str = "ATTRIBUTE";
const DEFAULT: &str = "DEFAULT";
const DESCRIPTION: &str = "DESCRIPTION";

/// Columns a register sheet must carry.
pub const REGISTER_COLUMNS: [&str; 6] = [ADDR, REG, FIELD, BIT, WIDTH, ATTRIBUTE];

/// One register sheet row with ADDR and REG forward-filled.
///
/// Blank cells are represented by empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterRow {
    /// 1-based spreadsheet row number (the header is row 1).
    pub line: usize,
    pub addr: String,
    pub reg: String,
    pub field: String,
    pub bit: String,
    pub width: String,
    pub attribute: String,
    pub default: String,
    pub description: String,
}

impl RegisterRow {
    /// Header/label rows carry no field name.
    pub fn is_field(&self) -> bool {
        !self.field.is_empty()
    }
}

/// Project `sheet` into register rows.
///
/// ADDR and REG are forward-filled from the nearest non-blank cell above.
/// Fully blank rows and rows before the first ADDR/REG value are dropped.
pub fn register_rows(sheet: &Sheet) -> Result<Vec<RegisterRow>, SheetError> {
    let required = sheet.columns(&REGISTER_COLUMNS)?;
    let (addr, reg, field, bit, width, attribute) = (
        required[0],
        required[1],
        required[2],
        required[3],
        required[4],
        required[5],
    );
    let default = sheet.column(DEFAULT);
    let description = sheet.column(DESCRIPTION);

    let mut last_addr: Option<&str> = None;
    let mut last_reg: Option<&str> = None;
    let mut rows = Vec::with_capacity(sheet.rows.len());

    for (index, cells) in sheet.rows.iter().enumerate() {
        let line = index + 2;
        if cells
            .iter()
            .all(|cell| cell.as_deref().map_or(true, |text| text.trim().is_empty()))
        {
            continue;
        }
        if let Some(text) = cell_text(cells, Some(addr)) {
            last_addr = Some(text);
        }
        if let Some(text) = cell_text(cells, Some(reg)) {
            last_reg = Some(text);
        }
        let (Some(row_addr), Some(row_reg)) = (last_addr, last_reg) else {
            debug!(sheet = %sheet.name, line, "row precedes first ADDR/REG value");
            continue;
        };
        let text = |column: Option<usize>| cell_text(cells, column).unwrap_or_default().to_string();
        rows.push(RegisterRow {
            line,
            addr: row_addr.to_string(),
            reg: row_reg.to_string(),
            field: text(Some(field)),
            bit: text(Some(bit)),
            width: text(Some(width)),
            attribute: text(Some(attribute)),
            default: text(default),
            description: text(description),
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> Sheet {
        Sheet::from_rows(
            "uart",
            [
                vec!["ADDR", "REG", "FIELD", "BIT", "WIDTH", "ATTRIBUTE", "DEFAULT", "DESCRIPTION"],
                vec!["0x0", "CTRL", "", "", "", "", "", "control"],
                vec!["", "", "EN", "[0]", "1", "RW", "0x0", "enable"],
                vec!["", "", "", "", "", "", "", ""],
                vec!["", "", "MODE", "[3:1]", "3", "RW", "", ""],
                vec!["0x4", "STAT", "BUSY", "[0]", "1", "RO", "", ""],
            ],
        )
    }

    #[test]
    fn columns_are_case_insensitive() {
        let mut sheet = sheet();
        sheet.header[0] = " addr ".into();
        assert_eq!(sheet.column("ADDR"), Some(0));
        assert_eq!(sheet.columns(&["reg", "Field"]).expect("columns"), vec![1, 2]);
        assert_eq!(
            sheet.columns(&["ADDR", "OFFSET"]),
            Err(SheetError::MissingColumn {
                sheet: "uart".into(),
                column: "OFFSET".into()
            })
        );
    }

    #[test]
    fn from_rows_blanks_empty_cells() {
        let sheet = sheet();
        assert_eq!(sheet.rows[0][2], None);
        assert_eq!(sheet.cell(0, 0), Some("0x0"));
        assert_eq!(sheet.cell(0, 7), Some("control"));
        assert_eq!(sheet.cell(9, 0), None);
    }

    #[test]
    fn forward_fills_addr_and_reg_only() {
        let rows = register_rows(&sheet()).expect("rows");
        assert_eq!(rows.len(), 4, "blank row dropped");
        assert_eq!(rows[1].addr, "0x0");
        assert_eq!(rows[1].reg, "CTRL");
        assert_eq!(rows[1].line, 3);
        assert_eq!(rows[2].field, "MODE");
        assert_eq!(rows[2].default, "", "DEFAULT is not forward-filled");
        assert_eq!(rows[2].description, "");
        assert_eq!(rows[3].reg, "STAT");
        assert!(!rows[0].is_field());
        assert!(rows[3].is_field());
    }

    #[test]
    fn rows_before_first_register_are_ignored() {
        let sheet = Sheet::from_rows(
            "notes",
            [
                vec!["ADDR", "REG", "FIELD", "BIT", "WIDTH", "ATTRIBUTE"],
                vec!["", "", "ORPHAN", "[0]", "1", "RW"],
                vec!["0x8", "R", "F", "[0]", "1", "RW"],
            ],
        );
        let rows = register_rows(&sheet).expect("rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].field, "F");
        assert_eq!(rows[0].default, "");
    }

    #[test]
    fn missing_register_column_fails() {
        let sheet = Sheet::from_rows("misc", [vec!["ADDR", "REG", "FIELD"]]);
        assert!(matches!(
            register_rows(&sheet),
            Err(SheetError::MissingColumn { column, .. }) if column == "BIT"
        ));
    }

    #[test]
    fn workbook_lookup() {
        let book = Workbook::new(vec![sheet(), Sheet::from_rows("version", [vec!["TAG", "VALUE"]])]);
        assert!(book.sheet("version").is_some());
        assert!(book.sheet("missing").is_none());
        assert_eq!(book.sheet_names().collect::<Vec<_>>(), ["uart", "version"]);
    }
}
