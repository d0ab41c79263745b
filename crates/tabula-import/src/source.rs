#![forbid(unsafe_code)]

/// Header names plus string rows, as handed over by a format reader.
///
/// `None` (or a blank string) means the cell is absent. A `None` header gets a synthetic name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawTable {
    pub name: String,
    pub column_names: Vec<Option<String>>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_header<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.column_names = names.iter().map(|n| Some(n.as_ref().to_owned())).collect();
        self
    }

    /// Append a row; empty strings become absent cells.
    pub fn push_row<S: AsRef<str>>(&mut self, cells: &[S]) {
        self.rows.push(
            cells
                .iter()
                .map(|c| Some(c.as_ref()).filter(|s| !s.is_empty()).map(str::to_owned))
                .collect(),
        );
    }
}

/// A sheet of a spreadsheet-style grid, where the data may start at any cell and be followed by
/// blank rows and columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GridSheet {
    pub name: String,
    pub cells: Vec<Vec<Option<String>>>,
}

fn is_blank(cell: &Option<String>) -> bool {
    cell.as_deref().map_or(true, |s| s.trim().is_empty())
}

impl GridSheet {
    pub fn new(name: impl Into<String>, cells: Vec<Vec<Option<String>>>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.cells
            .get(row)
            .and_then(|r| r.get(col))
            .and_then(|c| c.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    /// First non-blank cell in row-major order.
    pub fn start_point(&self) -> Option<(usize, usize)> {
        self.cells.iter().enumerate().find_map(|(r, row)| {
            row.iter()
                .position(|c| !is_blank(c))
                .map(|c| (r, c))
        })
    }

    fn last_row(&self) -> Option<usize> {
        self.cells
            .iter()
            .rposition(|row| row.iter().any(|c| !is_blank(c)))
    }

    fn last_column(&self) -> Option<usize> {
        self.cells
            .iter()
            .filter_map(|row| row.iter().rposition(|c| !is_blank(c)))
            .max()
    }

    /// The header row is the start point's row; blank header cells become `c{n}` where `n` counts
    /// from the start column. Trailing blank rows and columns are dropped.
    pub fn to_raw_table(&self) -> RawTable {
        let (Some((start_row, start_col)), Some(last_row), Some(last_col)) =
            (self.start_point(), self.last_row(), self.last_column())
        else {
            return RawTable::new(self.name.clone());
        };

        let column_names = (start_col..=last_col)
            .map(|c| {
                Some(
                    self.cell(start_row, c)
                        .map_or_else(|| format!("c{}", c - start_col), str::to_owned),
                )
            })
            .collect();

        let rows = (start_row + 1..=last_row)
            .map(|r| {
                (start_col..=last_col)
                    .map(|c| self.cell(r, c).map(str::to_owned))
                    .collect()
            })
            .collect();

        RawTable {
            name: self.name.clone(),
            column_names,
            rows,
        }
    }
}
