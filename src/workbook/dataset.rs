use serde::{Deserialize, Serialize};

/// Characters added to the longest value when sizing a column.
pub const AUTOFIT_PADDING: usize = 2;

static MISSING: CellValue = CellValue::Missing;

/// A single scalar in a dataset. `null` and NaN numbers count as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Missing,
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Missing => true,
            CellValue::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    /// String form used for column sizing, following pandas `astype(str)`:
    /// integral floats keep a trailing `.0` and booleans are capitalized.
    pub fn render(&self) -> Option<String> {
        match self {
            CellValue::Missing => None,
            CellValue::Number(n) if n.is_nan() => None,
            CellValue::Bool(true) => Some("True".to_string()),
            CellValue::Bool(false) => Some("False".to_string()),
            CellValue::Integer(i) => Some(i.to_string()),
            CellValue::Number(n) => Some(render_float(*n)),
            CellValue::Text(s) => Some(s.clone()),
        }
    }
}

fn render_float(value: f64) -> String {
    if value.is_infinite() {
        let text = if value > 0.0 { "inf" } else { "-inf" };
        text.to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Missing, Into::into)
    }
}

/// Tabular data with named columns. Deserializes from a pandas
/// `to_json(orient="split")` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub columns: Vec<String>,
    #[serde(rename = "data", default)]
    pub rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_row<I, V>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
        self
    }

    /// Cells past the end of a short row read as missing.
    pub fn cell(&self, row: usize, column: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .unwrap_or(&MISSING)
    }

    /// Longest rendered value in the column plus two characters of padding,
    /// or `None` when the column has no values.
    pub fn autofit_width(&self, column: usize) -> Option<usize> {
        (0..self.rows.len())
            .filter_map(|row| self.cell(row, column).render())
            .map(|text| text.chars().count())
            .max()
            .map(|longest| longest + AUTOFIT_PADDING)
    }
}
