use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Local;
use rust_xlsxwriter::{
    ColNum, Color, Format, FormatAlign, FormatPattern, Image, RowNum, Workbook, Worksheet,
    XlsxError,
};
use thiserror::Error;

use super::dataset::{CellValue, Dataset};
use crate::telemetry::metrics::{WORKBOOK_GENERATION_DURATION, WORKBOOK_SHEETS};

/// Logo location relative to the output root.
pub const LOGO_PATH: &str = "assets/Logo.png";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

const LOGO_WIDTH_PX: u32 = 155;
const LOGO_HEIGHT_PX: u32 = 60;

// Zero-based; the header sits on sheet row 6 and metadata in columns C:D.
const HEADER_ROW: RowNum = 5;
const LABEL_COL: ColNum = 2;
const VALUE_COL: ColNum = 3;
const HEADER_FILL: u32 = 0xD3D3D3;

#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("Failed to resolve output directory: {0}")]
    Io(#[from] std::io::Error),
}

/// One named sheet and the table rendered on it.
#[derive(Debug, Clone)]
pub struct SheetSpec {
    pub name: String,
    pub dataset: Dataset,
}

impl SheetSpec {
    pub fn new(name: impl Into<String>, dataset: Dataset) -> Self {
        Self {
            name: name.into(),
            dataset,
        }
    }
}

struct SheetFormats {
    label: Format,
    value: Format,
    header: Format,
}

impl SheetFormats {
    fn new() -> Self {
        Self {
            label: Format::new().set_bold().set_align(FormatAlign::Right),
            value: Format::new().set_align(FormatAlign::Left),
            header: Format::new()
                .set_bold()
                .set_background_color(Color::RGB(HEADER_FILL))
                .set_pattern(FormatPattern::Solid),
        }
    }
}

/// Writes report workbooks into a root directory. The logo is looked up
/// under the same root.
#[derive(Debug, Clone)]
pub struct WorkbookBuilder {
    root: PathBuf,
}

impl WorkbookBuilder {
    pub fn from_current_dir() -> Result<Self, WorkbookError> {
        Ok(Self::with_root(std::env::current_dir()?))
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Builds one sheet per entry, in order, and saves the workbook as
    /// `{report_type}_{timestamp}.xlsx`. Returns the file name. This blocks
    /// on file I/O.
    #[tracing::instrument(
        name = "workbook generate",
        skip(self, sheets),
        fields(workbook.sheets = sheets.len(), workbook.file = tracing::field::Empty)
    )]
    pub fn generate(
        &self,
        beginning: &str,
        span: &str,
        report_type: &str,
        sheets: &[SheetSpec],
    ) -> Result<String, WorkbookError> {
        let start = Instant::now();
        let generated_at = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let logo = self.load_logo()?;
        let formats = SheetFormats::new();

        let mut workbook = Workbook::new();
        for sheet in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&sheet.name)?;

            if let Some(logo) = &logo {
                worksheet.insert_image(0, 0, logo)?;
            }

            let metadata = [
                ("Beginning:", beginning),
                ("Span:", span),
                ("Report Generated:", generated_at.as_str()),
            ];
            for (row, (label, value)) in (0..).zip(metadata) {
                worksheet.write_string_with_format(row, LABEL_COL, label, &formats.label)?;
                worksheet.write_string_with_format(row, VALUE_COL, value, &formats.value)?;
            }

            write_table(worksheet, &sheet.dataset, &formats.header)?;
            autofit_columns(worksheet, &sheet.dataset)?;
        }

        let file_name = format!("{report_type}_{generated_at}.xlsx");
        workbook.save(self.root.join(&file_name))?;

        tracing::Span::current().record("workbook.file", file_name.as_str());
        WORKBOOK_GENERATION_DURATION.record(start.elapsed().as_secs_f64(), &[]);
        WORKBOOK_SHEETS.record(sheets.len() as f64, &[]);
        tracing::info!(file = %file_name, "Workbook saved");

        Ok(file_name)
    }

    fn load_logo(&self) -> Result<Option<Image>, WorkbookError> {
        let path = self.root.join(LOGO_PATH);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No logo found, skipping");
            return Ok(None);
        }
        let image = Image::new(&path)?.set_scale_to_size(LOGO_WIDTH_PX, LOGO_HEIGHT_PX, false);
        Ok(Some(image))
    }
}

fn col_num(index: usize) -> ColNum {
    ColNum::try_from(index).unwrap_or(ColNum::MAX)
}

/// Sheet position of every non-missing data cell.
fn table_cells(dataset: &Dataset) -> impl Iterator<Item = (RowNum, ColNum, &CellValue)> {
    (0..dataset.rows.len()).flat_map(move |r| {
        let row = RowNum::try_from(r)
            .ok()
            .and_then(|r| r.checked_add(HEADER_ROW + 1))
            .unwrap_or(RowNum::MAX);
        (0..dataset.columns.len()).filter_map(move |c| {
            let value = dataset.cell(r, c);
            (!value.is_missing()).then_some((row, col_num(c), value))
        })
    })
}

fn write_table(
    worksheet: &mut Worksheet,
    dataset: &Dataset,
    header_format: &Format,
) -> Result<(), XlsxError> {
    for (c, heading) in dataset.columns.iter().enumerate() {
        worksheet.write_string_with_format(HEADER_ROW, col_num(c), heading, header_format)?;
    }

    for (row, col, value) in table_cells(dataset) {
        match value {
            CellValue::Missing => {}
            CellValue::Bool(b) => {
                worksheet.write_boolean(row, col, *b)?;
            }
            CellValue::Integer(i) => {
                worksheet.write_number(row, col, *i as f64)?;
            }
            CellValue::Number(n) => {
                worksheet.write_number(row, col, *n)?;
            }
            CellValue::Text(s) => {
                worksheet.write_string(row, col, s)?;
            }
        }
    }

    Ok(())
}

fn autofit_columns(worksheet: &mut Worksheet, dataset: &Dataset) -> Result<(), XlsxError> {
    for c in 0..dataset.columns.len() {
        if let Some(width) = dataset.autofit_width(c) {
            worksheet.set_column_width(col_num(c), width as f64)?;
        }
    }
    Ok(())
}
