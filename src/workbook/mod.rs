//! Styled multi-sheet report workbooks.

pub mod builder;
pub mod dataset;

pub use builder::{SheetSpec, WorkbookBuilder, WorkbookError};
pub use dataset::{CellValue, Dataset};
