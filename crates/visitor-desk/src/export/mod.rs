//! Document rendering for report exports. Rows arrive already formatted by
//! the presentation layer; this module only lays them out.

use std::io::Write;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode export rows: {0}")]
    Csv(#[from] csv::Error),
    #[error("export row {row} does not have the same columns as the header row")]
    ColumnMismatch { row: usize },
}

/// Ordered column name -> formatted value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportRow {
    cells: Vec<(String, String)>,
}

impl ExportRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.cells.push((column.into(), value.into()));
        self
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(_, value)| value.as_str())
    }
}

/// Turns an ordered sequence of rows into a document.
pub trait DocumentRenderer {
    fn content_type(&self) -> &'static str;
    fn render<W: Write>(&self, rows: &[ExportRow], out: W) -> Result<(), ExportError>;

    fn render_to_vec(&self, rows: &[ExportRow]) -> Result<Vec<u8>, ExportError> {
        let mut buffer = Vec::new();
        self.render(rows, &mut buffer)?;
        Ok(buffer)
    }

    fn render_to_path<P: AsRef<Path>>(&self, rows: &[ExportRow], path: P) -> Result<(), ExportError> {
        let file = std::fs::File::create(path)?;
        self.render(rows, file)
    }
}

/// Header from the first row; every later row must repeat its columns in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExporter;

impl DocumentRenderer for CsvExporter {
    fn content_type(&self) -> &'static str {
        "text/csv; charset=utf-8"
    }

    fn render<W: Write>(&self, rows: &[ExportRow], out: W) -> Result<(), ExportError> {
        let mut writer = csv::Writer::from_writer(out);
        let Some(first) = rows.first() else {
            writer.flush()?;
            return Ok(());
        };

        let header: Vec<&str> = first.columns().collect();
        writer.write_record(&header)?;

        for (index, row) in rows.iter().enumerate() {
            if !row.columns().eq(header.iter().copied()) {
                return Err(ExportError::ColumnMismatch { row: index });
            }
            writer.write_record(row.values())?;
        }

        writer.flush()?;
        Ok(())
    }
}
