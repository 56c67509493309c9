//! Implements the `Sheet` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! bot, top-to-bottom, without using Google Sheets.

use crate::api::{CellValue, Sheet, Worksheet};
use crate::Result;
use anyhow::{bail, Context};
use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard};

/// One `set_cell` call, as seen by a `TestSheet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWrite {
    pub worksheet: String,
    pub row: usize,
    pub column: usize,
    pub value: CellValue,
}

#[derive(Debug, Default)]
struct State {
    tabs: Vec<Tab>,
    writes: Vec<CellWrite>,
    fail_on_column: Option<usize>,
}

#[derive(Debug)]
struct Tab {
    worksheet: Worksheet,
    rows: Vec<Vec<String>>,
}

/// An implementation of the `Sheet` trait that does not use Google sheets. Clones share the same
/// data, so a test can keep one clone to inspect what the code under test wrote into the other.
#[derive(Debug, Clone, Default)]
pub struct TestSheet {
    state: Arc<Mutex<State>>,
}

impl TestSheet {
    /// Creates a `TestSheet` with no worksheets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a `TestSheet` seeded with a current and a previous month.
    pub fn seeded() -> Result<Self> {
        let sheet = Self::new();
        sheet.add_worksheet(CURRENT_MONTH, load_csv(CURRENT_MONTH_DATA)?);
        sheet.add_worksheet(PREVIOUS_MONTH, load_csv(PREVIOUS_MONTH_DATA)?);
        Ok(sheet)
    }

    /// Creates a `TestSheet` with a single worksheet whose first column holds `values`.
    pub fn with_column(title: &str, values: &[&str]) -> Self {
        let sheet = Self::new();
        let rows = values.iter().map(|v| vec![v.to_string()]).collect();
        sheet.add_worksheet(title, rows);
        sheet
    }

    /// Appends a worksheet (tab) holding `rows`.
    pub fn add_worksheet(&self, title: &str, rows: Vec<Vec<String>>) {
        let mut state = self.state();
        let id = state.tabs.len() as i64;
        state.tabs.push(Tab {
            worksheet: Worksheet::new(id, title),
            rows,
        });
    }

    /// Makes every later write to `column` fail.
    pub fn fail_writes_to_column(&self, column: usize) {
        self.state().fail_on_column = Some(column);
    }

    /// All successful `set_cell` calls so far, in order.
    pub fn writes(&self) -> Vec<CellWrite> {
        self.state().writes.clone()
    }

    /// Returns the value of a cell, or an empty string if it was never set.
    pub fn cell(&self, title: &str, row: usize, column: usize) -> String {
        let state = self.state();
        state
            .tabs
            .iter()
            .find(|tab| tab.worksheet.title() == title)
            .and_then(|tab| tab.rows.get(row - 1))
            .and_then(|cells| cells.get(column - 1))
            .cloned()
            .unwrap_or_default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl Sheet for TestSheet {
    async fn worksheets(&mut self) -> Result<Vec<Worksheet>> {
        Ok(self
            .state()
            .tabs
            .iter()
            .map(|tab| tab.worksheet.clone())
            .collect())
    }

    async fn column_values(&mut self, worksheet: &Worksheet, column: usize) -> Result<Vec<String>> {
        let state = self.state();
        let tab = state
            .tabs
            .iter()
            .find(|tab| tab.worksheet == *worksheet)
            .with_context(|| format!("Worksheet '{}' not found", worksheet.title()))?;

        let mut values: Vec<String> = tab
            .rows
            .iter()
            .map(|row| row.get(column - 1).cloned().unwrap_or_default())
            .collect();

        // Like the Sheets API, trailing empty cells are not returned.
        while values.last().is_some_and(|v| v.is_empty()) {
            values.pop();
        }
        Ok(values)
    }

    async fn set_cell(
        &mut self,
        worksheet: &Worksheet,
        row: usize,
        column: usize,
        value: CellValue,
    ) -> Result<()> {
        let mut state = self.state();
        if state.fail_on_column == Some(column) {
            bail!("Simulated write failure for column {column}");
        }

        let tab = state
            .tabs
            .iter_mut()
            .find(|tab| tab.worksheet == *worksheet)
            .with_context(|| format!("Worksheet '{}' not found", worksheet.title()))?;

        if tab.rows.len() < row {
            tab.rows.resize(row, Vec::new());
        }
        let cells = &mut tab.rows[row - 1];
        if cells.len() < column {
            cells.resize(column, String::new());
        }
        cells[column - 1] = value.to_string();

        state.writes.push(CellWrite {
            worksheet: worksheet.title().to_string(),
            row,
            column,
            value,
        });
        Ok(())
    }
}

/// Loads data from a CSV-formatted string.
fn load_csv(csv_data: &str) -> Result<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

const CURRENT_MONTH: &str = "October 2025";
const PREVIOUS_MONTH: &str = "September 2025";

/// Seed data for the current month. Fundamentals are in columns A:B, fun expenses in C:D.
const CURRENT_MONTH_DATA: &str = r##"Jobb,2450,,
Studiestöd,1100,,
Total Net income ,3550,,
Fundamentals,,Fun,
Rent,700,Cinema,12
Turun energia,45.20,Concert,35
Groceries,"62,40",,
,,,
"##;

/// Seed data for the previous month.
const PREVIOUS_MONTH_DATA: &str = r##"Jobb,2450,,
Total Net income ,2450,,
Fundamentals,,Fun,
Rent,700,Bowling,20
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_worksheet_order() {
        let mut sheet = TestSheet::seeded().unwrap();
        let worksheets = sheet.worksheets().await.unwrap();
        let titles: Vec<&str> = worksheets.iter().map(|w| w.title()).collect();
        assert_eq!(titles, vec![CURRENT_MONTH, PREVIOUS_MONTH]);
    }

    #[tokio::test]
    async fn test_column_values_drops_trailing_empty() {
        let mut sheet = TestSheet::seeded().unwrap();
        let worksheet = sheet.worksheets().await.unwrap().remove(0);
        let column = sheet.column_values(&worksheet, 1).await.unwrap();
        assert_eq!(column.len(), 7);
        assert_eq!(column[2], "Total Net income ");
        assert_eq!(column[6], "Groceries");

        let fun = sheet.column_values(&worksheet, 3).await.unwrap();
        assert_eq!(fun, vec!["", "", "", "Fun", "Cinema", "Concert"]);
    }

    #[tokio::test]
    async fn test_set_cell_grows_rows_and_records_write() {
        let mut sheet = TestSheet::with_column("Tab", &["a"]);
        let observer = sheet.clone();
        let worksheet = sheet.worksheets().await.unwrap().remove(0);
        sheet
            .set_cell(&worksheet, 3, 2, CellValue::Text("x".to_string()))
            .await
            .unwrap();

        assert_eq!(observer.cell("Tab", 3, 2), "x");
        assert_eq!(observer.cell("Tab", 2, 1), "");
        assert_eq!(observer.writes().len(), 1);
    }

    #[tokio::test]
    async fn test_simulated_failure() {
        let mut sheet = TestSheet::with_column("Tab", &["a"]);
        sheet.fail_writes_to_column(2);
        let worksheet = sheet.worksheets().await.unwrap().remove(0);
        let result = sheet
            .set_cell(&worksheet, 1, 2, CellValue::Text("x".to_string()))
            .await;
        assert!(result.is_err());
        assert!(sheet.writes().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_worksheet() {
        let mut sheet = TestSheet::new();
        let result = sheet.column_values(&Worksheet::new(9, "Nope"), 1).await;
        assert!(result.is_err());
    }
}
