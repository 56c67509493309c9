//! Writes expenses into the current month's worksheet.
//!
//! The worksheet is not addressed by fixed coordinates. Its first column holds income labels, then a
//! sentinel row (`Total Net income`), then a sub-header row, then the block of expense rows. New
//! expenses go into the first blank row of that block.

use crate::api::{CellValue, Sheet, Worksheet};
use crate::error::LedgerError;
use crate::expense::Expense;
use anyhow::Context;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::{debug, info};

pub const DEFAULT_SENTINEL: &str = "Total Net income";
pub const DEFAULT_ROWS_TO_FIRST_ENTRY: usize = 2;

type Result<T> = std::result::Result<T, LedgerError>;

/// A description column and the amount column next to it.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ColumnPair {
    pub description: usize,
    pub amount: usize,
}

/// The layout conventions of the ledger worksheet.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LedgerLayout {
    /// Text that marks the row after which the expense block starts. Matched as a substring.
    pub sentinel: String,
    /// How many rows below the sentinel the first expense row is.
    pub rows_to_first_entry: usize,
    /// Description/amount column pairs. New entries go into the first pair, the monthly total sums
    /// all of them.
    pub columns: Vec<ColumnPair>,
}

impl Default for LedgerLayout {
    fn default() -> Self {
        Self {
            sentinel: DEFAULT_SENTINEL.to_string(),
            rows_to_first_entry: DEFAULT_ROWS_TO_FIRST_ENTRY,
            columns: vec![
                ColumnPair {
                    description: 1,
                    amount: 2,
                },
                ColumnPair {
                    description: 3,
                    amount: 4,
                },
            ],
        }
    }
}

impl LedgerLayout {
    pub fn new(sentinel: impl Into<String>, rows_to_first_entry: usize) -> Self {
        Self {
            sentinel: sentinel.into(),
            rows_to_first_entry,
            ..Self::default()
        }
    }

    fn entry_columns(&self) -> ColumnPair {
        self.columns.first().copied().unwrap_or(ColumnPair {
            description: 1,
            amount: 2,
        })
    }
}

/// Where an expense ended up.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RecordedEntry {
    pub worksheet: String,
    pub row: usize,
}

/// Records expenses into the spreadsheet behind `sheet`.
pub struct LedgerWriter {
    sheet: Box<dyn Sheet + Send>,
    layout: LedgerLayout,
}

impl LedgerWriter {
    pub fn new(sheet: Box<dyn Sheet + Send>, layout: LedgerLayout) -> Self {
        Self { sheet, layout }
    }

    pub fn layout(&self) -> &LedgerLayout {
        &self.layout
    }

    /// Writes `expense` into the first blank row of the expense block of the current worksheet.
    ///
    /// # Errors
    /// - `LedgerError::NoWorksheets` if the spreadsheet has no tabs.
    /// - `LedgerError::SentinelNotFound` if the current worksheet has no sentinel row.
    /// - `LedgerError::Sheet` for transport errors. If the amount write fails after the description
    ///   was written, the description stays in the sheet.
    pub async fn record(&mut self, expense: &Expense) -> Result<RecordedEntry> {
        let worksheet = self.current_worksheet().await?;
        let columns = self.layout.entry_columns();
        let values = self
            .sheet
            .column_values(&worksheet, columns.description)
            .await?;

        let block_start = find_block_start(&values, &self.layout).ok_or_else(|| {
            LedgerError::SentinelNotFound {
                worksheet: worksheet.title().to_string(),
                sentinel: self.layout.sentinel.clone(),
            }
        })?;
        let row = find_insertion_row(&values, block_start);
        debug!(
            "Expense block of '{}' (sheet id {}) starts at row {block_start}, inserting at row {row}",
            worksheet.title(),
            worksheet.id()
        );

        self.write_entry(&worksheet, row, columns, expense).await?;
        info!(
            "Recorded '{}' ({}) in '{}' row {row}",
            expense.description(),
            expense.amount(),
            worksheet.title()
        );
        Ok(RecordedEntry {
            worksheet: worksheet.title().to_string(),
            row,
        })
    }

    /// Sums every amount in the expense block of the current worksheet, across all column pairs.
    /// Rows with a blank description or an amount that is not a number are skipped. A worksheet
    /// without a sentinel row has a total of zero.
    pub async fn monthly_total(&mut self) -> Result<Decimal> {
        let worksheet = self.current_worksheet().await?;
        let labels = self.sheet.column_values(&worksheet, 1).await?;
        let Some(block_start) = find_block_start(&labels, &self.layout) else {
            return Ok(Decimal::ZERO);
        };

        let mut total = Decimal::ZERO;
        for pair in self.layout.columns.clone() {
            let descriptions = self
                .sheet
                .column_values(&worksheet, pair.description)
                .await?;
            let amounts = self.sheet.column_values(&worksheet, pair.amount).await?;
            total += sum_entries(&descriptions, &amounts, block_start);
        }
        Ok(total)
    }

    /// The current worksheet is the first (leftmost) tab. The sheet is kept with the newest month
    /// first, so no dates are parsed.
    async fn current_worksheet(&mut self) -> Result<Worksheet> {
        self.sheet
            .worksheets()
            .await?
            .into_iter()
            .next()
            .ok_or(LedgerError::NoWorksheets)
    }

    /// Writes the description and the amount of one entry. These are two separate cell writes and
    /// are not atomic.
    async fn write_entry(
        &mut self,
        worksheet: &Worksheet,
        row: usize,
        columns: ColumnPair,
        expense: &Expense,
    ) -> Result<()> {
        self.sheet
            .set_cell(
                worksheet,
                row,
                columns.description,
                CellValue::Text(expense.description().to_string()),
            )
            .await
            .with_context(|| format!("Failed to write the description to row {row}"))?;

        // TODO: reserve the row or re-read it before this write once we decide how concurrent
        // entries and half-written rows should be handled.
        self.sheet
            .set_cell(
                worksheet,
                row,
                columns.amount,
                CellValue::Number(expense.amount()),
            )
            .await
            .with_context(|| {
                format!("Failed to write the amount to row {row}, the description was written")
            })?;
        Ok(())
    }
}

/// Returns the 1-indexed row where the expense block starts: `rows_to_first_entry` rows below the
/// first row that contains the sentinel, or `None` if there is no such row.
pub fn find_block_start(values: &[String], layout: &LedgerLayout) -> Option<usize> {
    values
        .iter()
        .position(|value| value.contains(layout.sentinel.as_str()))
        .map(|index| index + 1 + layout.rows_to_first_entry)
}

/// Returns the first row at or after `block_start` whose value is blank. Rows past the end of
/// `values` count as blank.
pub fn find_insertion_row(values: &[String], block_start: usize) -> usize {
    (block_start..=values.len())
        .find(|&row| values[row - 1].trim().is_empty())
        .unwrap_or_else(|| block_start.max(values.len() + 1))
}

fn sum_entries(descriptions: &[String], amounts: &[String], block_start: usize) -> Decimal {
    (block_start..=amounts.len())
        .filter(|&row| {
            descriptions
                .get(row - 1)
                .is_some_and(|d| !d.trim().is_empty())
        })
        .filter_map(|row| {
            let cell = &amounts[row - 1];
            let amount = parse_cell_amount(cell);
            if amount.is_none() && !cell.trim().is_empty() {
                debug!("Skipping row {row} in the monthly total, '{cell}' is not an amount");
            }
            amount
        })
        .sum()
}

/// Parses an amount as displayed by the sheet, e.g. `12`, `45.20`, `62,40` or `€ 3,50`.
fn parse_cell_amount(cell: &str) -> Option<Decimal> {
    let cleaned: String = cell
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    Decimal::from_str(&cleaned).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CellWrite, TestSheet};
    use crate::expense;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn writer(sheet: &TestSheet) -> LedgerWriter {
        LedgerWriter::new(Box::new(sheet.clone()), LedgerLayout::default())
    }

    #[test]
    fn test_find_block_start() {
        let layout = LedgerLayout::default();
        let values = strings(&["Income", "Salary", "Total Net income", "Expenses", "Rent"]);
        assert_eq!(find_block_start(&values, &layout), Some(5));

        let values = strings(&["Total Net income", "Header", "First expense"]);
        assert_eq!(find_block_start(&values, &layout), Some(3));

        let values = strings(&["Some Total Net income row", "Header", "Expense"]);
        assert_eq!(find_block_start(&values, &layout), Some(3));

        assert_eq!(find_block_start(&strings(&["Income", "Other"]), &layout), None);
        assert_eq!(find_block_start(&[], &layout), None);
        // Case-sensitive.
        assert_eq!(find_block_start(&strings(&["total net income"]), &layout), None);
    }

    #[test]
    fn test_find_block_start_custom_layout() {
        let layout = LedgerLayout::new("Netto", 1);
        let values = strings(&["Lön", "Netto", "Hyra"]);
        assert_eq!(find_block_start(&values, &layout), Some(3));
    }

    #[test]
    fn test_find_insertion_row() {
        let values = strings(&[
            "Jobb",
            "StudiestÃ¶d",
            "Total Net income ",
            "Fundamentals",
            "Turun energia",
            "",
        ]);
        let start = find_block_start(&values, &LedgerLayout::default()).unwrap();
        assert_eq!(start, 5);
        assert_eq!(find_insertion_row(&values, start), 6);
    }

    #[test]
    fn test_find_insertion_row_gap_and_whitespace() {
        let values = strings(&["Total Net income", "Header", "Rent", "  ", "Coffee"]);
        assert_eq!(find_insertion_row(&values, 3), 4);
    }

    #[test]
    fn test_find_insertion_row_all_filled() {
        let values = strings(&["Total Net income", "Header", "Rent", "Food"]);
        assert_eq!(find_insertion_row(&values, 3), 5);
    }

    #[test]
    fn test_find_insertion_row_block_past_data() {
        // The sentinel is the last row read, so the block starts beyond the data.
        let values = strings(&["Jobb", "Total Net income"]);
        assert_eq!(find_insertion_row(&values, 4), 4);
        let values = strings(&["Jobb", "Total Net income", "Header"]);
        assert_eq!(find_insertion_row(&values, 4), 4);
    }

    #[tokio::test]
    async fn test_record_writes_description_and_amount() {
        let sheet = TestSheet::with_column("Tab", &["Jobb", "Total Net income ", "Fundamentals", ""]);
        let mut writer = writer(&sheet);
        let coffee = expense::parse("Coffee 3.50").unwrap();

        let entry = writer.record(&coffee).await.unwrap();

        assert_eq!(
            entry,
            RecordedEntry {
                worksheet: "Tab".to_string(),
                row: 4
            }
        );
        assert_eq!(
            sheet.writes(),
            vec![
                CellWrite {
                    worksheet: "Tab".to_string(),
                    row: 4,
                    column: 1,
                    value: CellValue::Text("Coffee".to_string()),
                },
                CellWrite {
                    worksheet: "Tab".to_string(),
                    row: 4,
                    column: 2,
                    value: CellValue::Number(Decimal::new(350, 2)),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_record_uses_first_worksheet() {
        let sheet = TestSheet::seeded().unwrap();
        let mut writer = writer(&sheet);
        let lunch = expense::parse("Lunch 2,95").unwrap();

        let entry = writer.record(&lunch).await.unwrap();

        assert_eq!(entry.worksheet, "October 2025");
        assert_eq!(entry.row, 8);
        assert_eq!(sheet.cell("October 2025", 8, 1), "Lunch");
        assert_eq!(sheet.cell("October 2025", 8, 2), "2.95");
        assert_eq!(sheet.cell("September 2025", 5, 1), "");
    }

    #[tokio::test]
    async fn test_record_consecutive_entries() {
        let sheet = TestSheet::with_column("Tab", &["Total Net income", "Header"]);
        let mut writer = writer(&sheet);

        let first = writer
            .record(&expense::parse("Bread 2").unwrap())
            .await
            .unwrap();
        let second = writer
            .record(&expense::parse("Milk 1,20").unwrap())
            .await
            .unwrap();

        assert_eq!(first.row, 3);
        assert_eq!(second.row, 4);
    }

    #[tokio::test]
    async fn test_record_no_worksheets() {
        let sheet = TestSheet::new();
        let mut writer = writer(&sheet);
        let result = writer.record(&expense::parse("Coffee 3").unwrap()).await;
        assert!(matches!(result, Err(LedgerError::NoWorksheets)));
        assert!(sheet.writes().is_empty());
    }

    #[tokio::test]
    async fn test_record_sentinel_not_found() {
        let sheet = TestSheet::with_column("Tab", &["Jobb", "Income", "Rent"]);
        let mut writer = writer(&sheet);
        let result = writer.record(&expense::parse("Coffee 3").unwrap()).await;
        match result {
            Err(LedgerError::SentinelNotFound { worksheet, sentinel }) => {
                assert_eq!(worksheet, "Tab");
                assert_eq!(sentinel, DEFAULT_SENTINEL);
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert!(sheet.writes().is_empty());
    }

    #[tokio::test]
    async fn test_record_partial_failure_leaves_description() {
        let sheet = TestSheet::with_column("Tab", &["Total Net income", "Header"]);
        sheet.fail_writes_to_column(2);
        let mut writer = writer(&sheet);

        let result = writer.record(&expense::parse("Taxi 18").unwrap()).await;

        let err = result.err().unwrap();
        assert!(matches!(err, LedgerError::Sheet(_)));
        assert!(err.to_string().contains("amount"));
        assert_eq!(sheet.cell("Tab", 3, 1), "Taxi");
        assert_eq!(sheet.cell("Tab", 3, 2), "");
    }

    #[tokio::test]
    async fn test_monthly_total() {
        let sheet = TestSheet::seeded().unwrap();
        let mut writer = writer(&sheet);
        // Fundamentals 700 + 45.20 + 62.40, fun 12 + 35.
        assert_eq!(
            writer.monthly_total().await.unwrap(),
            Decimal::new(8546, 1)
        );

        writer
            .record(&expense::parse("Lunch 2,95").unwrap())
            .await
            .unwrap();
        assert_eq!(
            writer.monthly_total().await.unwrap(),
            Decimal::new(85755, 2)
        );
    }

    #[tokio::test]
    async fn test_monthly_total_without_sentinel() {
        let sheet = TestSheet::with_column("Tab", &["Jobb", "Rent"]);
        let mut writer = writer(&sheet);
        assert_eq!(writer.monthly_total().await.unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_sum_entries_skips_blank_and_invalid() {
        let descriptions = strings(&["Total Net income", "Header", "Rent", "", "Gift", "Bus"]);
        let amounts = strings(&["", "", "700", "99", "n/a", "€ 2,50"]);
        assert_eq!(
            sum_entries(&descriptions, &amounts, 3),
            Decimal::new(7025, 1)
        );
    }

    #[test]
    fn test_parse_cell_amount() {
        assert_eq!(parse_cell_amount("45.20"), Some(Decimal::new(452, 1)));
        assert_eq!(parse_cell_amount("62,40"), Some(Decimal::new(624, 1)));
        assert_eq!(parse_cell_amount("3,50 €"), Some(Decimal::new(35, 1)));
        assert_eq!(parse_cell_amount(""), None);
        assert_eq!(parse_cell_amount("abc"), None);
        assert_eq!(parse_cell_amount("$1,234.50"), None);
    }

    #[test]
    fn test_sum_entries_skips_thousands_separator() {
        let descriptions = strings(&["Laptop", "Bus"]);
        let amounts = strings(&["$1,234.50", "2,50"]);
        assert_eq!(sum_entries(&descriptions, &amounts, 1), Decimal::new(25, 1));
    }
}
