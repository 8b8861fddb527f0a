//! Column layout shared by every spreadsheet format.
//!
//! The header row is fixed: seven base columns, followed by the two
//! enrichment columns only when enrichment ran.

use crate::error::{ExportError, Result};
use prowl_core::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Name,
    Description,
    VoteCount,
    Website,
    SourceUrl,
    MakerCount,
    CreatedAt,
    OrganizationUrl,
    FundingAmount,
}

const BASE_COLUMNS: [Column; 7] = [
    Column::Name,
    Column::Description,
    Column::VoteCount,
    Column::Website,
    Column::SourceUrl,
    Column::MakerCount,
    Column::CreatedAt,
];

const ENRICHMENT_COLUMNS: [Column; 2] = [Column::OrganizationUrl, Column::FundingAmount];

impl Column {
    pub fn header(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::VoteCount => "voteCount",
            Self::Website => "website",
            Self::SourceUrl => "sourceUrl",
            Self::MakerCount => "makerCount",
            Self::CreatedAt => "createdAt",
            Self::OrganizationUrl => "organizationUrl",
            Self::FundingAmount => "fundingAmount",
        }
    }

    /// Header lookup, ignoring case and surrounding whitespace.
    pub fn from_header(header: &str) -> Option<Self> {
        let header = header.trim();
        BASE_COLUMNS
            .iter()
            .chain(ENRICHMENT_COLUMNS.iter())
            .copied()
            .find(|column| column.header().eq_ignore_ascii_case(header))
    }
}

/// A single cell value ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(u64),
}

impl Cell {
    /// Display form, as used for csv output and column widths.
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(n) => n.to_string(),
        }
    }
}

/// Ordered columns of one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    columns: Vec<Column>,
}

impl Layout {
    pub fn new(with_enrichment: bool) -> Self {
        let mut columns = BASE_COLUMNS.to_vec();
        if with_enrichment {
            columns.extend(ENRICHMENT_COLUMNS);
        }
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.header()).collect()
    }

    /// Cells of one record, in column order. Missing values become empty text.
    pub fn cells(&self, record: &Record) -> Vec<Cell> {
        self.columns
            .iter()
            .map(|column| match column {
                Column::Name => Cell::Text(record.name.clone()),
                Column::Description => Cell::Text(record.description.clone()),
                Column::VoteCount => Cell::Number(record.vote_count),
                Column::Website => Cell::Text(record.website.clone()),
                Column::SourceUrl => Cell::Text(record.source_url.clone()),
                Column::MakerCount => Cell::Number(u64::from(record.maker_count)),
                Column::CreatedAt => Cell::Text(record.created_at.clone()),
                Column::OrganizationUrl => {
                    Cell::Text(record.organization_url.clone().unwrap_or_default())
                }
                Column::FundingAmount => {
                    Cell::Text(record.funding_amount.clone().unwrap_or_default())
                }
            })
            .collect()
    }
}

/// Position of each known column in an imported header row.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    positions: Vec<(Column, usize)>,
}

impl HeaderMap {
    /// Map a header row. Every base column must be present; unknown
    /// columns are ignored.
    pub fn parse<S: AsRef<str>>(headers: &[S]) -> Result<Self> {
        let mut positions = Vec::new();
        for (index, header) in headers.iter().enumerate() {
            if let Some(column) = Column::from_header(header.as_ref()) {
                if !positions.iter().any(|(c, _)| *c == column) {
                    positions.push((column, index));
                }
            }
        }

        let map = Self { positions };
        if let Some(missing) = BASE_COLUMNS.iter().find(|c| map.position(**c).is_none()) {
            return Err(ExportError::MissingColumn(missing.header()));
        }
        Ok(map)
    }

    fn position(&self, column: Column) -> Option<usize> {
        self.positions
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, index)| *index)
    }

    /// Whether the file carries enrichment columns.
    pub fn has_enrichment(&self) -> bool {
        ENRICHMENT_COLUMNS
            .iter()
            .any(|c| self.position(*c).is_some())
    }

    /// Build a record from one row of cell texts.
    ///
    /// `cell` returns the text at a column index, `None` for an empty or
    /// absent cell. `row` is the 1-based sheet row, used in errors.
    pub fn record<F>(&self, row: usize, cell: F) -> Result<Record>
    where
        F: Fn(usize) -> Option<String>,
    {
        let text = |column: Column| {
            self.position(column)
                .and_then(&cell)
                .unwrap_or_default()
        };
        let optional = |column: Column| {
            self.position(column)
                .map(|index| cell(index).unwrap_or_default())
        };

        Ok(Record {
            name: text(Column::Name),
            description: text(Column::Description),
            vote_count: parse_count(row, Column::VoteCount, &text(Column::VoteCount))?,
            website: text(Column::Website),
            source_url: text(Column::SourceUrl),
            maker_count: parse_count(row, Column::MakerCount, &text(Column::MakerCount))?,
            created_at: text(Column::CreatedAt),
            is_accessible: None,
            organization_url: optional(Column::OrganizationUrl),
            funding_amount: optional(Column::FundingAmount),
        })
    }
}

/// Parse a non-negative whole number; blank cells count as zero.
fn parse_count<T>(row: usize, column: Column, value: &str) -> Result<T>
where
    T: TryFrom<u64> + Default,
{
    let value = value.trim();
    if value.is_empty() {
        return Ok(T::default());
    }

    let invalid = || ExportError::InvalidValue {
        row,
        column: column.header(),
        value: value.to_string(),
    };

    let whole = match value.parse::<u64>() {
        Ok(n) => n,
        Err(_) => whole_number(value).ok_or_else(invalid)?,
    };
    T::try_from(whole).map_err(|_| invalid())
}

/// Spreadsheet numbers may come back as floats such as `12.0`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn whole_number(value: &str) -> Option<u64> {
    let float = value.parse::<f64>().ok()?;
    if float.is_finite() && float >= 0.0 && float.fract() == 0.0 && float <= u64::MAX as f64 {
        Some(float as u64)
    } else {
        None
    }
}
