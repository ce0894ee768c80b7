//! Page-sized batches of a dataset.
//!
//! The engine classifies whatever batch it is handed; this module produces
//! such batches the way a paginated data API would.

use serde::Serialize;

use crate::data::{cell, compare_cells, Cell, Dataset, Row};
use crate::error::{Error, Result};

pub const MAX_PAGE_SIZE: usize = 1000;
pub const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: usize,
    pub page_size: usize,
    pub sort_by: Option<String>,
    pub sort_desc: bool,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: None,
            sort_desc: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPage {
    pub data: Vec<Row>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

/// Slice `dataset` into the requested page, optionally sorted by a column.
///
/// Sorting puts nulls last in both directions. A page past the end is
/// empty, not an error.
pub fn paginate(dataset: &Dataset, request: &PageRequest) -> Result<DataPage> {
    if request.page == 0 {
        return Err(Error::InvalidPage("page numbers start at 1".into()));
    }
    if request.page_size == 0 || request.page_size > MAX_PAGE_SIZE {
        return Err(Error::InvalidPage(format!(
            "page_size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, request.page_size
        )));
    }

    let mut rows: Vec<&Row> = dataset.rows.iter().collect();
    if let Some(column) = &request.sort_by {
        if !dataset.columns().iter().any(|c| c == column) {
            return Err(Error::UnknownColumn(column.clone()));
        }
        rows.sort_by(|a, b| {
            let (x, y) = (cell(a, column), cell(b, column));
            match (x, y) {
                (Cell::Null, _) | (_, Cell::Null) => compare_cells(x, y),
                _ if request.sort_desc => compare_cells(y, x),
                _ => compare_cells(x, y),
            }
        });
    }

    let total = rows.len();
    let total_pages = total.div_ceil(request.page_size);
    let start = (request.page - 1).saturating_mul(request.page_size);
    let data = rows
        .into_iter()
        .skip(start)
        .take(request.page_size)
        .cloned()
        .collect();

    Ok(DataPage {
        data,
        total,
        page: request.page,
        page_size: request.page_size,
        total_pages,
    })
}
