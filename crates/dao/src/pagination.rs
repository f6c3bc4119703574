//! Count-then-window pagination over an arbitrary SELECT.
//!
//! The base query is never parsed. It is wrapped twice:
//!
//! 1. `select count(*) from ( <base> ) as X` yields the total row count.
//! 2. The base query is numbered with `row_number() over()` and filtered to
//!    the 1-based inclusive window `[:startRow, :endRow]`. The caller's sort
//!    keys become an `order by` on that outer, already-windowed query.
//!
//! Rows are numbered in whatever order the database produces the base query,
//! so the sort only reorders rows inside the selected window. A base query
//! without a deterministic order gives no guarantee that pages are disjoint.

use std::time::Instant;

use crate::executor::{RowMapper, StatementExecutor, map_rows};
use crate::page::{Order, PageRequest, PageResult, page_count};
use crate::{DaoError, ParameterSource, Result};

/// Parameter name of the first row of the window (1-based, inclusive).
pub const START_ROW: &str = "startRow";
/// Parameter name of the last row of the window (1-based, inclusive).
pub const END_ROW: &str = "endRow";

/// Wraps `base` in a row-count query.
pub fn count_sql(base: &str) -> String {
    format!("select count(*) from ( {base} ) as X")
}

/// Builds ` order by a ASC, b DESC`, or an empty string for no keys.
pub fn order_by_clause(sort: &[Order]) -> Result<String> {
    if sort.is_empty() {
        return Ok(String::new());
    }
    let keys = sort
        .iter()
        .map(|order| {
            validate_column(&order.column)?;
            Ok(format!("{} {}", order.column, order.direction))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(format!(" order by {}", keys.join(", ")))
}

/// Wraps `base` in the numbered, windowed content query.
pub fn window_sql(base: &str, sort: &[Order]) -> Result<String> {
    let order_by = order_by_clause(sort)?;
    Ok(format!(
        "select * from ( select row_number() over() as ROWID, A.* from ( {base} ) as A ) as B \
         where B.ROWID between :{START_ROW} and :{END_ROW}{order_by}"
    ))
}

/// Accepts dot-separated identifiers whose segments are plain (`name`) or
/// double-quoted (`"createdAt"`, with `""` as an escaped quote).
fn validate_column(column: &str) -> Result<()> {
    if split_segments(column).is_some_and(|segments| segments.iter().all(|s| valid_segment(s))) {
        Ok(())
    } else {
        Err(DaoError::InvalidSortColumn(column.to_string()))
    }
}

/// Splits on dots outside quotes; `None` on an unterminated quote.
fn split_segments(column: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (i, c) in column.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '.' if !quoted => {
                segments.push(&column[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if quoted {
        return None;
    }
    segments.push(&column[start..]);
    Some(segments)
}

fn valid_segment(segment: &str) -> bool {
    if let Some(inner) = segment
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        return !inner.is_empty() && inner.replace("\"\"", "").find('"').is_none();
    }
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Row bounds of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page_count: u64,
    pub start_row: i64,
    pub end_row: i64,
}

impl PageWindow {
    /// Computes the window of `request` over `total` rows.
    ///
    /// Bounds are not clipped to `total`; a window past the end simply
    /// selects nothing. Bounds beyond `i64::MAX` saturate.
    pub fn compute(total: u64, request: &PageRequest) -> Self {
        let size = i64::from(request.size());
        let start_row = i64::from(request.page())
            .saturating_mul(size)
            .saturating_add(1);
        Self {
            page_count: page_count(total, request.size()),
            start_row,
            end_row: start_row.saturating_add(size - 1),
        }
    }

    /// The engine-owned bound parameters.
    pub fn parameters(&self) -> ParameterSource {
        ParameterSource::new()
            .add_value(START_ROW, self.start_row)
            .add_value(END_ROW, self.end_row)
    }
}

/// Everything needed to fetch one page: executor, base query, parameters,
/// request and row mapper.
///
/// ```ignore
/// let page = PageFetcher::new(&executor, "select id, name from users")?
///     .parameters(params)
///     .page_request(PageRequest::of(0, 10)?.sort_by(Order::asc("id")))
///     .row_mapper(&mapper)
///     .fetch()
///     .await?;
/// ```
pub struct PageFetcher<'a, E: StatementExecutor, T> {
    executor: &'a E,
    query: String,
    parameters: ParameterSource,
    request: PageRequest,
    row_mapper: Option<&'a dyn RowMapper<E::Row, T>>,
}

impl<'a, E: StatementExecutor, T: Send> PageFetcher<'a, E, T> {
    /// Starts a fetcher for `query`.
    ///
    /// Surrounding whitespace and one trailing `;` are dropped. An empty
    /// query fails with `EmptyQuery`.
    pub fn new(executor: &'a E, query: &str) -> Result<Self> {
        let query = query.trim();
        let query = query.strip_suffix(';').unwrap_or(query).trim_end();
        if query.is_empty() {
            return Err(DaoError::EmptyQuery);
        }
        Ok(Self {
            executor,
            query: query.to_string(),
            parameters: ParameterSource::new(),
            request: PageRequest::default(),
            row_mapper: None,
        })
    }

    pub fn parameters(mut self, parameters: ParameterSource) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn page_request(mut self, request: PageRequest) -> Self {
        self.request = request;
        self
    }

    /// Without a mapper the content query is skipped and the page is empty.
    pub fn row_mapper(mut self, mapper: &'a dyn RowMapper<E::Row, T>) -> Self {
        self.row_mapper = Some(mapper);
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Runs the count query, then the window query, and assembles the page.
    ///
    /// Sort keys are validated before any statement is sent.
    /// Parameters named `startRow`/`endRow` supplied by the caller are
    /// shadowed by the computed bounds for the window query.
    #[tracing::instrument(skip_all, fields(page = self.request.page(), size = self.request.size()))]
    pub async fn fetch(self) -> Result<PageResult<T>> {
        metrics::counter!("dao_page_fetches_total").increment(1);
        let started = Instant::now();

        let window_sql = window_sql(&self.query, self.request.sort())?;
        let count_sql = count_sql(&self.query);
        let total = self
            .executor
            .query_scalar(&count_sql, &self.parameters)
            .await?
            .ok_or_else(|| DaoError::MissingCount {
                sql: count_sql.clone(),
            })?;
        let total = u64::try_from(total).map_err(|_| DaoError::MissingCount { sql: count_sql })?;

        let window = PageWindow::compute(total, &self.request);
        tracing::debug!(
            total,
            start_row = window.start_row,
            end_row = window.end_row,
            sql = %window_sql,
            "fetching page window"
        );

        let content = match self.row_mapper {
            Some(mapper) => {
                let parameters = ParameterSource::merge(&self.parameters, &window.parameters());
                let rows = self.executor.query(&window_sql, &parameters).await?;
                map_rows(&rows, mapper)?
            }
            None => {
                tracing::debug!("no row mapper supplied, returning empty content");
                Vec::new()
            }
        };

        metrics::histogram!("dao_page_fetch_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        Ok(PageResult::new(
            content,
            total,
            self.request.page(),
            self.request.size(),
        ))
    }
}
