//! Pagination engine scenarios against the in-memory executor.

use dao::{
    DaoError, InMemoryExecutor, MemoryRow, Order, PageFetcher, PageRequest, ParameterSource,
    RowMapper, SqlValue,
};

#[derive(Debug, Clone, PartialEq)]
struct Row {
    id: i64,
    name: String,
}

fn map_row(row: &MemoryRow) -> dao::Result<Row> {
    let id = row
        .get("id")
        .and_then(SqlValue::as_i64)
        .ok_or_else(|| DaoError::RowMapping("missing id".to_string()))?;
    let name = row
        .get("name")
        .and_then(SqlValue::as_str)
        .ok_or_else(|| DaoError::RowMapping("missing name".to_string()))?;
    Ok(Row {
        id,
        name: name.to_string(),
    })
}

fn table(n: i64) -> InMemoryExecutor {
    InMemoryExecutor::new(
        (1..=n)
            .map(|id| MemoryRow::new().with("id", id).with("name", format!("name-{id}")))
            .collect(),
    )
}

const BASE: &str = "SELECT id, name FROM t";

#[tokio::test]
async fn first_page_of_twenty_five() {
    let executor = table(25);
    let request = PageRequest::of(0, 10).unwrap().sort_by(Order::asc("id"));

    let page = PageFetcher::<_, Row>::new(&executor, BASE)
        .unwrap()
        .page_request(request)
        .row_mapper(&map_row)
        .fetch()
        .await
        .unwrap();

    let ids: Vec<_> = page.content().iter().map(|r| r.id).collect();
    assert_eq!(ids, (1..=10).collect::<Vec<_>>());
    assert_eq!(page.content()[0].name, "name-1");
    assert_eq!(page.total_elements(), 25);
    assert_eq!(page.page(), 0);
}

#[tokio::test]
async fn page_past_the_end_is_empty_and_clamped() {
    let executor = table(25);
    let request = PageRequest::of(5, 10).unwrap().sort_by(Order::asc("id"));

    let page = PageFetcher::<_, Row>::new(&executor, BASE)
        .unwrap()
        .page_request(request)
        .row_mapper(&map_row)
        .fetch()
        .await
        .unwrap();

    assert!(page.content().is_empty());
    assert_eq!(page.total_elements(), 25);
    assert_eq!(page.page(), 2);
}

#[tokio::test]
async fn pages_partition_all_rows() {
    for (rows, size) in [(0_i64, 3_u32), (1, 1), (7, 3), (9, 3), (25, 10), (11, 20)] {
        let executor = table(rows);
        let page_count = (rows as u64).div_ceil(u64::from(size));

        let mut seen = Vec::new();
        for index in 0..page_count as u32 {
            let page = PageFetcher::<_, Row>::new(&executor, BASE)
                .unwrap()
                .page_request(PageRequest::of(index, size).unwrap())
                .row_mapper(&map_row)
                .fetch()
                .await
                .unwrap();
            assert!(page.content().len() <= size as usize);
            assert_eq!(page.total_pages(), page_count);
            seen.extend(page.content().iter().map(|r| r.id));
        }

        assert_eq!(seen, (1..=rows).collect::<Vec<_>>(), "rows={rows} size={size}");
    }
}

#[tokio::test]
async fn count_and_window_statements_are_emitted() {
    let executor = table(3);
    let params = ParameterSource::new().add_value("tenant", 7);
    let request = PageRequest::of(1, 2).unwrap().sort_by(Order::desc("name"));

    PageFetcher::<_, Row>::new(&executor, BASE)
        .unwrap()
        .parameters(params.clone())
        .page_request(request)
        .row_mapper(&map_row)
        .fetch()
        .await
        .unwrap();

    let statements = executor.statements().await;
    assert_eq!(statements.len(), 2);

    assert_eq!(
        statements[0].sql,
        "select count(*) from ( SELECT id, name FROM t ) as X"
    );
    assert_eq!(statements[0].params, params);

    assert_eq!(
        statements[1].sql,
        "select * from ( select row_number() over() as ROWID, A.* from ( SELECT id, name FROM t ) as A ) as B \
         where B.ROWID between :startRow and :endRow order by name DESC"
    );
    let window_params = &statements[1].params;
    assert_eq!(window_params.value("tenant").unwrap(), &SqlValue::Int(7));
    assert_eq!(window_params.value("startRow").unwrap(), &SqlValue::Int(3));
    assert_eq!(window_params.value("endRow").unwrap(), &SqlValue::Int(4));
}

#[tokio::test]
async fn caller_window_names_are_shadowed() {
    let executor = table(10);
    let params = ParameterSource::new()
        .add_value("startRow", 8)
        .add_value("endRow", 10);

    let page = PageFetcher::<_, Row>::new(&executor, BASE)
        .unwrap()
        .parameters(params)
        .page_request(PageRequest::of(0, 2).unwrap())
        .row_mapper(&map_row)
        .fetch()
        .await
        .unwrap();

    let ids: Vec<_> = page.content().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2]);

    let statements = executor.statements().await;
    assert_eq!(statements[0].params.value("startRow").unwrap(), &SqlValue::Int(8));
}

#[tokio::test]
async fn missing_row_mapper_yields_empty_content() {
    let executor = table(5);

    let page = PageFetcher::<_, Row>::new(&executor, BASE)
        .unwrap()
        .page_request(PageRequest::of(0, 2).unwrap())
        .fetch()
        .await
        .unwrap();

    assert!(page.content().is_empty());
    assert_eq!(page.total_elements(), 5);
    assert_eq!(executor.statements().await.len(), 1);
}

#[tokio::test]
async fn executor_failure_propagates_without_a_page() {
    let executor = InMemoryExecutor::failing("connection reset");

    let err = PageFetcher::<_, Row>::new(&executor, BASE)
        .unwrap()
        .row_mapper(&map_row)
        .fetch()
        .await
        .unwrap_err();

    assert!(matches!(err, DaoError::QueryExecutionFailed(_)));
    assert_eq!(executor.statements().await.len(), 1);
}

#[tokio::test]
async fn row_mapping_failure_propagates() {
    let executor = InMemoryExecutor::new(vec![MemoryRow::new().with("id", 1)]);

    let err = PageFetcher::<_, Row>::new(&executor, BASE)
        .unwrap()
        .row_mapper(&map_row)
        .fetch()
        .await
        .unwrap_err();

    assert!(matches!(err, DaoError::RowMapping(_)));
}

#[tokio::test]
async fn query_text_is_trimmed() {
    let executor = table(1);

    let fetcher = PageFetcher::<_, Row>::new(&executor, "  SELECT id, name FROM t ;  ").unwrap();
    assert_eq!(fetcher.query(), BASE);

    let err = PageFetcher::<_, Row>::new(&executor, "   ").err().unwrap();
    assert!(matches!(err, DaoError::EmptyQuery));
}

#[tokio::test]
async fn invalid_sort_column_fails_before_any_statement() {
    let executor = table(3);
    let request = PageRequest::of(0, 2)
        .unwrap()
        .sort_by(Order::asc("id; drop table t"));

    let err = PageFetcher::<_, Row>::new(&executor, BASE)
        .unwrap()
        .page_request(request)
        .row_mapper(&map_row)
        .fetch()
        .await
        .unwrap_err();

    assert!(matches!(err, DaoError::InvalidSortColumn(_)));
    assert!(executor.statements().await.is_empty());
}

#[tokio::test]
async fn largest_page_request_returns_empty_last_page() {
    let executor = table(25);
    let request = PageRequest::of(u32::MAX, u32::MAX).unwrap();

    let page = PageFetcher::<_, Row>::new(&executor, BASE)
        .unwrap()
        .page_request(request)
        .row_mapper(&map_row)
        .fetch()
        .await
        .unwrap();

    assert!(page.content().is_empty());
    assert_eq!(page.total_elements(), 25);
    assert_eq!(page.page(), 0);

    let statements = executor.statements().await;
    assert_eq!(
        statements[1].params.value("startRow").unwrap(),
        &SqlValue::Int(i64::MAX)
    );
}

#[test]
fn function_mappers_are_row_mappers() {
    let row = MemoryRow::new().with("id", 4).with("name", "four");
    let mapper: &dyn RowMapper<MemoryRow, Row> = &map_row;
    assert_eq!(
        mapper.map_row(&row).unwrap(),
        Row {
            id: 4,
            name: "four".to_string()
        }
    );
}
