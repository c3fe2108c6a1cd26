//! Paging, multi-result and close behavior of the blocking query driver.
#![cfg(feature = "sync")]

mod common;

use common::{NUMBERS_SQL, ns, numbers, numbers_executor, select_one_two_executor};
use zero_query::memory::MemoryExecutor;
use zero_query::sync::{Query, QueryExecutor};
use zero_query::{Continuation, Error, Opts, QueryState, Statement};

#[test]
fn test_has_more_false_before_execute() {
    let mut executor = numbers_executor(10);
    let stmt = executor.prepare(NUMBERS_SQL).unwrap();

    let query = executor.create_query(Statement::prepared(&stmt, ()));
    assert!(!query.has_more());
    assert_eq!(query.state(), QueryState::Idle);
}

/// Prepared statement, fetch size 50, 120 rows: pages of 50, 50, 20.
#[test]
fn test_fetch_size_pages() {
    let mut executor = numbers_executor(120);
    let stmt = executor.prepare(NUMBERS_SQL).unwrap();

    let mut query = Query::new(&mut executor, Statement::prepared(&stmt, ()));
    query.fetch(50).unwrap();

    let page = query.execute().unwrap();
    assert_eq!(page.len(), 50);
    assert!(page.more_rows_available());
    assert!(query.has_more());
    let mut all = ns(&page);

    let page = query.execute().unwrap();
    assert_eq!(page.len(), 50);
    assert!(page.more_rows_available());
    assert!(query.has_more());
    all.extend(ns(&page));

    let page = query.execute().unwrap();
    assert_eq!(page.len(), 20);
    assert!(!page.more_rows_available());
    assert!(!page.more_results_available());
    assert!(!query.has_more());
    assert_eq!(query.state(), QueryState::Exhausted);
    all.extend(ns(&page));

    assert_eq!(all, (1..=120).collect::<Vec<_>>());
    query.close().unwrap();

    // Cursor was closed by the server with the last page
    assert_eq!(executor.open_cursor_count(), 0);
    assert_eq!(executor.release_count(), 0);
    assert_eq!(executor.submit_count(), 3);
}

#[test]
fn test_unbounded_fetch_returns_everything() {
    let mut executor = numbers_executor(120);
    let stmt = executor.prepare(NUMBERS_SQL).unwrap();

    let mut query = executor.create_query(Statement::prepared(&stmt, ()));
    let page = query.execute().unwrap();
    assert_eq!(page.len(), 120);
    assert!(!query.has_more());
    drop(query);

    assert_eq!(executor.open_cursor_count(), 0);
}

#[test]
fn test_close_twice_releases_once() {
    let mut executor = numbers_executor(120);
    let stmt = executor.prepare(NUMBERS_SQL).unwrap();

    let mut query = executor.create_query(Statement::prepared(&stmt, ()));
    query.fetch(50).unwrap().execute().unwrap();
    assert!(query.has_more());

    query.close().unwrap();
    query.close().unwrap();
    assert_eq!(query.state(), QueryState::Closed);
    assert!(!query.has_more());
    drop(query);

    assert_eq!(executor.release_count(), 1);
    assert_eq!(executor.open_cursor_count(), 0);
}

#[test]
fn test_close_without_cursor_skips_release() {
    let mut executor = numbers_executor(5);

    let mut query = executor.create_query(NUMBERS_SQL);
    query.close().unwrap();
    query.close().unwrap();
    drop(query);

    assert_eq!(executor.release_count(), 0);
    assert_eq!(executor.submit_count(), 0);
}

#[test]
fn test_fetch_on_simple_statement_fails() {
    let mut executor = numbers_executor(5);

    let mut query = executor.create_query(NUMBERS_SQL);
    for n in [1, 50, 1000, u32::MAX] {
        let err = query.fetch(n).err().unwrap();
        assert!(err.is_invalid_state(), "fetch({n}) returned {err}");
    }

    // The query itself is still usable
    let page = query.execute().unwrap();
    assert_eq!(page.len(), 5);
}

#[test]
fn test_execute_and_fetch_after_close_fail() {
    let mut executor = numbers_executor(5);
    let stmt = executor.prepare(NUMBERS_SQL).unwrap();

    let mut query = executor.create_query(Statement::prepared(&stmt, ()));
    query.close().unwrap();

    assert!(query.execute().unwrap_err().is_invalid_state());
    assert!(query.fetch(10).err().unwrap().is_invalid_state());
}

/// `"SELECT 1; SELECT 2;"` yields one page per statement.
#[test]
fn test_multi_statement_simple_query() {
    let mut executor = select_one_two_executor();

    let mut query = executor.create_query("SELECT 1; SELECT 2;");

    let page = query.execute().unwrap();
    assert_eq!(page.first::<(i32,)>().unwrap(), Some((1,)));
    assert!(!page.more_rows_available());
    assert!(page.more_results_available());
    assert_eq!(page.continuation(), Continuation::NextResult);
    assert!(query.has_more());

    let page = query.execute().unwrap();
    assert_eq!(page.first::<(i32,)>().unwrap(), Some((2,)));
    assert!(!page.more_results_available());
    assert_eq!(page.continuation(), Continuation::Done);
    assert!(!query.has_more());
    drop(query);

    assert_eq!(executor.open_cursor_count(), 0);
}

#[test]
fn test_multi_statement_close_early() {
    let mut executor = select_one_two_executor();

    let mut query = executor.create_query("SELECT 1; SELECT 2");
    query.execute().unwrap();
    assert!(query.has_more());
    query.close().unwrap();
    drop(query);

    assert_eq!(executor.release_count(), 1);
    assert_eq!(executor.open_cursor_count(), 0);
}

#[test]
fn test_simple_query_with_command_result() {
    let mut executor = numbers_executor(3).with_result_set(
        "UPDATE numbers SET n = n + 1",
        zero_query::memory::ResultSet::command(3),
    );

    let mut query = executor.create_query("UPDATE numbers SET n = n + 1; SELECT n FROM numbers");
    let page = query.execute().unwrap();
    assert_eq!(page.rows_affected(), Some(3));
    assert!(page.is_empty());
    assert!(query.has_more());

    let page = query.execute().unwrap();
    assert_eq!(ns(&page), vec![1, 2, 3]);
    assert!(!query.has_more());
}

/// A prepared statement producing two result sets, paged with a fetch size.
#[test]
fn test_prepared_rows_then_next_result() {
    let mut executor = MemoryExecutor::new()
        .with_result_set("CALL report()", numbers(3))
        .with_result_set("CALL report()", numbers(2));
    let stmt = executor.prepare("CALL report()").unwrap();

    let mut query = executor.create_query(Statement::prepared(&stmt, ()));
    query.fetch(2).unwrap();

    let page = query.execute().unwrap();
    assert_eq!(ns(&page), vec![1, 2]);
    assert_eq!(page.continuation(), Continuation::MoreRows);
    assert!(page.more_results_available());

    let page = query.execute().unwrap();
    assert_eq!(ns(&page), vec![3]);
    assert_eq!(page.continuation(), Continuation::NextResult);

    let page = query.execute().unwrap();
    assert_eq!(ns(&page), vec![1, 2]);
    assert_eq!(page.continuation(), Continuation::Done);
    assert!(!query.has_more());
}

#[test]
fn test_change_fetch_size_between_pages() {
    let mut executor = numbers_executor(120);
    let stmt = executor.prepare(NUMBERS_SQL).unwrap();

    let mut query = executor.create_query(Statement::prepared(&stmt, ()));
    assert_eq!(query.fetch(50).unwrap().execute().unwrap().len(), 50);
    assert_eq!(query.fetch(10).unwrap().execute().unwrap().len(), 10);

    // 0 drains the rest
    let page = query.fetch(0).unwrap().execute().unwrap();
    assert_eq!(page.len(), 60);
    assert_eq!(ns(&page).first(), Some(&61));
    assert!(!query.has_more());
}

#[test]
fn test_reexecute_after_exhausted_restarts() {
    let mut executor = numbers_executor(3);
    let stmt = executor.prepare(NUMBERS_SQL).unwrap();

    let mut query = executor.create_query(Statement::prepared(&stmt, ()));
    assert_eq!(ns(&query.execute().unwrap()), vec![1, 2, 3]);
    assert_eq!(query.state(), QueryState::Exhausted);
    assert_eq!(ns(&query.execute().unwrap()), vec![1, 2, 3]);
}

#[test]
fn test_opts_fetch_size() {
    let opts = Opts::try_from("postgres://localhost/db?fetch_size=40").unwrap();
    let mut executor = numbers_executor(100);
    let stmt = executor.prepare(NUMBERS_SQL).unwrap();

    let mut query = Query::with_opts(&mut executor, Statement::prepared(&stmt, ()), &opts);
    assert_eq!(query.fetch_size().rows(), 40);
    assert_eq!(query.execute().unwrap().len(), 40);
    query.close().unwrap();

    // Simple statements ignore the default fetch size
    let mut query = Query::with_opts(&mut executor, NUMBERS_SQL, &opts);
    assert_eq!(query.fetch_size().rows(), 0);
    assert_eq!(query.execute().unwrap().len(), 100);
}

/// A server error leaves the cursor open: the next execute continues it and
/// close releases it.
#[test]
fn test_server_error_keeps_cursor() {
    let executor = numbers_executor(120);
    let stmt = executor.prepare(NUMBERS_SQL).unwrap();

    let mut conn = &executor;
    let mut query = Query::new(&mut conn, Statement::prepared(&stmt, ()));
    query.fetch(50).unwrap().execute().unwrap();

    executor.inject_error(Error::server("57014", "canceling statement due to user request"));
    let err = query.execute().unwrap_err();
    assert_eq!(err.sqlstate(), Some("57014"));
    assert!(!query.has_more());
    assert_eq!(query.state(), QueryState::Idle);

    let page = query.execute().unwrap();
    assert_eq!(ns(&page).first(), Some(&51));
    assert!(query.has_more());

    query.close().unwrap();
    assert_eq!(executor.release_count(), 1);
    assert_eq!(executor.open_cursor_count(), 0);
}

#[test]
fn test_server_error_on_first_execute() {
    let mut executor = numbers_executor(120);
    let stmt = executor.prepare(NUMBERS_SQL).unwrap();
    executor.inject_error(Error::server("57014", "canceling statement due to user request"));

    let mut query = executor.create_query(Statement::prepared(&stmt, ()));
    query.fetch(50).unwrap();
    let err = query.execute().unwrap_err();
    assert_eq!(err.sqlstate(), Some("57014"));
    assert!(!query.has_more());

    // Nothing was opened; the next execute starts from the first row
    let page = query.execute().unwrap();
    assert_eq!(ns(&page).first(), Some(&1));
    assert!(query.has_more());
}

/// Connection drops while an execute is in flight: the error is a connection
/// error and close completes without a round trip.
#[test]
fn test_connection_loss_mid_fetch() {
    let executor = numbers_executor(120);
    let stmt = executor.prepare(NUMBERS_SQL).unwrap();

    let mut conn = &executor;
    let mut query = Query::new(&mut conn, Statement::prepared(&stmt, ()));
    query.fetch(50).unwrap().execute().unwrap();
    assert_eq!(executor.open_cursor_count(), 1);

    executor.disconnect_on_next_submit();
    let err = query.execute().unwrap_err();
    assert!(err.is_connection_broken());
    assert!(!query.has_more());

    query.close().unwrap();
    assert_eq!(query.state(), QueryState::Closed);
    assert_eq!(executor.release_count(), 0);
}

#[test]
fn test_close_after_disconnect() {
    let executor = numbers_executor(120);
    let stmt = executor.prepare(NUMBERS_SQL).unwrap();

    let mut conn = &executor;
    let mut query = Query::new(&mut conn, Statement::prepared(&stmt, ()));
    query.fetch(50).unwrap().execute().unwrap();
    assert!(query.has_more());

    executor.disconnect();
    query.close().unwrap();
    assert_eq!(executor.release_count(), 0);
}

#[test]
fn test_discard_releases_cursor() {
    let executor = numbers_executor(120);
    let stmt = executor.prepare(NUMBERS_SQL).unwrap();

    let mut conn = &executor;
    let mut query = Query::new(&mut conn, Statement::prepared(&stmt, ()));
    query.fetch(50).unwrap().execute().unwrap();
    query.discard();
    assert_eq!(query.state(), QueryState::Closed);
    assert_eq!(executor.release_count(), 1);
    assert_eq!(executor.open_cursor_count(), 0);
}

#[test]
fn test_bind_parameter_count_mismatch() {
    let mut executor = MemoryExecutor::new().with_result_set(
        "SELECT n FROM numbers WHERE n > $1",
        numbers(3),
    );
    let stmt = executor
        .prepare("SELECT n FROM numbers WHERE n > $1")
        .unwrap();
    assert_eq!(stmt.param_count, 1);

    let mut query = executor.create_query(Statement::prepared(&stmt, ()));
    let err = query.execute().unwrap_err();
    assert_eq!(err.sqlstate(), Some("08P01"));

    let mut query = executor.create_query(Statement::prepared(&stmt, (0i32,)));
    assert_eq!(query.execute().unwrap().len(), 3);
}

#[test]
fn test_unknown_statement() {
    let mut executor = MemoryExecutor::new();
    let mut query = executor.create_query("SELECT * FROM missing");
    let err = query.execute().unwrap_err();
    assert_eq!(err.sqlstate(), Some("42P01"));
    assert_eq!(query.state(), QueryState::Idle);
}
