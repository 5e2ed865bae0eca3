//! End-to-end tests of the provider over SQLx SQLite pools.

use std::time::Duration;

use dao_connection_source::{
   ConnectionState, ProviderConfig, SqliteConnectionSource, UnitOfWorkError,
};
use sqlx::Row;
use sqlx_pool_registry::{SqlitePoolConfig, SqlitePoolRegistry};

struct TestSource {
   provider: SqliteConnectionSource,
   _temp_dir: tempfile::TempDir,
}

async fn setup_source() -> TestSource {
   setup_source_with(|c| c).await
}

async fn setup_source_with(config: impl FnOnce(SqlitePoolConfig) -> SqlitePoolConfig) -> TestSource {
   let temp_dir = tempfile::tempdir().unwrap();
   let registry = SqlitePoolRegistry::new();
   let base = SqlitePoolConfig::new(temp_dir.path().join("orders.db"));
   registry.bind("db/orders", config(base)).await.unwrap();

   let provider = SqliteConnectionSource::new(registry, ProviderConfig::new("db/orders"));

   let mut conn = provider.acquire().await.unwrap();
   sqlx::query("CREATE TABLE orders (id INTEGER PRIMARY KEY, item TEXT NOT NULL)")
      .execute(&mut **conn)
      .await
      .unwrap();
   provider.commit(Some(&mut conn)).await;
   provider.release_connection(Some(conn)).await.unwrap();

   TestSource {
      provider,
      _temp_dir: temp_dir,
   }
}

async fn count_orders(provider: &SqliteConnectionSource) -> i64 {
   let mut conn = provider.acquire().await.unwrap();
   let row = sqlx::query("SELECT COUNT(*) AS n FROM orders")
      .fetch_one(&mut **conn)
      .await
      .unwrap();
   let count: i64 = row.get("n");
   provider.release_connection(Some(conn)).await.unwrap();
   count
}

#[tokio::test]
async fn test_unbound_name_is_configuration_error() {
   let provider = SqliteConnectionSource::new(SqlitePoolRegistry::new(), ProviderConfig::default());

   let err = provider.initialize().await.unwrap_err();
   assert_eq!(err.error_code(), "CONFIGURATION_LOOKUP_ERROR");
   assert!(err.provider_error().has_code("NAME_NOT_BOUND"));
}

#[tokio::test]
async fn test_acquired_connection_is_in_manual_commit_mode() {
   let source = setup_source().await;

   let mut conn = source.provider.acquire().await.unwrap();
   assert!(!conn.auto_commit());
   assert!(conn.in_transaction().await.unwrap());

   source.provider.release_connection(Some(conn)).await.unwrap();
}

#[tokio::test]
async fn test_committed_work_is_visible() {
   let source = setup_source().await;

   let mut conn = source.provider.acquire().await.unwrap();
   sqlx::query("INSERT INTO orders (item) VALUES ('widget')")
      .execute(&mut **conn)
      .await
      .unwrap();
   source.provider.commit(Some(&mut conn)).await;
   source.provider.release_connection(Some(conn)).await.unwrap();

   assert_eq!(count_orders(&source.provider).await, 1);
}

#[tokio::test]
async fn test_uncommitted_work_is_discarded_on_release() {
   let source = setup_source().await;

   let mut conn = source.provider.acquire().await.unwrap();
   sqlx::query("INSERT INTO orders (item) VALUES ('gadget')")
      .execute(&mut **conn)
      .await
      .unwrap();
   source.provider.release_connection(Some(conn)).await.unwrap();

   assert_eq!(count_orders(&source.provider).await, 0);
}

#[tokio::test]
async fn test_rolled_back_work_is_discarded() {
   let source = setup_source().await;

   let mut conn = source.provider.acquire().await.unwrap();
   sqlx::query("INSERT INTO orders (item) VALUES ('gizmo')")
      .execute(&mut **conn)
      .await
      .unwrap();
   source.provider.rollback(Some(&mut conn)).await;
   source.provider.release_connection(Some(conn)).await.unwrap();

   assert_eq!(count_orders(&source.provider).await, 0);
}

#[tokio::test]
async fn test_unit_of_work_over_sqlite() {
   let source = setup_source().await;

   let inserted = source
      .provider
      .run_in_transaction(|conn| {
         Box::pin(async move {
            sqlx::query("INSERT INTO orders (item) VALUES ('sprocket')")
               .execute(&mut **conn)
               .await
               .map(|done| done.rows_affected())
         })
      })
      .await
      .unwrap();
   assert_eq!(inserted, 1);

   let err = source
      .provider
      .run_in_transaction(|conn| {
         Box::pin(async move {
            sqlx::query("INSERT INTO orders (item) VALUES ('cog')")
               .execute(&mut **conn)
               .await?;
            sqlx::query("INSERT INTO missing_table (item) VALUES ('cog')")
               .execute(&mut **conn)
               .await
               .map(|_| ())
         })
      })
      .await
      .unwrap_err();
   assert!(matches!(err, UnitOfWorkError::Work(sqlx::Error::Database(_))));

   assert_eq!(count_orders(&source.provider).await, 1);
}

#[tokio::test]
async fn test_dropped_connection_does_not_block_next_acquire() {
   let source = setup_source_with(|c| SqlitePoolConfig {
      max_connections: 1,
      acquire_timeout: Duration::from_secs(5),
      ..c
   })
   .await;

   let mut conn = source.provider.acquire().await.unwrap();
   sqlx::query("INSERT INTO orders (item) VALUES ('flange')")
      .execute(&mut **conn)
      .await
      .unwrap();
   drop(conn);

   let conn = source.provider.acquire().await.unwrap();
   source.provider.release_connection(Some(conn)).await.unwrap();

   assert_eq!(count_orders(&source.provider).await, 0);
}

#[tokio::test]
async fn test_boundaries_survive_statement_level_rollback() {
   let source = setup_source().await;

   let mut conn = source.provider.acquire().await.unwrap();
   sqlx::query("INSERT INTO orders (id, item) VALUES (1, 'axle')")
      .execute(&mut **conn)
      .await
      .unwrap();
   let conflict = sqlx::query("INSERT OR ROLLBACK INTO orders (id, item) VALUES (1, 'bolt')")
      .execute(&mut **conn)
      .await;
   assert!(conflict.is_err());

   source.provider.commit(Some(&mut conn)).await;
   assert_eq!(conn.state(), ConnectionState::Committed);

   sqlx::query("INSERT INTO orders (item) VALUES ('bearing')")
      .execute(&mut **conn)
      .await
      .unwrap();
   source.provider.rollback(Some(&mut conn)).await;
   assert_eq!(conn.state(), ConnectionState::RolledBack);
   source.provider.release_connection(Some(conn)).await.unwrap();

   assert_eq!(count_orders(&source.provider).await, 0);
}
