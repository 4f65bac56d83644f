//! End-to-end smoke tests against a live PostgreSQL.
//!
//! Run with `--features db-tests` and a database reachable through
//! `DATABASE_URL`, `VCAP_SERVICES` or the `GUESTBOOK_DB_*` variables.

#![cfg(feature = "db-tests")]

use std::sync::Arc;

use guestbook_api::{ApiResult, DbConfig, PostgresVisitorStore, VisitorService};
use guestbook_core::{Greeting, Visitor};
use guestbook_storage::VisitorStore;
use guestbook_test_utils::InMemoryPresenceCache;

async fn test_store() -> ApiResult<PostgresVisitorStore> {
    let config = DbConfig::from_env();
    let store = PostgresVisitorStore::from_config(&config)?;
    store.ensure_schema().await?;
    Ok(store)
}

fn unique_name(prefix: &str) -> String {
    format!("{}-{}", prefix, guestbook_core::new_visitor_id())
}

#[tokio::test]
async fn smoke_test_create_then_list() -> ApiResult<()> {
    let store = test_store().await?;
    let cache = InMemoryPresenceCache::new();
    let service = VisitorService::new(Some(Arc::new(store.clone())), Some(Arc::new(cache)));
    let name = unique_name("smoke");

    let greeting = service.create(Visitor::named(name.clone())).await?;
    assert_eq!(greeting, Greeting::Added(name.clone()));

    let greeting = service.create(Visitor::named(name.clone())).await?;
    assert_eq!(greeting, Greeting::Returning(name.clone()));

    let names = service.list_names().await?;
    assert_eq!(names.iter().filter(|n| **n == name).count(), 1);
    Ok(())
}

#[tokio::test]
async fn smoke_test_persist_round_trip() -> ApiResult<()> {
    let store = test_store().await?;
    let name = unique_name("persist");

    let record = store.persist(&Visitor::named(name.clone())).await?;
    assert_eq!(record.name.as_deref(), Some(name.as_str()));

    let records = store.list().await?;
    assert!(records.iter().any(|r| r.id == record.id));
    store.ping().await?;
    Ok(())
}
