use stratum_store::{HistoryStore, StoreError};

pub async fn prepare_is_idempotent(store: &mut HistoryStore) -> anyhow::Result<()> {
    store.prepare_database().await?;
    store.prepare_database().await?;

    Ok(())
}

pub async fn add_and_list(store: &mut HistoryStore) -> anyhow::Result<()> {
    store.prepare_database().await?;
    store
        .add_migration("M20240101_INIT", "InitSchema", Some("initial schema"))
        .await?;
    store.add_migration("M20240202_USERS", "CreateUsers", None).await?;

    let mut ids = store.get_all_migrations().await?;
    ids.sort_unstable();

    assert_eq!(ids, vec!["M20240101_INIT", "M20240202_USERS"]);
    assert_eq!(
        store.get_most_recent_migration_id().await?,
        Some("M20240202_USERS".to_owned())
    );

    Ok(())
}

pub async fn add_rejects_out_of_order(store: &mut HistoryStore) -> anyhow::Result<()> {
    store.prepare_database().await?;
    store.add_migration("M002", "Second", None).await?;

    let err = store.add_migration("M001", "First", None).await.unwrap_err();
    assert!(matches!(err, StoreError::OutOfOrderMigration { .. }));

    let err = store.add_migration("M002", "Second", None).await.unwrap_err();
    assert!(matches!(err, StoreError::OutOfOrderMigration { .. }));

    assert_eq!(store.get_all_migrations().await?, vec!["M002"]);

    Ok(())
}

pub async fn add_rejects_blank_arguments(store: &mut HistoryStore) -> anyhow::Result<()> {
    store.prepare_database().await?;

    let err = store.add_migration("   ", "First", None).await.unwrap_err();
    assert!(matches!(err, StoreError::BlankArgument("migration_id")));

    let err = store.add_migration("M001", "  ", None).await.unwrap_err();
    assert!(matches!(err, StoreError::BlankArgument("class_name")));

    assert!(store.get_all_migrations().await?.is_empty());

    Ok(())
}

pub async fn identifiers_are_normalized(store: &mut HistoryStore) -> anyhow::Result<()> {
    store.prepare_database().await?;
    store.add_migration("  m001  ", "init_schema", None).await?;

    assert_eq!(store.get_all_migrations().await?, vec!["M001"]);

    let records = store.records().await?;
    assert_eq!(records[0].class_name, "INIT_SCHEMA");

    Ok(())
}

pub async fn remove_most_recent_walks_backwards(store: &mut HistoryStore) -> anyhow::Result<()> {
    store.prepare_database().await?;
    store.add_migration("M001", "First", None).await?;
    store.add_migration("M002", "Second", None).await?;

    assert!(store.remove_most_recent_migration().await?);
    assert_eq!(
        store.get_most_recent_migration_id().await?,
        Some("M001".to_owned())
    );

    assert!(store.remove_most_recent_migration().await?);
    assert_eq!(store.get_most_recent_migration_id().await?, None);

    assert!(!store.remove_most_recent_migration().await?);

    Ok(())
}

pub async fn records_round_trip(store: &mut HistoryStore) -> anyhow::Result<()> {
    store.prepare_database().await?;
    store.add_migration("M001", "First", Some("create first")).await?;
    store.add_migration("M002", "Second", None).await?;

    let records = store.records().await?;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].migration_id, "M001");
    assert_eq!(records[0].class_name, "FIRST");
    assert_eq!(records[0].description.as_deref(), Some("create first"));
    assert_eq!(records[1].migration_id, "M002");
    assert_eq!(records[1].description, None);
    assert!(records[0].applied_on <= records[1].applied_on);

    Ok(())
}

pub async fn contexts_share_one_table(
    main: &mut HistoryStore,
    reporting: &mut HistoryStore,
) -> anyhow::Result<()> {
    main.prepare_database().await?;
    reporting.prepare_database().await?;

    main.add_migration("M001", "First", None).await?;
    reporting.add_migration("R001", "Reports", None).await?;

    assert_eq!(main.get_all_migrations().await?, vec!["M001"]);
    assert_eq!(reporting.get_all_migrations().await?, vec!["R001"]);

    Ok(())
}
