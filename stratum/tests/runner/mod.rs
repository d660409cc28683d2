use async_trait::async_trait;
use stratum::{
    Context, ContextProvider, HistoryStore, Migration, Runner, RunnerError, StoreResult,
};

/// One handle-factory per storage backend; every call returns a fresh
/// store or provider over the same underlying database.
pub trait Backend {
    fn store(&self) -> HistoryStore;
    fn contexts(&self) -> Box<dyn ContextProvider>;
}

pub struct TestMigration {
    id: String,
    statements: Vec<String>,
    down_statements: Vec<String>,
    fail: bool,
    transactional: bool,
}

impl TestMigration {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            statements: Vec::new(),
            down_statements: Vec::new(),
            fail: false,
            transactional: true,
        }
    }

    pub fn statement(mut self, sql: &str) -> Self {
        self.statements.push(sql.to_owned());
        self
    }

    pub fn down(mut self, sql: &str) -> Self {
        self.down_statements.push(sql.to_owned());
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn non_transactional(mut self) -> Self {
        self.transactional = false;
        self
    }

    pub fn boxed(self) -> Box<dyn Migration> {
        Box::new(self)
    }
}

#[async_trait]
impl Migration for TestMigration {
    fn id(&self) -> &str {
        &self.id
    }

    fn requires_transaction(&self) -> bool {
        self.transactional
    }

    async fn apply(&self, context: &mut dyn Context) -> StoreResult<()> {
        for statement in &self.statements {
            context.execute(statement, Vec::new()).await?;
        }

        if self.fail {
            return Err(anyhow::anyhow!("migration `{}` failed on purpose", self.id).into());
        }

        Ok(())
    }

    async fn rollback(&self, context: &mut dyn Context) -> StoreResult<()> {
        for statement in &self.down_statements {
            context.execute(statement, Vec::new()).await?;
        }

        Ok(())
    }
}

pub fn set_of_three() -> Vec<Box<dyn Migration>> {
    vec![
        TestMigration::new("M001")
            .statement("CREATE TABLE m001 (id TEXT)")
            .down("DROP TABLE m001")
            .boxed(),
        TestMigration::new("M002")
            .statement("CREATE TABLE m002 (id TEXT)")
            .down("DROP TABLE m002")
            .boxed(),
        TestMigration::new("M003")
            .statement("CREATE TABLE m003 (id TEXT)")
            .down("DROP TABLE m003")
            .boxed(),
    ]
}

pub fn build(backend: &dyn Backend, migrations: Vec<Box<dyn Migration>>) -> anyhow::Result<Runner> {
    Ok(Runner::builder(migrations, backend.store(), backend.contexts()).build()?)
}

pub async fn apply_all_from_empty(backend: &dyn Backend) -> anyhow::Result<()> {
    let mut runner = build(backend, set_of_three())?;

    let report = runner.apply_all().await?;
    assert_eq!(report.applied, vec!["M001", "M002", "M003"]);

    let mut verify = backend.store();
    let records = verify.records().await?;
    let ids: Vec<&str> = records.iter().map(|r| r.migration_id.as_str()).collect();

    assert_eq!(ids, vec!["M001", "M002", "M003"]);
    assert!(records[0].applied_on <= records[1].applied_on);
    assert!(records[1].applied_on <= records[2].applied_on);

    Ok(())
}

pub async fn apply_to_target_applies_prefix(backend: &dyn Backend) -> anyhow::Result<()> {
    let mut runner = build(backend, set_of_three())?;

    let report = runner.apply_to("M002").await?;
    assert_eq!(report.applied, vec!["M001", "M002"]);
    assert_eq!(runner.pending().await?, vec!["M003"]);

    Ok(())
}

pub async fn apply_to_resumes_after_recorded_history(backend: &dyn Backend) -> anyhow::Result<()> {
    let mut first = build(backend, set_of_three())?;
    first.apply_to("M001").await?;

    let mut second = build(backend, set_of_three())?;
    let report = second.apply_to("M002").await?;

    assert_eq!(report.applied, vec!["M002"]);
    assert_eq!(second.pending().await?, vec!["M003"]);

    let mut verify = backend.store();
    let mut ids = verify.get_all_migrations().await?;
    ids.sort_unstable();
    assert_eq!(ids, vec!["M001", "M002"]);

    Ok(())
}

pub async fn second_run_is_noop(backend: &dyn Backend) -> anyhow::Result<()> {
    let mut runner = build(backend, set_of_three())?;

    runner.apply_all().await?;
    let report = runner.apply_all().await?;

    assert!(report.applied.is_empty());

    let mut verify = backend.store();
    assert_eq!(verify.get_all_migrations().await?.len(), 3);

    Ok(())
}

pub async fn unknown_target_is_rejected(backend: &dyn Backend) -> anyhow::Result<()> {
    let mut runner = build(backend, set_of_three())?;

    let err = runner.apply_to("NOT_REGISTERED").await.unwrap_err();
    assert!(matches!(err, RunnerError::UnknownTarget(_)));

    let mut verify = backend.store();
    verify.prepare_database().await?;
    assert!(verify.get_all_migrations().await?.is_empty());

    Ok(())
}

pub async fn normalization_makes_targets_equivalent(backend: &dyn Backend) -> anyhow::Result<()> {
    let mut runner = build(backend, set_of_three())?;

    let report = runner.apply_to("  m002  ").await?;
    assert_eq!(report.applied, vec!["M001", "M002"]);

    let report = runner.apply_to("M002").await?;
    assert!(report.applied.is_empty());

    Ok(())
}

pub async fn history_ahead_of_code_is_rejected(backend: &dyn Backend) -> anyhow::Result<()> {
    let mut seed = backend.store();
    seed.prepare_database().await?;
    seed.add_migration("M001", "First", None).await?;
    seed.add_migration("M002", "Second", None).await?;
    seed.add_migration("M003", "Third", None).await?;

    let migrations = vec![TestMigration::new("M001").boxed(), TestMigration::new("M002").boxed()];
    let mut runner = build(backend, migrations)?;

    let err = runner.apply_all().await.unwrap_err();
    assert!(matches!(
        err,
        RunnerError::HistoryAheadOfCode {
            applied: 3,
            registered: 2,
        }
    ));

    let mut verify = backend.store();
    assert_eq!(verify.get_all_migrations().await?.len(), 3);

    Ok(())
}

pub async fn history_mismatch_is_rejected(backend: &dyn Backend) -> anyhow::Result<()> {
    let mut seed = backend.store();
    seed.prepare_database().await?;
    seed.add_migration("M000", "Stranger", None).await?;

    let mut runner = build(backend, set_of_three())?;

    let err = runner.apply_all().await.unwrap_err();
    match err {
        RunnerError::HistoryMismatch {
            index,
            applied,
            registered,
        } => {
            assert_eq!(index, 0);
            assert_eq!(applied, "M000");
            assert_eq!(registered, "M001");
        }
        other => panic!("expected history mismatch, got {other}"),
    }

    let mut verify = backend.store();
    assert_eq!(verify.get_all_migrations().await?, vec!["M000"]);

    Ok(())
}

pub async fn failure_stops_the_run(backend: &dyn Backend) -> anyhow::Result<()> {
    let migrations = vec![
        TestMigration::new("M001").statement("CREATE TABLE m001 (id TEXT)").boxed(),
        TestMigration::new("M002").statement("CREATE TABLE m002 (id TEXT)").failing().boxed(),
        TestMigration::new("M003").statement("CREATE TABLE m003 (id TEXT)").boxed(),
    ];
    let mut runner = build(backend, migrations)?;

    let err = runner.apply_all().await.unwrap_err();
    assert!(matches!(err, RunnerError::Store(_)));

    let mut verify = backend.store();
    assert_eq!(verify.get_all_migrations().await?, vec!["M001"]);

    // a corrected set resumes exactly after the last recorded migration
    let mut fixed = build(backend, set_of_three())?;
    let report = fixed.apply_all().await?;
    assert_eq!(report.applied, vec!["M002", "M003"]);

    Ok(())
}

pub async fn revert_walks_history_backwards(backend: &dyn Backend) -> anyhow::Result<()> {
    let mut runner = build(backend, set_of_three())?;
    runner.apply_all().await?;

    assert_eq!(runner.revert_most_recent().await?, Some("M003".to_owned()));
    assert_eq!(runner.revert_most_recent().await?, Some("M002".to_owned()));
    assert_eq!(runner.most_recent_applied().await?, Some("M001".to_owned()));
    assert_eq!(runner.revert_most_recent().await?, Some("M001".to_owned()));
    assert_eq!(runner.revert_most_recent().await?, None);

    Ok(())
}

pub async fn empty_set_is_noop(backend: &dyn Backend) -> anyhow::Result<()> {
    let mut runner = build(backend, Vec::new())?;

    assert!(runner.apply_all().await?.applied.is_empty());
    assert!(runner.pending().await?.is_empty());

    Ok(())
}

pub async fn duplicate_id_fails_construction(backend: &dyn Backend) -> anyhow::Result<()> {
    let migrations = vec![TestMigration::new("M001").boxed(), TestMigration::new(" m001 ").boxed()];
    let result = Runner::builder(migrations, backend.store(), backend.contexts()).build();

    assert!(matches!(result.err(), Some(RunnerError::DuplicateId(id)) if id == "M001"));

    Ok(())
}
