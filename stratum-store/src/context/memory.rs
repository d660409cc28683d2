use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::context::{Context, ContextProvider};
use crate::error::{Result, StoreError};

/// Journal of committed statements, shared by every [`MemoryContext`] a
/// provider creates. Statements only land here when their scope persists.
#[derive(Debug, Clone, Default)]
pub struct MemoryJournal(Arc<RwLock<Vec<String>>>);

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn committed(&self) -> Vec<String> {
        self.0.read().clone()
    }
}

/// [`Context`] with no database behind it: executed statements are
/// journaled and transaction semantics are simulated against the journal.
pub struct MemoryContext {
    journal: MemoryJournal,
    staged: Vec<String>,
    open: bool,
    in_transaction: bool,
    disposed: bool,
}

impl MemoryContext {
    pub fn new(journal: MemoryJournal) -> Self {
        Self {
            journal,
            staged: Vec::new(),
            open: false,
            in_transaction: false,
            disposed: false,
        }
    }

    fn check_open(&self) -> Result<()> {
        if self.disposed {
            return Err(StoreError::Disposed);
        }

        if !self.open {
            return Err(StoreError::NotPrepared);
        }

        Ok(())
    }
}

#[async_trait]
impl Context for MemoryContext {
    async fn prepare(&mut self) -> Result<()> {
        if self.disposed {
            return Err(StoreError::Disposed);
        }

        if self.in_transaction {
            return Err(StoreError::TransactionAlreadyOpen);
        }

        self.open = true;
        self.in_transaction = true;

        Ok(())
    }

    async fn open(&mut self) -> Result<()> {
        if self.disposed {
            return Err(StoreError::Disposed);
        }

        self.open = true;

        Ok(())
    }

    async fn persist(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Err(StoreError::NoOpenTransaction);
        }

        self.journal.0.write().append(&mut self.staged);
        self.in_transaction = false;

        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Err(StoreError::NoOpenTransaction);
        }

        self.staged.clear();
        self.in_transaction = false;

        Ok(())
    }

    async fn execute(&mut self, sql: &str, _params: Vec<Value>) -> Result<u64> {
        self.check_open()?;

        if self.in_transaction {
            self.staged.push(sql.to_owned());
        } else {
            self.journal.0.write().push(sql.to_owned());
        }

        Ok(1)
    }

    async fn query_scalar(&mut self, _sql: &str, _params: Vec<Value>) -> Result<Option<String>> {
        self.check_open()?;

        Ok(None)
    }

    async fn query_column(&mut self, _sql: &str, _params: Vec<Value>) -> Result<Vec<String>> {
        self.check_open()?;

        Ok(Vec::new())
    }

    async fn query_rows(
        &mut self,
        _sql: &str,
        _params: Vec<Value>,
    ) -> Result<Vec<Vec<Option<String>>>> {
        self.check_open()?;

        Ok(Vec::new())
    }

    async fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }

        self.staged.clear();
        self.open = false;
        self.in_transaction = false;
        self.disposed = true;

        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction
    }
}

/// Creates [`MemoryContext`] instances sharing one journal.
#[derive(Debug, Clone, Default)]
pub struct MemoryContextProvider {
    journal: MemoryJournal,
}

impl MemoryContextProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: MemoryJournal) -> Self {
        Self { journal }
    }

    pub fn journal(&self) -> MemoryJournal {
        self.journal.clone()
    }
}

impl ContextProvider for MemoryContextProvider {
    fn create(&self) -> Box<dyn Context> {
        Box::new(MemoryContext::new(self.journal.clone()))
    }
}
