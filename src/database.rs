//! Transaction collaborator.
//!
//! The dispatcher never opens transactions. When a dispatch fails it asks an attached
//! [`Transactional`] connection to roll back, and only if that connection reports an open
//! transaction.

/// A database connection that may hold an open transaction.
pub trait Transactional: Send + Sync {
    fn in_transaction(&self) -> bool;

    fn rollback(&self) -> anyhow::Result<()>;
}
