//! Destroy lifecycle hooks.
//!
//! # Responsibility
//! - Hold before/after-destroy hooks registered for one model.
//! - Run them around a caller-supplied destroy body.
//!
//! # Invariants
//! - Hooks run in registration order.
//! - A failing before hook halts the chain; the body and after hooks are
//!   skipped.
//! - After hooks only run when the body succeeded.

use crate::model::record::{Model, Record};
use crate::repo::record_repo::{RepoError, RepoResult};
use log::{debug, warn};

/// Hook signature. `Err` carries a human-readable halt reason.
pub type DestroyHook<M> = Box<dyn Fn(&Record<M>) -> Result<(), String>>;

/// Registered destroy hooks for model `M`.
pub struct Callbacks<M> {
    before_destroy: Vec<DestroyHook<M>>,
    after_destroy: Vec<DestroyHook<M>>,
}

impl<M> Default for Callbacks<M> {
    fn default() -> Self {
        Self {
            before_destroy: Vec::new(),
            after_destroy: Vec::new(),
        }
    }
}

impl<M: Model> Callbacks<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before_destroy<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&Record<M>) -> Result<(), String> + 'static,
    {
        self.before_destroy.push(Box::new(hook));
        self
    }

    pub fn after_destroy<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&Record<M>) -> Result<(), String> + 'static,
    {
        self.after_destroy.push(Box::new(hook));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.before_destroy.is_empty() && self.after_destroy.is_empty()
    }

    /// Runs `before -> body -> after` for one record.
    pub fn run_destroy<F>(&self, record: &mut Record<M>, body: F) -> RepoResult<()>
    where
        F: FnOnce(&mut Record<M>) -> RepoResult<()>,
    {
        for hook in &self.before_destroy {
            if let Err(reason) = hook(&*record) {
                warn!(
                    "event=destroy_callback module=repo status=halted table={} id={}",
                    M::TABLE,
                    record.id()
                );
                return Err(RepoError::CallbackHalted {
                    table: M::TABLE,
                    reason,
                });
            }
        }

        body(record)?;

        for hook in &self.after_destroy {
            hook(&*record).map_err(|reason| RepoError::CallbackHalted {
                table: M::TABLE,
                reason,
            })?;
        }

        debug!(
            "event=destroy_callback module=repo status=ok table={} before={} after={}",
            M::TABLE,
            self.before_destroy.len(),
            self.after_destroy.len()
        );
        Ok(())
    }
}
