//! In-memory [`ViewRepository`] backing the read models.
//!
//! Keeps the view plus its version under one lock; `update_view`
//! bumps the version it was handed, which is all the optimistic context
//! the in-process store needs.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use cqrs_es::persist::{PersistenceError, ViewContext, ViewRepository};
use cqrs_es::{Aggregate, View};

pub struct MemViewRepository<V, A> {
    views: RwLock<HashMap<String, (V, i64)>>,
    _phantom: PhantomData<A>,
}

impl<V, A> Default for MemViewRepository<V, A> {
    fn default() -> Self {
        Self {
            views: RwLock::new(HashMap::new()),
            _phantom: PhantomData,
        }
    }
}

impl<V, A> MemViewRepository<V, A>
where
    V: View<A> + Clone,
    A: Aggregate,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored view, for list-style reads.
    pub fn all(&self) -> Vec<V> {
        let views = self.views.read().unwrap_or_else(PoisonError::into_inner);
        views.values().map(|(view, _)| view.clone()).collect()
    }
}

#[async_trait]
impl<V, A> ViewRepository<V, A> for MemViewRepository<V, A>
where
    V: View<A> + Clone,
    A: Aggregate,
{
    async fn load(&self, view_id: &str) -> Result<Option<V>, PersistenceError> {
        let views = self.views.read().unwrap_or_else(PoisonError::into_inner);
        Ok(views.get(view_id).map(|(view, _)| view.clone()))
    }

    async fn load_with_context(
        &self,
        view_id: &str,
    ) -> Result<Option<(V, ViewContext)>, PersistenceError> {
        let views = self.views.read().unwrap_or_else(PoisonError::into_inner);
        Ok(views.get(view_id).map(|(view, version)| {
            (
                view.clone(),
                ViewContext::new(view_id.to_string(), *version),
            )
        }))
    }

    async fn update_view(&self, view: V, context: ViewContext) -> Result<(), PersistenceError> {
        let mut views = self.views.write().unwrap_or_else(PoisonError::into_inner);
        views.insert(context.view_instance_id, (view, context.version + 1));
        Ok(())
    }
}
