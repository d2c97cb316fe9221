use std::sync::Arc;

use async_trait::async_trait;
use cqrs_es::{
    persist::{PersistenceError, ViewContext, ViewRepository},
    Aggregate, EventEnvelope, View as CqrsView,
};
use serde::{Deserialize, Serialize};

use crate::store::MemViewRepository;

use super::{MedicationOrder, AGGREGATE_TYPE};

#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct View {
    pub aggregate_type: String,
    pub command_id: String,
    pub id: String,
    pub order: MedicationOrder,
}

impl CqrsView<MedicationOrder> for View {
    fn update(&mut self, event: &EventEnvelope<MedicationOrder>) {
        self.id.clone_from(&event.aggregate_id);
        self.aggregate_type = AGGREGATE_TYPE.to_string();
        self.command_id = event
            .metadata
            .get("command_id")
            .unwrap_or(&"".to_string())
            .to_string();
        self.order.apply(event.payload.clone());
    }
}

pub type OrderViewRepository = MemViewRepository<View, MedicationOrder>;

/// A resident's orders, soft-deleted ones excluded unless asked for,
/// oldest first.
pub fn list_by_resident(
    repo: &OrderViewRepository,
    resident_id: &str,
    include_deleted: bool,
) -> Vec<MedicationOrder> {
    let mut orders: Vec<MedicationOrder> = repo
        .all()
        .into_iter()
        .map(|view| view.order)
        .filter(|order| order.resident_id == resident_id)
        .filter(|order| include_deleted || order.deleted_at.is_none())
        .collect();
    orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    orders
}

pub struct Query {
    repo: Arc<OrderViewRepository>,
}

impl Query {
    pub fn new(repo: Arc<OrderViewRepository>) -> Self {
        Self { repo }
    }

    async fn update(
        &self,
        order_id: &str,
        events: &[EventEnvelope<MedicationOrder>],
    ) -> Result<(), PersistenceError> {
        let (mut view, view_context) = match self.repo.load_with_context(order_id).await? {
            None => {
                let view_context = ViewContext::new(order_id.to_string(), 0);
                (Default::default(), view_context)
            }
            Some((view, context)) => (view, context),
        };

        for event in events {
            view.update(event);
        }

        self.repo.update_view(view, view_context).await
    }
}

#[async_trait]
impl cqrs_es::Query<MedicationOrder> for Query {
    async fn dispatch(&self, order_id: &str, events: &[EventEnvelope<MedicationOrder>]) {
        if let Err(err) = self.update(order_id, events).await {
            tracing::error!("order view update failed for {}: {}", order_id, err);
        }
    }
}
