use std::sync::Arc;

use cqrs_es::{mem_store::MemStore, CqrsFramework};

use super::{MedicationOrder, Query, Services, View};
use crate::store::MemViewRepository;

pub type OrderCqrs = CqrsFramework<MedicationOrder, MemStore<MedicationOrder>>;

pub fn init(
    repo: Arc<MemViewRepository<View, MedicationOrder>>,
    services: Services,
) -> Arc<OrderCqrs> {
    let query = Box::new(Query::new(repo));

    Arc::new(CqrsFramework::new(
        MemStore::default(),
        vec![query],
        services,
    ))
}

pub fn init_repo() -> Arc<MemViewRepository<View, MedicationOrder>> {
    Arc::new(MemViewRepository::new())
}
