// src/test_support.rs

use std::sync::Arc;

use crate::db::{ActivityLog, DataGateway, MemoryGateway, ReferentialPolicy};
use crate::models::crm::{CustomerSource, NewCustomer};

pub fn memory() -> Arc<MemoryGateway> {
    Arc::new(MemoryGateway::new(ReferentialPolicy::Cascade))
}

pub fn wire(memory: &Arc<MemoryGateway>) -> (Arc<dyn DataGateway>, ActivityLog) {
    let gateway: Arc<dyn DataGateway> = memory.clone();
    let log = ActivityLog::new(gateway.clone());
    (gateway, log)
}

pub fn new_customer(name: &str) -> NewCustomer {
    NewCustomer {
        name: name.to_string(),
        phone: "0500000000".to_string(),
        email: None,
        source: CustomerSource::Instagram,
        city: Some("Riyadh".to_string()),
        country: None,
        business_type: None,
        status: None,
        notes: None,
        assigned_to: None,
    }
}
