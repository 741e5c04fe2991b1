pub mod query;
pub use query::{Embed, Query, Table};
pub mod gateway;
pub use gateway::{DataGateway, GatewayError};
pub mod rest;
pub use rest::RestGateway;
pub mod memory;
pub use memory::{MemoryGateway, ReferentialPolicy};
pub mod activity_log;
pub use activity_log::{ActivityLog, ActivityOutcome};
pub mod repository;
pub use repository::{TableRepository, Written};
