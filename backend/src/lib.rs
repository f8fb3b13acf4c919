//! Purchase queue backend library.
//!
//! Records who bought what and when, and ranks users by how long it has been
//! since their last purchase to decide who buys next.
//!
//! Layout follows a hexagonal split: [`domain`] holds entities, the queue
//! ranking engine and ports; [`inbound`] adapts HTTP requests onto driving
//! ports; [`outbound`] implements driven ports on PostgreSQL.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
