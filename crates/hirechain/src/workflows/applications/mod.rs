//! Job applications: the status lifecycle, the queryable store, and the service and HTTP
//! surface that drive them.

pub mod domain;
pub mod lifecycle;
mod locks;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{
    Actor, ActorRole, ApplicationId, ApplicationRecord, ApplicationStatus, CompanyAction,
    CompanyDecision, JobSnapshot, ProofDocument, ProofUpload,
};
pub use lifecycle::{
    Lifecycle, LifecycleError, LifecycleEvent, ProofPolicy, TransitionKind, TRANSITIONS,
};
pub use locks::KeyedLocks;
pub use router::{application_router, ACTOR_ID_HEADER, ACTOR_ROLE_HEADER};
pub use service::{ApplicationService, ApplicationServiceError};
pub use store::{
    ApplicationQuery, ApplicationSort, ApplicationStats, ApplicationStore,
    InMemoryApplicationStore, StoreError,
};
