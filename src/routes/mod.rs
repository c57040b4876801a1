//! Route registry — canonical, centrally queryable route metadata.
//!
//! Domains are the authors of their route definitions; the registry only
//! tracks them so any subsystem can discover who serves what. Routes are
//! contributed when a domain registers a capability or SOA API with
//! route-bearing contracts, and removed when the owning service
//! deregisters.

mod registry;

pub use registry::{HttpMethod, RouteEntry, RouteFilter, RouteRegistry};
