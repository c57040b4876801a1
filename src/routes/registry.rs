//! The route registry proper.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capability::DEFAULT_VERSION;
use crate::errors::RegistrationError;

/// HTTP method of a registered route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        };
        f.write_str(name)
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            other => Err(format!("unsupported HTTP method: {other}")),
        }
    }
}

/// A tracked route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteEntry {
    /// Generated unique id, stable across same-owner re-registration.
    pub route_id: String,
    /// Route path, e.g. "/api/v1/content-pillar/upload".
    pub path: String,
    pub method: HttpMethod,
    /// User-facing grouping within a realm, used for discovery.
    #[serde(default)]
    pub pillar: String,
    #[serde(default)]
    pub realm: String,
    /// The service that authored and serves this route.
    pub owning_service: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_route_version")]
    pub version: String,
    #[serde(default = "Utc::now")]
    pub registered_at: DateTime<Utc>,
}

fn default_route_version() -> String {
    DEFAULT_VERSION.to_string()
}

impl RouteEntry {
    /// Create an entry with a fresh route id. The pillar defaults to the
    /// segment after `/api/v1/` when the path carries one.
    pub fn new(
        path: impl Into<String>,
        method: HttpMethod,
        owning_service: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let pillar = derive_pillar(&path).unwrap_or_default();
        Self {
            route_id: Uuid::new_v4().to_string(),
            method,
            pillar,
            realm: String::new(),
            owning_service: owning_service.into(),
            description: String::new(),
            version: DEFAULT_VERSION.to_string(),
            registered_at: Utc::now(),
            path,
        }
    }
}

/// Derive the pillar grouping from a conventional platform path
/// (`/api/v1/{pillar}/...`).
pub(crate) fn derive_pillar(path: &str) -> Option<String> {
    path.strip_prefix("/api/v1/")
        .and_then(|rest| rest.split('/').next())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Filter for route discovery. Empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct RouteFilter {
    pub pillar: Option<String>,
    pub realm: Option<String>,
    pub service_name: Option<String>,
}

impl RouteFilter {
    fn matches(&self, entry: &RouteEntry) -> bool {
        self.pillar.as_deref().is_none_or(|p| entry.pillar == p)
            && self.realm.as_deref().is_none_or(|r| entry.realm == r)
            && self
                .service_name
                .as_deref()
                .is_none_or(|s| entry.owning_service == s)
    }
}

/// Central route registry, internally synchronized. Writes take a short
/// exclusive lock; reads copy matching entries out so discovery is never
/// starved by a burst of registrations.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: RwLock<HashMap<(String, HttpMethod), RouteEntry>>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route. Rejects with
    /// [`RegistrationError::ConflictingRoute`] when the (`path`,
    /// `method`) pair is already owned by a *different* service;
    /// re-registration by the same owner overwrites the metadata and
    /// reuses the original route id.
    pub fn register_route(&self, mut route: RouteEntry) -> Result<String, RegistrationError> {
        let key = (route.path.clone(), route.method);
        let mut routes = self.routes.write();
        if let Some(existing) = routes.get(&key) {
            if existing.owning_service != route.owning_service {
                return Err(RegistrationError::ConflictingRoute {
                    path: route.path,
                    method: route.method.to_string(),
                    owner: existing.owning_service.clone(),
                });
            }
            route.route_id = existing.route_id.clone();
            log::debug!(
                "route {} {} re-registered by {}",
                route.method,
                route.path,
                route.owning_service
            );
        } else {
            log::info!(
                "route {} {} registered by {}",
                route.method,
                route.path,
                route.owning_service
            );
        }
        let route_id = route.route_id.clone();
        routes.insert(key, route);
        Ok(route_id)
    }

    /// Discover routes matching the filter. Pure read; returns an empty
    /// list when nothing matches.
    pub fn discover_routes(&self, filter: &RouteFilter) -> Vec<RouteEntry> {
        let routes = self.routes.read();
        let mut matched: Vec<RouteEntry> = routes
            .values()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.path.cmp(&b.path));
        matched
    }

    /// Remove every route owned by `service_name`. Returns the number
    /// removed. Used during service shutdown/cleanup.
    pub fn deregister_routes_for_service(&self, service_name: &str) -> usize {
        let mut routes = self.routes.write();
        let before = routes.len();
        routes.retain(|_, entry| entry.owning_service != service_name);
        let removed = before - routes.len();
        if removed > 0 {
            log::info!("removed {removed} route(s) owned by {service_name}");
        }
        removed
    }

    /// Drop every tracked route. Used by registry shutdown.
    pub fn clear(&self) {
        self.routes.write().clear();
    }

    pub fn len(&self) -> usize {
        self.routes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.read().is_empty()
    }
}
