//! Router — resolves (request type, sub-type) to a responsible team.
//!
//! Pure lookup over the routing table. Unresolvable routes fall back to
//! `UNASSIGNED_TEAM`; routing never fails.

use std::sync::Arc;

use tracing::warn;

use crate::taxonomy::{RouteTarget, Taxonomy, UNASSIGNED_TEAM};

pub struct Router {
    taxonomy: Arc<Taxonomy>,
}

impl Router {
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self { taxonomy }
    }

    /// Team for a request type and optional sub-type.
    ///
    /// - direct route → that team, whatever the sub-type
    /// - by-sub-type route → the sub-type's team, `Unassigned` if the sub-type
    ///   is absent or unknown
    /// - unknown request type → `Unassigned`
    pub fn route(&self, request_type: &str, sub_request_type: Option<&str>) -> String {
        match self.taxonomy.route_for(request_type) {
            Some(RouteTarget::Team(team)) => team.clone(),
            Some(RouteTarget::BySubType(teams)) => sub_request_type
                .and_then(|sub| teams.get(sub))
                .cloned()
                .unwrap_or_else(|| {
                    warn!(
                        request_type,
                        sub_request_type = sub_request_type.unwrap_or("none"),
                        "No team for sub-type, routing to {UNASSIGNED_TEAM}"
                    );
                    UNASSIGNED_TEAM.to_string()
                }),
            None => {
                warn!(request_type, "Unknown request type, routing to {UNASSIGNED_TEAM}");
                UNASSIGNED_TEAM.to_string()
            }
        }
    }
}
