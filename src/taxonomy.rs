//! Request-type taxonomy — the four static tables the pipeline decides against.
//!
//! - request-type vocabulary (classification candidates, in order)
//! - sub-type vocabulary per request type
//! - field list per request type (drives extraction)
//! - routing table per request type
//!
//! The tables are loaded once and validated for mutual consistency before any
//! message is processed.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Team assigned when a route cannot be resolved.
pub const UNASSIGNED_TEAM: &str = "Unassigned";

/// Closed vocabulary of extractable field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Amount,
    ExpirationDate,
    DealName,
    FeeType,
    Currency,
    Date,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amount => "amount",
            Self::ExpirationDate => "expiration_date",
            Self::DealName => "deal_name",
            Self::FeeType => "fee_type",
            Self::Currency => "currency",
            Self::Date => "date",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a request type is routed.
///
/// In JSON a plain string is a direct team, an object maps sub-type to team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RouteTarget {
    /// Fixed team regardless of sub-type.
    Team(String),
    /// Team chosen by the classified sub-type.
    BySubType(BTreeMap<String, String>),
}

/// The four configuration tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Taxonomy {
    pub request_types: Vec<String>,
    #[serde(default)]
    pub sub_types: BTreeMap<String, Vec<String>>,
    pub fields: BTreeMap<String, Vec<FieldKind>>,
    pub routes: BTreeMap<String, RouteTarget>,
}

impl Taxonomy {
    /// Built-in loan-servicing taxonomy.
    pub fn builtin() -> Self {
        use FieldKind::*;

        let request_types = [
            "Adjustment",
            "AU Transfer",
            "Closing Notice",
            "Commitment Change",
            "Fee Payment",
            "Money Movement - Inbound",
            "Money Movement - Outbound",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let sub_types = vec![
            ("Adjustment", vec![]),
            ("AU Transfer", vec![]),
            (
                "Closing Notice",
                vec!["Reallocation Fees", "Amendment Fees", "Reallocation Principal"],
            ),
            ("Commitment Change", vec!["Cashless Roll", "Decrease", "Increase"]),
            ("Fee Payment", vec!["Ongoing Fee", "Letter of Credit Fee"]),
            (
                "Money Movement - Inbound",
                vec![
                    "Principal",
                    "Interest",
                    "Principal + Interest",
                    "Principal + Interest + Fee",
                ],
            ),
            ("Money Movement - Outbound", vec!["Timebound", "Foreign Currency"]),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.into_iter().map(String::from).collect()))
        .collect();

        let fields = vec![
            ("Adjustment", vec![Amount, ExpirationDate]),
            ("AU Transfer", vec![DealName, Amount]),
            ("Closing Notice", vec![DealName, Amount, Date]),
            ("Commitment Change", vec![Amount, Date]),
            ("Fee Payment", vec![Amount, FeeType]),
            ("Money Movement - Inbound", vec![Amount, Currency]),
            ("Money Movement - Outbound", vec![Amount, Currency]),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let by_sub = |pairs: &[(&str, &str)]| {
            RouteTarget::BySubType(
                pairs
                    .iter()
                    .map(|(s, t)| (s.to_string(), t.to_string()))
                    .collect(),
            )
        };

        let routes = vec![
            ("Adjustment", RouteTarget::Team("Team A".into())),
            ("AU Transfer", RouteTarget::Team("Team B".into())),
            (
                "Closing Notice",
                by_sub(&[
                    ("Reallocation Fees", "Team C"),
                    ("Amendment Fees", "Team D"),
                    ("Reallocation Principal", "Team E"),
                ]),
            ),
            (
                "Commitment Change",
                by_sub(&[
                    ("Cashless Roll", "Team F"),
                    ("Decrease", "Team G"),
                    ("Increase", "Team H"),
                ]),
            ),
            (
                "Fee Payment",
                by_sub(&[("Ongoing Fee", "Team I"), ("Letter of Credit Fee", "Team J")]),
            ),
            (
                "Money Movement - Inbound",
                by_sub(&[
                    ("Principal", "Team K"),
                    ("Interest", "Team L"),
                    ("Principal + Interest", "Team M"),
                    ("Principal + Interest + Fee", "Team N"),
                ]),
            ),
            (
                "Money Movement - Outbound",
                by_sub(&[("Timebound", "Team O"), ("Foreign Currency", "Team P")]),
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            request_types,
            sub_types,
            fields,
            routes,
        }
    }

    /// Parse and validate a taxonomy from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let taxonomy: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    /// Load and validate a taxonomy file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Sub-type vocabulary for a request type (empty when it has none).
    pub fn sub_types_for(&self, request_type: &str) -> &[String] {
        self.sub_types
            .get(request_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Configured field list for a request type (empty for unknown types).
    pub fn fields_for(&self, request_type: &str) -> &[FieldKind] {
        self.fields
            .get(request_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn route_for(&self, request_type: &str) -> Option<&RouteTarget> {
        self.routes.get(request_type)
    }

    /// Check that the four tables agree with each other.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_types.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "request_types".into(),
                message: "at least one request type is required".into(),
            });
        }

        let mut known = BTreeSet::new();
        for rt in &self.request_types {
            if !known.insert(rt.as_str()) {
                return Err(inconsistent(rt, "listed more than once"));
            }
        }

        for (table, keys) in [
            ("sub_types", self.sub_types.keys().collect::<Vec<_>>()),
            ("fields", self.fields.keys().collect()),
            ("routes", self.routes.keys().collect()),
        ] {
            if let Some(unknown) = keys.into_iter().find(|k| !known.contains(k.as_str())) {
                return Err(inconsistent(
                    unknown,
                    &format!("appears in {table} but not in request_types"),
                ));
            }
        }

        for rt in &self.request_types {
            let fields = self
                .fields
                .get(rt)
                .ok_or_else(|| inconsistent(rt, "has no field list"))?;
            let unique: BTreeSet<_> = fields.iter().collect();
            if unique.len() != fields.len() {
                return Err(inconsistent(rt, "field list contains duplicates"));
            }

            let subs = self.sub_types_for(rt);
            let sub_set: BTreeSet<&str> = subs.iter().map(String::as_str).collect();
            if sub_set.len() != subs.len() {
                return Err(inconsistent(rt, "sub-type vocabulary contains duplicates"));
            }

            match self.routes.get(rt) {
                None => return Err(inconsistent(rt, "has no route")),
                Some(RouteTarget::Team(_)) if !subs.is_empty() => {
                    return Err(inconsistent(
                        rt,
                        "has sub-types but routes to a single team",
                    ));
                }
                Some(RouteTarget::BySubType(_)) if subs.is_empty() => {
                    return Err(inconsistent(
                        rt,
                        "routes by sub-type but has no sub-type vocabulary",
                    ));
                }
                Some(RouteTarget::BySubType(map)) => {
                    let route_set: BTreeSet<&str> = map.keys().map(String::as_str).collect();
                    if route_set != sub_set {
                        return Err(inconsistent(
                            rt,
                            "routing sub-types differ from the sub-type vocabulary",
                        ));
                    }
                }
                Some(RouteTarget::Team(_)) => {}
            }
        }

        Ok(())
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::builtin()
    }
}

fn inconsistent(request_type: &str, reason: &str) -> ConfigError {
    ConfigError::Inconsistent {
        request_type: request_type.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_is_consistent() {
        let taxonomy = Taxonomy::builtin();
        assert!(taxonomy.validate().is_ok());
        assert_eq!(taxonomy.request_types.len(), 7);
    }

    #[test]
    fn builtin_direct_types_have_no_sub_types() {
        let taxonomy = Taxonomy::builtin();
        assert!(taxonomy.sub_types_for("Adjustment").is_empty());
        assert!(taxonomy.sub_types_for("AU Transfer").is_empty());
        assert_eq!(taxonomy.sub_types_for("Fee Payment").len(), 2);
    }

    #[test]
    fn fields_for_unknown_type_is_empty() {
        let taxonomy = Taxonomy::builtin();
        assert!(taxonomy.fields_for("Unknown").is_empty());
        assert_eq!(
            taxonomy.fields_for("Fee Payment"),
            &[FieldKind::Amount, FieldKind::FeeType]
        );
    }

    #[test]
    fn from_json_accepts_both_route_forms() {
        let json = r#"{
            "request_types": ["Adjustment", "Fee Payment"],
            "sub_types": {"Fee Payment": ["Ongoing Fee"]},
            "fields": {"Adjustment": ["amount"], "Fee Payment": ["amount", "fee_type"]},
            "routes": {
                "Adjustment": "Team A",
                "Fee Payment": {"Ongoing Fee": "Team I"}
            }
        }"#;
        let taxonomy = Taxonomy::from_json(json).unwrap();
        assert_eq!(
            taxonomy.route_for("Adjustment"),
            Some(&RouteTarget::Team("Team A".into()))
        );
        assert!(matches!(
            taxonomy.route_for("Fee Payment"),
            Some(RouteTarget::BySubType(_))
        ));
    }

    #[test]
    fn rejects_unknown_field_name() {
        let json = r#"{
            "request_types": ["Adjustment"],
            "fields": {"Adjustment": ["iban"]},
            "routes": {"Adjustment": "Team A"}
        }"#;
        assert!(matches!(
            Taxonomy::from_json(json),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn rejects_route_sub_types_mismatch() {
        let mut taxonomy = Taxonomy::builtin();
        taxonomy.routes.insert(
            "Fee Payment".into(),
            RouteTarget::BySubType(
                [("Ongoing Fee".to_string(), "Team I".to_string())]
                    .into_iter()
                    .collect(),
            ),
        );
        let err = taxonomy.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Inconsistent { ref request_type, .. } if request_type == "Fee Payment"));
    }

    #[test]
    fn rejects_direct_route_for_type_with_sub_types() {
        let mut taxonomy = Taxonomy::builtin();
        taxonomy
            .routes
            .insert("Closing Notice".into(), RouteTarget::Team("Team C".into()));
        assert!(matches!(
            taxonomy.validate(),
            Err(ConfigError::Inconsistent { .. })
        ));
    }

    #[test]
    fn rejects_table_entry_for_unknown_type() {
        let mut taxonomy = Taxonomy::builtin();
        taxonomy
            .fields
            .insert("Wire Recall".into(), vec![FieldKind::Amount]);
        let err = taxonomy.validate().unwrap_err();
        assert!(err.to_string().contains("Wire Recall"));
    }

    #[test]
    fn rejects_missing_field_list() {
        let mut taxonomy = Taxonomy::builtin();
        taxonomy.fields.remove("Adjustment");
        assert!(taxonomy.validate().is_err());
    }

    #[test]
    fn field_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FieldKind::ExpirationDate).unwrap();
        assert_eq!(json, "\"expiration_date\"");
        assert_eq!(FieldKind::DealName.to_string(), "deal_name");
    }
}
