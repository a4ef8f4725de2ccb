//! Authentication payload attached to every request.
//!
//! [`AuthenticationData`] is produced upstream (after the identity has been
//! verified) and carries identity, tenancy and authorization fields. Every
//! field is optional; absent fields project to absence or `false`.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// A list of string identifiers read leniently from the payload.
///
/// A non-array value is kept as [`StringList::Malformed`] and grants nothing.
/// Non-string items inside an array are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringList {
    /// Well-formed list of identifiers.
    Items(Vec<String>),
    /// The payload carried something other than an array.
    Malformed,
}

impl StringList {
    /// Returns the identifiers, or `None` if the value was malformed.
    #[must_use]
    pub fn as_slice(&self) -> Option<&[String]> {
        match self {
            Self::Items(items) => Some(items),
            Self::Malformed => None,
        }
    }

    /// Membership test. Always `false` for malformed lists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.as_slice()
            .is_some_and(|items| items.iter().any(|item| item == id))
    }

    /// `true` for an empty or malformed list.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_none_or(<[String]>::is_empty)
    }
}

impl From<Vec<String>> for StringList {
    fn from(items: Vec<String>) -> Self {
        Self::Items(items)
    }
}

impl From<Vec<&str>> for StringList {
    fn from(items: Vec<&str>) -> Self {
        Self::Items(items.into_iter().map(str::to_string).collect())
    }
}

impl Serialize for StringList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Items(items) => items.serialize(serializer),
            Self::Malformed => serializer.serialize_unit(),
        }
    }
}

impl<'de> Deserialize<'de> for StringList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(match raw {
            serde_json::Value::Array(items) => Self::Items(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        serde_json::Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => Self::Malformed,
        })
    }
}

/// Verified authentication payload for a single request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthenticationData {
    pub user_id: Option<String>,
    pub user_is_dev: Option<bool>,
    pub client_id: Option<String>,
    /// Tenant key used to resolve the client record.
    pub client_code: Option<String>,
    pub profile_id: Option<String>,
    /// Set when the caller is a service rather than a user.
    pub service_name: Option<String>,
    pub permissions: Option<StringList>,
    pub locations: Option<StringList>,
    pub has_access_to_all_locations: Option<bool>,
    pub warehouses_ids: Option<StringList>,
}

impl AuthenticationData {
    /// Parses a payload from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not a JSON object with the expected field types.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_all_absent() {
        let auth = AuthenticationData::from_json("{}").unwrap();
        assert_eq!(auth, AuthenticationData::default());
    }

    #[test]
    fn camel_case_fields_are_recognized() {
        let auth = AuthenticationData::from_json(
            r#"{
                "userId": "u1",
                "userIsDev": true,
                "clientId": "c1",
                "clientCode": "acme",
                "profileId": "p1",
                "serviceName": "catalog",
                "permissions": ["catalog:product:read"],
                "locations": ["loc-1", "loc-2"],
                "hasAccessToAllLocations": false,
                "warehousesIds": ["wh-1"]
            }"#,
        )
        .unwrap();

        assert_eq!(auth.user_id.as_deref(), Some("u1"));
        assert_eq!(auth.user_is_dev, Some(true));
        assert_eq!(auth.client_id.as_deref(), Some("c1"));
        assert_eq!(auth.client_code.as_deref(), Some("acme"));
        assert_eq!(auth.profile_id.as_deref(), Some("p1"));
        assert_eq!(auth.service_name.as_deref(), Some("catalog"));
        assert_eq!(
            auth.permissions,
            Some(StringList::from(vec!["catalog:product:read"]))
        );
        assert_eq!(auth.locations, Some(StringList::from(vec!["loc-1", "loc-2"])));
        assert_eq!(auth.has_access_to_all_locations, Some(false));
        assert_eq!(auth.warehouses_ids, Some(StringList::from(vec!["wh-1"])));
    }

    #[test]
    fn non_array_lists_are_malformed() {
        let auth =
            AuthenticationData::from_json(r#"{"locations": "loc-1", "permissions": {"a": 1}}"#)
                .unwrap();
        assert_eq!(auth.locations, Some(StringList::Malformed));
        assert_eq!(auth.permissions, Some(StringList::Malformed));
        assert!(!auth.locations.unwrap().contains("loc-1"));
    }

    #[test]
    fn null_list_is_absent() {
        let auth = AuthenticationData::from_json(r#"{"locations": null}"#).unwrap();
        assert!(auth.locations.is_none());
    }

    #[test]
    fn non_string_items_are_dropped() {
        let auth = AuthenticationData::from_json(r#"{"locations": ["a", 1, null, "b"]}"#).unwrap();
        assert_eq!(auth.locations, Some(StringList::from(vec!["a", "b"])));
    }

    #[test]
    fn string_list_emptiness() {
        assert!(StringList::Items(Vec::new()).is_empty());
        assert!(StringList::Malformed.is_empty());
        assert!(!StringList::from(vec!["x"]).is_empty());
    }
}
