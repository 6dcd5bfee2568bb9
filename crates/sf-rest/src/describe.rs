//! Describe payloads.
//!
//! Only the members this client reads are typed; everything else the service
//! sends is ignored. Every member is optional on the wire.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `GET sobjects`: every sobject type visible to the session.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DescribeGlobalResult {
    pub encoding: String,
    /// Record limit for the collection endpoints.
    pub max_batch_size: u32,
    pub sobjects: Vec<SObjectBasicInfo>,
}

/// One `describeGlobal` entry. No field list: that takes a per-type
/// [`SObject::describe`](crate::SObject::describe).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SObjectBasicInfo {
    pub name: String,
    pub label: String,
    pub label_plural: Option<String>,
    /// Three-character id prefix, e.g. `001` for Account.
    pub key_prefix: Option<String>,
    pub custom: bool,
    pub queryable: bool,
    pub createable: bool,
    pub updateable: bool,
    pub deletable: bool,
    pub urls: HashMap<String, String>,
}

/// `GET sobjects/{name}/describe`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DescribeSObjectResult {
    pub name: String,
    pub label: String,
    pub label_plural: Option<String>,
    pub key_prefix: Option<String>,
    pub custom: bool,
    pub createable: bool,
    pub deletable: bool,
    pub queryable: bool,
    pub retrieveable: bool,
    pub updateable: bool,
    /// In the order the service lists them.
    pub fields: Vec<FieldDescribe>,
    pub urls: HashMap<String, String>,
}

impl DescribeSObjectResult {
    /// Field API names are case-insensitive.
    pub fn field(&self, name: &str) -> Option<&FieldDescribe> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Candidates for the `field` argument of an upsert.
    pub fn external_id_fields(&self) -> impl Iterator<Item = &FieldDescribe> {
        self.fields.iter().filter(|f| f.external_id)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldDescribe {
    pub name: String,
    pub label: String,
    /// `id`, `string`, `reference`, `picklist`, `double`, `datetime`, ...
    #[serde(rename = "type")]
    pub field_type: String,
    pub custom: bool,
    pub length: Option<i32>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
    pub createable: bool,
    pub updateable: bool,
    pub nillable: bool,
    pub defaulted_on_create: bool,
    pub unique: bool,
    pub external_id: bool,
    pub id_lookup: bool,
    pub calculated: bool,
    /// Target types of a `reference` field.
    pub reference_to: Vec<String>,
    pub relationship_name: Option<String>,
    pub picklist_values: Vec<PicklistValue>,
}

impl FieldDescribe {
    /// A create without this field fails with `REQUIRED_FIELD_MISSING`.
    pub fn is_required_on_create(&self) -> bool {
        self.createable && !self.nillable && !self.defaulted_on_create
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PicklistValue {
    pub value: String,
    pub label: Option<String>,
    pub active: bool,
    pub default_value: bool,
}
