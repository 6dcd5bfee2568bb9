//! Per-type record operations.
//!
//! An [`SObject`] is bound to one sobject type ("Account", "Custom__c") and
//! turns each call into exactly one REST round trip. Nothing is cached:
//! `retrieve` always reflects what the service holds at call time.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use forcelink_sf_client::security::{soql, url};
use forcelink_sf_client::SalesforceClient;

use crate::describe::DescribeSObjectResult;
use crate::error::{Error, ErrorKind, Result, SalesforceError};
use crate::record::{json_type, Record};

/// Outcome of create, update, delete and upsert.
///
/// `id` is `None` for an upsert that updated an existing record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SaveResult {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<SalesforceError>,
}

impl SaveResult {
    fn saved(id: Option<String>) -> Self {
        Self {
            id,
            success: true,
            errors: Vec::new(),
        }
    }
}

/// Body of a `200`/`201` upsert response.
#[derive(Debug, Default, Deserialize)]
struct UpsertBody {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    created: Option<bool>,
    #[serde(default)]
    errors: Vec<SalesforceError>,
}

/// Handle for one sobject type.
///
/// Obtained from [`Connection::sobject`](crate::Connection::sobject); holds a
/// snapshot of the session taken at that point.
#[derive(Debug, Clone)]
pub struct SObject {
    client: Option<SalesforceClient>,
    name: String,
}

impl SObject {
    pub(crate) fn new(client: Option<SalesforceClient>, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
        }
    }

    /// The sobject type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create a record.
    ///
    /// Field errors reported by the service, and an unknown sobject type,
    /// come back as [`ErrorKind::Validation`].
    #[instrument(skip(self, record), fields(sobject = %self.name))]
    pub async fn create<T: Serialize + ?Sized>(&self, record: &T) -> Result<SaveResult> {
        let client = self.session()?;
        let name = self.checked_name()?;
        let body = record_body(record)?;

        let request = client
            .post(&client.rest_url(&format!("sobjects/{name}")))
            .json(&body)?;
        let response = client
            .execute(request)
            .await
            .map_err(|e| unknown_type_as_validation(e.into()))?;
        let result: SaveResult = response.json().await?;

        if !result.success {
            return Err(Error::new(ErrorKind::Validation {
                errors: result.errors,
            }));
        }
        debug!(id = ?result.id, "record created");
        Ok(result)
    }

    /// Fetch one record by id.
    ///
    /// An id that does not resolve, including one that is not a well-formed
    /// record id, fails with [`ErrorKind::NotFound`].
    #[instrument(skip(self), fields(sobject = %self.name))]
    pub async fn retrieve(&self, id: &str) -> Result<Record> {
        let client = self.session()?;
        let path = self.record_path(id)?;
        Ok(client.rest_get(&path).await?)
    }

    /// Update the record named by the `Id` member of `record`.
    ///
    /// Only the fields present are written.
    #[instrument(skip(self, record), fields(sobject = %self.name))]
    pub async fn update<T: Serialize + ?Sized>(&self, record: &T) -> Result<SaveResult> {
        let client = self.session()?;
        let mut body = record_body(record)?;

        let id = match body.remove("Id").or_else(|| body.remove("id")) {
            Some(Value::String(id)) if !id.is_empty() => id,
            _ => return Err(missing_argument("Id not specified in an update call", "Id")),
        };
        let path = self.record_path(&id)?;

        let request = client.patch(&client.rest_url(&path)).json(&body)?;
        client.execute(request).await?;

        debug!(id = %id, "record updated");
        Ok(SaveResult::saved(Some(id)))
    }

    /// Delete a record by id.
    #[instrument(skip(self), fields(sobject = %self.name))]
    pub async fn delete(&self, id: &str) -> Result<SaveResult> {
        let client = self.session()?;
        let path = self.record_path(id)?;

        client.execute(client.delete(&client.rest_url(&path))).await?;

        debug!(id = %id, "record deleted");
        Ok(SaveResult::saved(Some(id.to_string())))
    }

    /// Alias for [`delete`](Self::delete).
    pub async fn del(&self, id: &str) -> Result<SaveResult> {
        self.delete(id).await
    }

    /// Full metadata for this type, fields included.
    #[instrument(skip(self), fields(sobject = %self.name))]
    pub async fn describe(&self) -> Result<DescribeSObjectResult> {
        let client = self.session()?;
        let name = self.checked_name()?;
        Ok(client.rest_get(&format!("sobjects/{name}/describe")).await?)
    }

    /// Insert or update keyed on an external id field.
    ///
    /// The value of `external_id_field` is taken from `record`. The result
    /// carries an id when a record was created and none when an existing
    /// record was updated. When the value matches more than one record the
    /// call fails with [`ErrorKind::UpsertConflict`] listing the candidate
    /// ids in the order the service returned them.
    #[instrument(skip(self, record), fields(sobject = %self.name, external_id_field = %external_id_field))]
    pub async fn upsert<T: Serialize + ?Sized>(
        &self,
        record: &T,
        external_id_field: &str,
    ) -> Result<SaveResult> {
        let client = self.session()?;
        let name = self.checked_name()?;
        if !soql::is_safe_field_name(external_id_field) {
            return Err(Error::invalid_input(format!(
                "'{external_id_field}' is not a valid field name"
            )));
        }

        let mut body = record_body(record)?;
        let external_id = match body.remove(external_id_field) {
            Some(Value::String(s)) if !s.is_empty() => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Null | Value::String(_)) | None => {
                return Err(missing_argument(
                    &format!("{external_id_field} not specified in an upsert call"),
                    external_id_field,
                ))
            }
            Some(other) => {
                return Err(Error::invalid_input(format!(
                    "external id value must be a string or number, got {}",
                    json_type(&other)
                )))
            }
        };
        body.remove("Id");

        let path = format!(
            "sobjects/{name}/{external_id_field}/{}",
            url::encode_param(&external_id)
        );
        let request = client.patch(&client.rest_url(&path)).json(&body)?;
        let response = client.execute(request).await?;

        let status = response.status();
        let parsed: UpsertBody = response.json_opt().await?.unwrap_or_default();
        resolve_upsert(status, parsed)
    }

    fn session(&self) -> Result<&SalesforceClient> {
        self.client.as_ref().ok_or_else(Error::not_authenticated)
    }

    fn checked_name(&self) -> Result<&str> {
        if soql::is_safe_sobject_name(&self.name) {
            Ok(&self.name)
        } else {
            Err(Error::invalid_input(format!(
                "'{}' is not a valid sobject name",
                self.name
            )))
        }
    }

    fn record_path(&self, id: &str) -> Result<String> {
        let name = self.checked_name()?;
        url::sobject_path(name, id).ok_or_else(|| {
            Error::new(ErrorKind::NotFound(format!(
                "'{id}' is not a valid {name} record id"
            )))
        })
    }
}

/// Map the upsert response shape to a save result.
fn resolve_upsert(status: u16, body: UpsertBody) -> Result<SaveResult> {
    if body.success == Some(false) {
        return Err(Error::new(ErrorKind::Validation {
            errors: body.errors,
        }));
    }

    if status == 201 || body.created == Some(true) {
        let id = body.id.ok_or_else(|| {
            Error::new(ErrorKind::Transport(
                "upsert reported a created record without an id".to_string(),
            ))
        })?;
        debug!(id = %id, "upsert created record");
        return Ok(SaveResult::saved(Some(id)));
    }

    debug!(status, "upsert updated existing record");
    Ok(SaveResult::saved(None))
}

/// Serialize the caller's record into a request body, dropping `attributes`.
fn record_body<T: Serialize + ?Sized>(record: &T) -> Result<Map<String, Value>> {
    let value = serde_json::to_value(record).map_err(|e| {
        Error::with_source(
            ErrorKind::InvalidInput(format!("record could not be serialized: {e}")),
            e,
        )
    })?;

    match value {
        Value::Object(mut map) => {
            map.remove("attributes");
            Ok(map)
        }
        other => Err(Error::invalid_input(format!(
            "record must serialize to a JSON object, got {}",
            json_type(&other)
        ))),
    }
}

fn missing_argument(message: &str, field: &str) -> Error {
    Error::new(ErrorKind::Validation {
        errors: vec![SalesforceError {
            error_code: "MISSING_ARGUMENT".to_string(),
            message: message.to_string(),
            fields: vec![field.to_string()],
        }],
    })
}

/// Create against an unknown type path is a payload problem, not a lookup.
fn unknown_type_as_validation(err: Error) -> Error {
    let Error { kind, source } = err;
    match kind {
        ErrorKind::NotFound(message) => Error {
            kind: ErrorKind::Validation {
                errors: vec![SalesforceError {
                    error_code: "NOT_FOUND".to_string(),
                    message,
                    fields: Vec::new(),
                }],
            },
            source,
        },
        kind => Error { kind, source },
    }
}
