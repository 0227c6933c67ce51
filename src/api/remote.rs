//! Purpose: HTTP/JSON row-store client for a gateway or emulator endpoint.
//! Exports: `RemoteClient`, `RemoteStore`.
//! Role: Network-backed `RowStore`; one blocking request per shell command.
//! Invariants: Paths are `/v1/projects/<p>/instances/<i>/tables[/<t>/rows/<key>|/<t>/rows:read]`.
//! Invariants: Cell versions arrive as RFC3339 and are shifted to the configured offset.
//! Invariants: Remote error envelopes keep their kind; bare statuses map by code.
#![allow(clippy::result_large_err)]

use std::borrow::Cow;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::UtcOffset;
use url::Url;

use super::{RowStore, StoreResult, parse_version};
use crate::core::error::{Error, ErrorKind};
use crate::core::query::{ReadOption, RowRange};
use crate::core::row::{Column, ResultSet, Row, zero_version};

/// Connection settings shared by every store opened from this client.
#[derive(Clone)]
pub struct RemoteClient {
    base_url: Url,
    token: Option<String>,
    agent: ureq::Agent,
}

/// A `RemoteClient` scoped to one project and instance.
#[derive(Clone)]
pub struct RemoteStore {
    client: RemoteClient,
    project: String,
    instance: String,
    offset: UtcOffset,
}

#[derive(Deserialize)]
struct TablesEnvelope {
    tables: Vec<String>,
}

#[derive(Deserialize)]
struct ResultSetEnvelope {
    #[serde(default)]
    table: Option<String>,
    #[serde(default)]
    rows: Vec<RemoteRow>,
}

#[derive(Deserialize)]
struct RemoteRow {
    key: String,
    #[serde(default)]
    columns: Vec<RemoteColumn>,
}

#[derive(Deserialize)]
struct RemoteColumn {
    family: String,
    qualifier: String,
    #[serde(default)]
    value: Vec<u8>,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: RemoteError,
}

#[derive(Deserialize)]
struct RemoteError {
    kind: String,
    message: Option<String>,
    hint: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RangeRequest<'a> {
    Infinite,
    Prefix {
        prefix: Cow<'a, str>,
    },
    Range {
        #[serde(skip_serializing_if = "Option::is_none")]
        start: Option<Cow<'a, str>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        end: Option<Cow<'a, str>>,
    },
}

#[derive(Debug, Serialize, PartialEq)]
struct ReadRowsRequest<'a> {
    range: RangeRequest<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    row_key_regex: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    latest_versions: Option<u32>,
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>) -> StoreResult<Self> {
        let base_url = endpoint_url(&base_url.into())?;
        let agent = ureq::AgentBuilder::new().build();
        Ok(Self {
            base_url,
            token: None,
            agent,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::AgentBuilder::new().timeout(timeout).build();
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn instance(
        &self,
        project: impl Into<String>,
        instance: impl Into<String>,
    ) -> RemoteStore {
        RemoteStore {
            client: self.clone(),
            project: project.into(),
            instance: instance.into(),
            offset: UtcOffset::UTC,
        }
    }

    fn request_json<T, R>(&self, method: &str, url: &Url, body: &T) -> StoreResult<R>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        tracing::debug!(method, url = %url, "row store request");
        let request = self.request(method, url).set("Accept", "application/json");
        let response = if method == "GET" {
            request.call()
        } else {
            let payload = serde_json::to_string(body).map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("failed to encode request json")
                    .with_source(err)
            })?;
            request
                .set("Content-Type", "application/json")
                .send_string(&payload)
        };

        match response {
            Ok(resp) => decode_json(resp),
            Err(ureq::Error::Status(code, resp)) => Err(status_error(code, resp)),
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Io)
                .with_message(format!("request to {} failed", self.base_url))
                .with_source(err)),
        }
    }

    fn request(&self, method: &str, url: &Url) -> ureq::Request {
        let mut request = self.agent.request(method, url.as_str());
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }
        request
    }
}

impl RemoteStore {
    /// Offset that cell versions are converted to before rendering.
    pub fn with_offset(mut self, offset: UtcOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// `/v1/projects/<p>/instances/<i>/tables` followed by `rest`, each piece one escaped segment.
    fn tables_url(&self, rest: &[&str]) -> StoreResult<Url> {
        let mut url = self.client.base_url().clone();
        url.path_segments_mut()
            .map_err(|_| Error::new(ErrorKind::Usage).with_message("endpoint cannot carry a path"))?
            .clear()
            .extend([
                "v1",
                "projects",
                self.project.as_str(),
                "instances",
                self.instance.as_str(),
                "tables",
            ])
            .extend(rest);
        Ok(url)
    }

    fn result_set(&self, table: &str, envelope: ResultSetEnvelope) -> StoreResult<ResultSet> {
        let rows = envelope
            .rows
            .into_iter()
            .map(|row| row_from_remote(row, self.offset))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(ResultSet::new(
            envelope.table.unwrap_or_else(|| table.to_string()),
            rows,
        ))
    }
}

impl RowStore for RemoteStore {
    fn list_tables(&self) -> StoreResult<Vec<String>> {
        let url = self.tables_url(&[])?;
        let envelope: TablesEnvelope = self.client.request_json("GET", &url, &())?;
        Ok(envelope.tables)
    }

    fn get_row(&self, table: &str, key: &str) -> StoreResult<ResultSet> {
        let url = self.tables_url(&[table, "rows", key])?;
        let envelope: ResultSetEnvelope = self.client.request_json("GET", &url, &())?;
        self.result_set(table, envelope)
    }

    fn get_rows(
        &self,
        table: &str,
        range: &RowRange,
        options: &[ReadOption],
    ) -> StoreResult<ResultSet> {
        let url = self.tables_url(&[table, "rows:read"])?;
        let request = read_rows_request(range, options);
        let envelope: ResultSetEnvelope = self.client.request_json("POST", &url, &request)?;
        self.result_set(table, envelope)
    }
}

fn read_rows_request<'a>(range: &'a RowRange, options: &'a [ReadOption]) -> ReadRowsRequest<'a> {
    let range = match range {
        RowRange::Infinite => RangeRequest::Infinite,
        RowRange::Prefix(prefix) => RangeRequest::Prefix {
            prefix: String::from_utf8_lossy(prefix),
        },
        RowRange::Range { start, end } => RangeRequest::Range {
            start: start.as_deref().map(String::from_utf8_lossy),
            end: end.as_deref().map(String::from_utf8_lossy),
        },
    };
    let mut request = ReadRowsRequest {
        range,
        limit: None,
        row_key_regex: None,
        latest_versions: None,
    };
    for option in options {
        match option {
            ReadOption::LimitRows(rows) => request.limit = Some(*rows),
            ReadOption::RowKeyFilter(filter) => request.row_key_regex = Some(filter.pattern()),
            ReadOption::LatestVersions(versions) => request.latest_versions = Some(*versions),
        }
    }
    request
}

fn row_from_remote(row: RemoteRow, offset: UtcOffset) -> StoreResult<Row> {
    let columns = row
        .columns
        .into_iter()
        .map(|column| {
            let version = match column.version.as_deref() {
                Some(version) => parse_version(version, offset)?,
                None => zero_version(),
            };
            Ok(Column::new(column.family, column.qualifier, column.value).with_version(version))
        })
        .collect::<StoreResult<Vec<_>>>()?;
    Ok(Row::new(row.key, columns))
}

/// Accepts `http(s)://host[:port]` or a bare emulator-style `host:port`.
fn endpoint_url(raw: &str) -> StoreResult<Url> {
    let candidate = if raw.contains("://") {
        Cow::Borrowed(raw)
    } else {
        Cow::Owned(format!("http://{raw}"))
    };
    let mut url = Url::parse(&candidate).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("invalid endpoint {raw:?}"))
            .with_hint("Use http://host:port or host:port.")
            .with_source(err)
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("endpoint {raw:?} must use http or https")));
    }
    if !matches!(url.path(), "" | "/") {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("endpoint {raw:?} must not include a path")));
    }
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn decode_json<R>(response: ureq::Response) -> StoreResult<R>
where
    R: DeserializeOwned,
{
    let body = response.into_string().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read row store response")
            .with_source(err)
    })?;
    serde_json::from_str(&body).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("row store sent malformed json")
            .with_source(err)
    })
}

fn status_error(status: u16, response: ureq::Response) -> Error {
    let body = response.into_string().unwrap_or_default();
    error_from_body(status, &body)
}

// An envelope with an unrecognized kind still falls back to the status code.
fn error_from_body(status: u16, body: &str) -> Error {
    let Ok(ErrorEnvelope { error: remote }) = serde_json::from_str::<ErrorEnvelope>(body) else {
        return Error::new(kind_from_status(status))
            .with_message(format!("row store answered with status {status}"));
    };
    let kind = match remote.kind.as_str() {
        "Usage" => ErrorKind::Usage,
        "NotFound" => ErrorKind::NotFound,
        "Permission" => ErrorKind::Permission,
        "Io" => ErrorKind::Io,
        "Internal" => ErrorKind::Internal,
        _ => kind_from_status(status),
    };
    let mut err = Error::new(kind).with_message(
        remote
            .message
            .unwrap_or_else(|| format!("row store answered with status {status}")),
    );
    if let Some(hint) = remote.hint {
        err = err.with_hint(hint);
    }
    err
}

fn kind_from_status(status: u16) -> ErrorKind {
    match status {
        400 => ErrorKind::Usage,
        401 | 403 => ErrorKind::Permission,
        404 => ErrorKind::NotFound,
        500..=599 => ErrorKind::Internal,
        _ => ErrorKind::Io,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        RangeRequest, RemoteClient, ResultSetEnvelope, endpoint_url, error_from_body,
        kind_from_status, read_rows_request, row_from_remote,
    };
    use crate::core::error::ErrorKind;
    use crate::core::query::{ReadOption, RowKeyFilter, RowRange};
    use crate::core::row::zero_version;
    use serde_json::json;
    use time::macros::offset;

    #[test]
    fn endpoint_strips_trailing_slash_and_query() {
        let url = endpoint_url("http://localhost:8086?x=1").expect("url");
        assert_eq!(url.as_str(), "http://localhost:8086/");
    }

    #[test]
    fn bare_host_port_endpoint_defaults_to_http() {
        let url = endpoint_url("localhost:8086").expect("url");
        assert_eq!(url.as_str(), "http://localhost:8086/");
    }

    #[test]
    fn endpoint_rejects_paths_and_schemes() {
        let err = endpoint_url("http://localhost/v1").expect_err("path");
        assert_eq!(err.kind(), ErrorKind::Usage);
        let err = endpoint_url("ftp://localhost").expect_err("scheme");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn table_urls_escape_keys() {
        let store = RemoteClient::new("http://localhost:8086")
            .expect("client")
            .instance("test-project", "test-instance");
        let url = store.tables_url(&["articles", "rows", "1##1"]).expect("url");
        assert_eq!(
            url.as_str(),
            "http://localhost:8086/v1/projects/test-project/instances/test-instance/tables/articles/rows/1%23%231"
        );

        let url = store.tables_url(&["articles", "rows:read"]).expect("url");
        assert_eq!(
            url.path(),
            "/v1/projects/test-project/instances/test-instance/tables/articles/rows:read"
        );
    }

    #[test]
    fn read_request_carries_range_and_modifiers() {
        let range = RowRange::prefix("a");
        let options = [
            ReadOption::LatestVersions(1),
            ReadOption::RowKeyFilter(RowKeyFilter::new("^a").expect("regex")),
            ReadOption::LimitRows(5),
        ];
        let request = read_rows_request(&range, &options);
        assert_eq!(
            request.range,
            RangeRequest::Prefix {
                prefix: "a".into()
            }
        );
        assert_eq!(
            serde_json::to_value(&request).expect("json"),
            json!({
                "range": {"kind": "prefix", "prefix": "a"},
                "limit": 5,
                "row_key_regex": "^a",
                "latest_versions": 1
            })
        );
    }

    #[test]
    fn unbounded_read_request_omits_modifiers() {
        let request = read_rows_request(&RowRange::Infinite, &[]);
        assert_eq!(
            serde_json::to_value(&request).expect("json"),
            json!({"range": {"kind": "infinite"}})
        );
    }

    #[test]
    fn remote_rows_convert_versions_to_offset() {
        let envelope: ResultSetEnvelope = serde_json::from_value(json!({
            "rows": [{"key": "a", "columns": [
                {"family": "d", "qualifier": "d:row", "value": [97, 49],
                 "version": "2018-01-01T00:00:00Z"},
                {"family": "d", "qualifier": "d:raw", "value": [1]}
            ]}]
        }))
        .expect("envelope");
        let row = row_from_remote(envelope.rows.into_iter().next().expect("row"), offset!(+9))
            .expect("row");
        assert_eq!(row.columns[0].value, b"a1".to_vec());
        assert_eq!(row.columns[0].version.hour(), 9);
        assert_eq!(row.columns[1].version, zero_version());
    }

    #[test]
    fn error_envelope_keeps_kind_and_hint() {
        let err = error_from_body(
            404,
            r#"{"error":{"kind":"NotFound","message":"table missing","hint":"Run ls."}}"#,
        );
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "NotFound: table missing");
        assert_eq!(err.hint(), Some("Run ls."));
    }

    #[test]
    fn bare_status_maps_to_kind() {
        assert_eq!(kind_from_status(400), ErrorKind::Usage);
        assert_eq!(kind_from_status(403), ErrorKind::Permission);
        assert_eq!(kind_from_status(404), ErrorKind::NotFound);
        assert_eq!(kind_from_status(503), ErrorKind::Internal);
        assert_eq!(kind_from_status(302), ErrorKind::Io);
        assert_eq!(error_from_body(500, "oops").kind(), ErrorKind::Internal);
    }

    #[test]
    fn unknown_envelope_kind_falls_back_to_status() {
        let err = error_from_body(403, r#"{"error":{"kind":"Quota","message":"slow down"}}"#);
        assert_eq!(err.kind(), ErrorKind::Permission);
        assert_eq!(err.message(), Some("slow down"));
    }
}
