use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::ApiError;
use crate::models::{
    AnnualReportRecord, ApiEnvelope, AttendanceRecord, MahasantriRecord, MentorRecord,
    NewAttendance, NewSubmission, SemesterTarget, SubmissionRecord,
};
use crate::session::Session;

const ERROR_BODY_LIMIT: usize = 200;

/// Typed client for the dashboard REST API. Every authenticated call takes
/// the caller's session explicitly.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ApiError::Transport {
                endpoint: base_url.to_string(),
                source,
            })?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ApiError> {
        let endpoint = self.endpoint("login");
        debug!(%endpoint, username, "logging in");
        let request = self
            .http
            .post(&endpoint)
            .json(&json!({ "username": username, "password": password }));
        self.send(endpoint, request).await
    }

    pub async fn logout(&self, session: &Session) -> Result<(), ApiError> {
        let endpoint = self.endpoint("logout");
        let request = self.http.post(&endpoint).bearer_auth(&session.token);
        let response = request.send().await.map_err(|source| ApiError::Transport {
            endpoint: endpoint.clone(),
            source,
        })?;
        let status = response.status().as_u16();
        let body = read_body(&endpoint, response).await?;
        decode_optional::<Value>(&endpoint, status, &body).map(|_| ())
    }

    pub async fn submissions(
        &self,
        session: &Session,
        mahasantri_id: Option<i64>,
    ) -> Result<Vec<SubmissionRecord>, ApiError> {
        self.get(session, "hafalan", &scope(mahasantri_id)).await
    }

    pub async fn attendance(
        &self,
        session: &Session,
        mahasantri_id: Option<i64>,
    ) -> Result<Vec<AttendanceRecord>, ApiError> {
        self.get(session, "absensi", &scope(mahasantri_id)).await
    }

    pub async fn mahasantri(&self, session: &Session) -> Result<Vec<MahasantriRecord>, ApiError> {
        self.get(session, "mahasantri", &[]).await
    }

    pub async fn mentors(&self, session: &Session) -> Result<Vec<MentorRecord>, ApiError> {
        self.get(session, "mentor", &[]).await
    }

    pub async fn targets(
        &self,
        session: &Session,
        mahasantri_id: i64,
    ) -> Result<Vec<SemesterTarget>, ApiError> {
        self.get(session, "target-semester", &scope(Some(mahasantri_id)))
            .await
    }

    pub async fn annual_report(
        &self,
        session: &Session,
        mahasantri_id: i64,
        tahun: i32,
    ) -> Result<AnnualReportRecord, ApiError> {
        let path = format!("laporan/{mahasantri_id}");
        self.get(session, &path, &[("tahun", tahun.to_string())])
            .await
    }

    pub async fn create_submission(
        &self,
        session: &Session,
        submission: &NewSubmission,
    ) -> Result<SubmissionRecord, ApiError> {
        self.post(session, "hafalan", submission).await
    }

    pub async fn create_attendance(
        &self,
        session: &Session,
        attendance: &NewAttendance,
    ) -> Result<AttendanceRecord, ApiError> {
        self.post(session, "absensi", attendance).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let endpoint = self.endpoint(path);
        debug!(%endpoint, "GET");
        let request = self
            .http
            .get(&endpoint)
            .bearer_auth(&session.token)
            .query(query);
        self.send(endpoint, request).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let endpoint = self.endpoint(path);
        debug!(%endpoint, "POST");
        let request = self
            .http
            .post(&endpoint)
            .bearer_auth(&session.token)
            .json(body);
        self.send(endpoint, request).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: String,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|source| ApiError::Transport {
            endpoint: endpoint.clone(),
            source,
        })?;
        let status = response.status().as_u16();
        let body = read_body(&endpoint, response).await?;
        decode_envelope(&endpoint, status, &body)
    }
}

async fn read_body(endpoint: &str, response: reqwest::Response) -> Result<Vec<u8>, ApiError> {
    response
        .bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(|source| ApiError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })
}

fn scope(mahasantri_id: Option<i64>) -> Vec<(&'static str, String)> {
    mahasantri_id
        .map(|id| vec![("mahasantri_id", id.to_string())])
        .unwrap_or_default()
}

/// Decode a `{ status, message, data }` body whose `data` must be present.
pub fn decode_envelope<T: DeserializeOwned>(
    endpoint: &str,
    status: u16,
    body: &[u8],
) -> Result<T, ApiError> {
    decode_optional(endpoint, status, body)?.ok_or_else(|| ApiError::Malformed {
        endpoint: endpoint.to_string(),
        details: "response has no data".to_string(),
    })
}

fn decode_optional<T: DeserializeOwned>(
    endpoint: &str,
    status: u16,
    body: &[u8],
) -> Result<Option<T>, ApiError> {
    if status == 401 {
        return Err(ApiError::Unauthorized {
            endpoint: endpoint.to_string(),
        });
    }

    if !(200..300).contains(&status) {
        let envelope = serde_json::from_slice::<ApiEnvelope<Value>>(body).ok();
        if let Some(message) = envelope.and_then(|envelope| envelope.message) {
            return Err(ApiError::Rejected {
                endpoint: endpoint.to_string(),
                message,
            });
        }
        warn!(endpoint, status, "API returned an error status");
        return Err(ApiError::Status {
            endpoint: endpoint.to_string(),
            status,
            body: truncate(&String::from_utf8_lossy(body), ERROR_BODY_LIMIT),
        });
    }

    let envelope: ApiEnvelope<T> =
        serde_json::from_slice(body).map_err(|err| ApiError::Malformed {
            endpoint: endpoint.to_string(),
            details: err.to_string(),
        })?;

    if !envelope.status {
        return Err(ApiError::Rejected {
            endpoint: endpoint.to_string(),
            message: envelope
                .message
                .unwrap_or_else(|| "no message given".to_string()),
        });
    }

    Ok(envelope.data)
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((index, _)) => format!("{}...", &text[..index]),
        None => text.to_string(),
    }
}
