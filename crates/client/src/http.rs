use std::time::Duration;

use chrono::NaiveDate;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use signoff_core::config::ApiConfig;
use signoff_core::domain::approval::ApprovalLevel;
use signoff_core::domain::logs::ExportFile;
use signoff_core::errors::ClientError;

/// Which of the two backend roots a request targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiBase {
    General,
    Monthly,
}

/// Shared connection to the back-office REST service: one pooled client,
/// two base URLs, bearer auth.
#[derive(Clone)]
pub struct ApiConnection {
    client: Client,
    base_url: String,
    monthly_base_url: String,
    token: SecretString,
}

impl ApiConnection {
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| ClientError::Network(error.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            monthly_base_url: config.monthly_base_url.trim_end_matches('/').to_owned(),
            token: config.token.clone(),
        })
    }

    fn url(&self, base: ApiBase, path: &str) -> String {
        let root = match base {
            ApiBase::General => &self.base_url,
            ApiBase::Monthly => &self.monthly_base_url,
        };
        format!("{root}/{}", path.trim_start_matches('/'))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(self.token.expose_secret())
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        base: ApiBase,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, ClientError> {
        debug!(path, "GET");
        let request = self.authorize(self.client.get(self.url(base, path))).query(query);
        decode_json(send(request).await?).await
    }

    pub(crate) async fn post_json<B, T>(
        &self,
        base: ApiBase,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(path, "POST");
        let request = self.authorize(self.client.post(self.url(base, path))).json(body);
        decode_json(send(request).await?).await
    }

    /// POST with no body; used by the approve/re-import style endpoints.
    pub(crate) async fn post_empty<T: DeserializeOwned>(
        &self,
        base: ApiBase,
        path: &str,
    ) -> Result<T, ClientError> {
        debug!(path, "POST");
        let request = self.authorize(self.client.post(self.url(base, path)));
        decode_json(send(request).await?).await
    }

    pub(crate) async fn put_json<B, T>(
        &self,
        base: ApiBase,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(path, "PUT");
        let request = self.authorize(self.client.put(self.url(base, path))).json(body);
        decode_json(send(request).await?).await
    }

    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        base: ApiBase,
        path: &str,
        form: Form,
    ) -> Result<T, ClientError> {
        debug!(path, "POST multipart");
        let request = self.authorize(self.client.post(self.url(base, path))).multipart(form);
        decode_json(send(request).await?).await
    }

    /// Downloads an opaque export blob, deriving the filename from the
    /// `content-disposition` header when present.
    pub(crate) async fn get_export(
        &self,
        base: ApiBase,
        path: &str,
        query: &[(String, String)],
        fallback_stem: &str,
    ) -> Result<ExportFile, ClientError> {
        debug!(path, "GET export");
        let request = self.authorize(self.client.get(self.url(base, path))).query(query);
        let response = send(request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_failure(status.as_u16(), &body));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_owned();
        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = response
            .bytes()
            .await
            .map_err(|error| ClientError::Network(error.to_string()))?
            .to_vec();

        let filename = export_filename(
            disposition.as_deref(),
            fallback_stem,
            chrono::Utc::now().date_naive(),
            &content_type,
        );
        Ok(ExportFile { filename, content_type, bytes })
    }
}

async fn send(request: RequestBuilder) -> Result<Response, ClientError> {
    request.send().await.map_err(|error| ClientError::Network(error.to_string()))
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return response.json().await.map_err(|error| ClientError::Decode(error.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    Err(error_from_failure(status.as_u16(), &body))
}

/// Maps a non-2xx response to the error taxonomy: 403 is an access-denied
/// view, a 400 whose message names a prior approval level is a
/// prerequisite failure, everything else carries the backend's `Messages`.
pub(crate) fn error_from_failure(status: u16, body: &str) -> ClientError {
    if status == 403 {
        return ClientError::AccessDenied;
    }

    let messages = parse_messages(body);
    if status == 400 {
        if let Some(level) = detect_prerequisite_level(&messages) {
            return ClientError::PrerequisiteNotMet { level };
        }
    }

    ClientError::api(status, messages)
}

/// Error bodies are expected as `{ "Messages": [...] }`; anything else
/// falls back to the raw body text.
fn parse_messages(body: &str) -> Vec<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(rename = "Messages")]
        messages: Vec<String>,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.messages,
        Err(_) => {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![trimmed.to_owned()]
            }
        }
    }
}

fn detect_prerequisite_level(messages: &[String]) -> Option<ApprovalLevel> {
    for message in messages {
        let lowered = message.to_ascii_lowercase();
        if !lowered.contains("approv") {
            continue;
        }
        for level in ApprovalLevel::ALL {
            let spelled = format!("level {}", level.number());
            if lowered.contains(&spelled) || lowered.contains(level.as_path_segment()) {
                return Some(level);
            }
        }
    }
    None
}

/// Pulls `filename="..."` (or the unquoted form) out of a
/// `content-disposition` header.
fn attachment_filename(disposition: &str) -> Option<String> {
    let (_, rest) = disposition.split_once("filename=")?;
    let rest = rest.trim();
    let name = if let Some(stripped) = rest.strip_prefix('"') {
        stripped.split('"').next()?
    } else {
        rest.split(';').next()?.trim()
    };
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_owned())
}

pub(crate) fn export_filename(
    disposition: Option<&str>,
    stem: &str,
    date: NaiveDate,
    content_type: &str,
) -> String {
    if let Some(name) = disposition.and_then(attachment_filename) {
        return name;
    }
    let extension = if content_type.contains("csv") { "csv" } else { "xlsx" };
    format!("{stem}-{date}.{extension}")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use signoff_core::domain::approval::ApprovalLevel;
    use signoff_core::errors::ClientError;

    use super::{error_from_failure, export_filename};

    #[test]
    fn forbidden_maps_to_access_denied() {
        assert_eq!(error_from_failure(403, ""), ClientError::AccessDenied);
        assert_eq!(
            error_from_failure(403, r#"{"Messages":["no access"]}"#),
            ClientError::AccessDenied
        );
    }

    #[test]
    fn bad_request_naming_a_prior_level_is_a_prerequisite_failure() {
        let error =
            error_from_failure(400, r#"{"Messages":["Level 1 must be approved first"]}"#);
        assert_eq!(error, ClientError::PrerequisiteNotMet { level: ApprovalLevel::L1 });
    }

    #[test]
    fn other_bad_requests_carry_the_backend_messages() {
        let error = error_from_failure(400, r#"{"Messages":["batch date is invalid"]}"#);
        assert_eq!(error, ClientError::api(400, vec!["batch date is invalid".to_owned()]));
    }

    #[test]
    fn unparseable_bodies_fall_back_to_raw_text() {
        let error = error_from_failure(502, "Bad Gateway");
        assert_eq!(error, ClientError::api(502, vec!["Bad Gateway".to_owned()]));

        let error = error_from_failure(500, "");
        assert_eq!(error, ClientError::api(500, Vec::new()));
    }

    #[test]
    fn export_filename_prefers_content_disposition() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 28).expect("valid date");
        let name = export_filename(
            Some(r#"attachment; filename="approval-logs-2026-02-27.xlsx""#),
            "approval-logs",
            date,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        );
        assert_eq!(name, "approval-logs-2026-02-27.xlsx");

        let name = export_filename(Some("attachment; filename=report.csv"), "x", date, "text/csv");
        assert_eq!(name, "report.csv");
    }

    #[test]
    fn export_filename_synthesizes_stem_date_and_extension() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 28).expect("valid date");
        let name = export_filename(
            None,
            "approval-logs",
            date,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        );
        assert_eq!(name, "approval-logs-2026-02-28.xlsx");

        let name = export_filename(None, "index-prices", date, "text/csv; charset=utf-8");
        assert_eq!(name, "index-prices-2026-02-28.csv");
    }
}
