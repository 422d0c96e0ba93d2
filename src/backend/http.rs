//! JSON/HTTP adapter for the school backend

use super::traits::{ArtifactRegistry, DocumentGenerator, EntityDirectory};
use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::types::{ArtifactRecord, EntityRef, GenerationBatch, ReportKind, StudentId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// REST client implementing the generator, registry and directory traits
///
/// All three services live behind one base URL. Connection failures and 5xx
/// responses become [`Error::Transport`]; 404s on lookups become
/// [`Error::NotFound`] (or `None` for [`EntityDirectory::entity`]).
#[derive(Clone, Debug)]
pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
    signed_url_ttl: Duration,
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    term: &'a str,
    report_kind: ReportKind,
    student_ids: &'a [StudentId],
}

#[derive(Serialize)]
struct SignedUrlBody<'a> {
    path: &'a str,
    expires_in_secs: u64,
}

#[derive(Deserialize)]
struct SignedUrlResponse {
    url: String,
}

#[derive(Serialize)]
struct EmailSentBody<'a> {
    student_id: &'a StudentId,
    term: &'a str,
    report_kind: ReportKind,
    sent_at: DateTime<Utc>,
    sent_by: &'a str,
}

#[derive(Deserialize)]
struct GuardianContact {
    #[serde(default)]
    email: Option<String>,
}

impl RestBackend {
    /// Build a client from backend settings
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            signed_url_ttl: config.signed_url_ttl,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn student_path(student_id: &StudentId) -> String {
        format!("/students/{}", urlencoding::encode(student_id.as_str()))
    }

    /// Send a request, mapping transport-level failures
    ///
    /// 404 is passed through so callers can decide between `NotFound` and `None`.
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Transport(format!("{what} request failed: {e}")))?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(Error::Transport(format!("{what} returned status {status}: {body}")))
    }

    async fn send_expecting(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = self.send(request, what).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(what.to_string()));
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| Error::Transport(format!("invalid {what} response: {e}")))
    }
}

#[async_trait]
impl DocumentGenerator for RestBackend {
    async fn submit(
        &self,
        term: &str,
        kind: ReportKind,
        student_ids: &[StudentId],
    ) -> Result<GenerationBatch> {
        let request = self
            .request(Method::POST, "/reports/generate")
            .json(&GenerateBody {
                term,
                report_kind: kind,
                student_ids,
            });
        let response = self.send_expecting(request, "document generator").await?;
        Self::decode(response, "document generator").await
    }
}

#[async_trait]
impl ArtifactRegistry for RestBackend {
    async fn list(&self, term: &str, school_id: &str) -> Result<Vec<ArtifactRecord>> {
        let request = self
            .request(Method::GET, "/artifacts")
            .query(&[("term", term), ("school_id", school_id)]);
        let response = self.send_expecting(request, "artifact list").await?;
        Self::decode(response, "artifact list").await
    }

    async fn resolve_access_url(&self, storage_path: &str) -> Result<String> {
        let request = self
            .request(Method::POST, "/artifacts/signed-url")
            .json(&SignedUrlBody {
                path: storage_path,
                expires_in_secs: self.signed_url_ttl.as_secs(),
            });
        let response = self
            .send_expecting(request, &format!("artifact '{storage_path}'"))
            .await?;
        let signed: SignedUrlResponse = Self::decode(response, "signed URL").await?;
        Ok(signed.url)
    }

    async fn delete(&self, storage_path: &str) -> Result<()> {
        let request = self
            .request(Method::DELETE, "/artifacts")
            .query(&[("path", storage_path)]);
        self.send_expecting(request, &format!("artifact '{storage_path}'"))
            .await?;
        Ok(())
    }

    async fn mark_email_sent(
        &self,
        student_id: &StudentId,
        term: &str,
        kind: ReportKind,
        sent_at: DateTime<Utc>,
        sent_by: &str,
    ) -> Result<()> {
        let request = self
            .request(Method::POST, "/artifacts/email-sent")
            .json(&EmailSentBody {
                student_id,
                term,
                report_kind: kind,
                sent_at,
                sent_by,
            });
        self.send_expecting(request, &format!("{kind} for student {student_id}"))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl EntityDirectory for RestBackend {
    async fn resolve_recipients(&self, student_id: &StudentId) -> Result<Vec<String>> {
        let path = format!("{}/guardians", Self::student_path(student_id));
        let response = self
            .send_expecting(
                self.request(Method::GET, &path),
                &format!("student {student_id}"),
            )
            .await?;
        let contacts: Vec<GuardianContact> = Self::decode(response, "guardian list").await?;

        Ok(contacts
            .into_iter()
            .filter_map(|c| c.email)
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty())
            .collect())
    }

    async fn entity(&self, student_id: &StudentId) -> Result<Option<EntityRef>> {
        let request = self.request(Method::GET, &Self::student_path(student_id));
        let response = self.send(request, "student lookup").await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::decode(response, "student").await.map(Some)
    }

    async fn list_entities(&self, school_id: &str) -> Result<Vec<EntityRef>> {
        let request = self
            .request(Method::GET, "/students")
            .query(&[("school_id", school_id)]);
        let response = self.send_expecting(request, "student list").await?;
        Self::decode(response, "student list").await
    }
}
