use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Resource, Translation},
    error::{ApiError, ErrorCode},
    protocol::{ListParams, Page},
};
use tracing::{debug, warn};
use url::Url;

#[async_trait]
pub trait RecordService<R: Resource>: Send + Sync {
    async fn list(&self, params: &ListParams) -> Result<Page<R>>;
    async fn create(&self, fields: &R::Fields) -> Result<R>;
    async fn update(&self, id: R::Id, fields: &R::Fields) -> Result<R>;
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn access_token(&self) -> Option<String>;
    async fn refresh(&self) -> Result<Option<String>>;
}

pub struct MissingSession;

#[async_trait]
impl SessionProvider for MissingSession {
    async fn access_token(&self) -> Option<String> {
        None
    }

    async fn refresh(&self) -> Result<Option<String>> {
        Err(anyhow!("no session available; sign in first"))
    }
}

pub struct StaticSession {
    token: String,
}

impl StaticSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl SessionProvider for StaticSession {
    async fn access_token(&self) -> Option<String> {
        Some(self.token.clone())
    }

    async fn refresh(&self) -> Result<Option<String>> {
        Err(anyhow!("static access token was rejected and cannot be refreshed"))
    }
}

pub struct HttpRecordService {
    http: Client,
    base_url: Url,
    session: Arc<dyn SessionProvider>,
}

impl HttpRecordService {
    pub fn new(base_url: &str, session: Arc<dyn SessionProvider>) -> Result<Self> {
        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base_url =
            Url::parse(&base_url).with_context(|| format!("invalid api base url: {base_url}"))?;
        Ok(Self {
            http: Client::new(),
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn fetch_translation_catalog(&self) -> Result<Vec<Translation>> {
        let url = self.endpoint("translations/")?;
        let res = self.send(|http| http.get(url.clone())).await?;
        decode(res).await
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("failed to build endpoint url for {path}"))
    }

    async fn send<B>(&self, build: B) -> Result<Response>
    where
        B: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        let token = self.session.access_token().await;
        let res = authorize(build(&self.http), token.as_deref())
            .send()
            .await?;
        if res.status() != StatusCode::UNAUTHORIZED {
            return check_status(res).await;
        }

        warn!(url = %res.url(), "api: access token rejected, refreshing session");
        let token = self
            .session
            .refresh()
            .await
            .context("session refresh failed")?;
        let res = authorize(build(&self.http), token.as_deref())
            .send()
            .await?;
        check_status(res).await
    }
}

fn authorize(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

async fn check_status(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    let message = error_message(&body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    Err(ApiError::new(ErrorCode::from_status(status.as_u16()), message).into())
}

fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(detail) = map.get("detail").and_then(|v| v.as_str()) {
            return Some(detail.to_string());
        }
    }
    Some(body.to_string())
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T> {
    let url = res.url().clone();
    res.json::<T>()
        .await
        .with_context(|| format!("invalid response body from {url}"))
}

#[async_trait]
impl<R: Resource> RecordService<R> for HttpRecordService {
    async fn list(&self, params: &ListParams) -> Result<Page<R>> {
        let url = self.endpoint(&format!("{}/", R::COLLECTION))?;
        debug!(%url, page = params.page, search = ?params.search, "api: list");
        let res = self
            .send(|http| http.get(url.clone()).query(params))
            .await?;
        decode(res).await
    }

    async fn create(&self, fields: &R::Fields) -> Result<R> {
        let url = self.endpoint(&format!("{}/", R::COLLECTION))?;
        debug!(%url, "api: create {}", R::LABEL);
        let res = self
            .send(|http| http.post(url.clone()).json(fields))
            .await?;
        decode(res).await
    }

    async fn update(&self, id: R::Id, fields: &R::Fields) -> Result<R> {
        let url = self.endpoint(&format!("{}/{id}/update/", R::COLLECTION))?;
        debug!(%url, "api: update {}", R::LABEL);
        let res = self
            .send(|http| http.put(url.clone()).json(fields))
            .await?;
        decode(res).await
    }
}

#[cfg(test)]
#[path = "tests/service_tests.rs"]
mod tests;
