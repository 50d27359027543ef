use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::auth::GoogleAuth;
use super::{ClientError, ClientResult};

/// Authenticated HTTP handle shared by the Sheets and Drive clients.
///
/// Requests are sent once; failures are surfaced to the caller without retry.
#[derive(Clone)]
pub struct GoogleHttp {
    http: Client,
    auth: Arc<GoogleAuth>,
}

impl GoogleHttp {
    pub fn new(auth: GoogleAuth) -> ClientResult<Self> {
        let http = Client::builder()
            .user_agent("trade-journal/0.1")
            .build()
            .map_err(ClientError::Http)?;
        Ok(Self {
            http,
            auth: Arc::new(auth),
        })
    }

    async fn authorized(&self, method: Method, url: &str) -> ClientResult<RequestBuilder> {
        let token = self.auth.bearer(&self.http).await?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    async fn check(resp: Response) -> ClientResult<Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Err(ClientError::HttpStatus { status, body })
    }

    pub async fn send_json<TBody, TResp>(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, &str)],
        body: Option<&TBody>,
    ) -> ClientResult<TResp>
    where
        TBody: Serialize + ?Sized,
        TResp: DeserializeOwned,
    {
        let mut req = self.authorized(method, url).await?.query(query);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = Self::check(req.send().await?).await?;
        Ok(resp.json::<TResp>().await?)
    }

    /// Like [`send_json`](Self::send_json) but discards the response body.
    pub async fn send_unit<TBody>(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, &str)],
        body: Option<&TBody>,
    ) -> ClientResult<()>
    where
        TBody: Serialize + ?Sized,
    {
        let mut req = self.authorized(method, url).await?.query(query);
        if let Some(body) = body {
            req = req.json(body);
        }
        Self::check(req.send().await?).await?;
        Ok(())
    }

    pub async fn send_bytes<TResp>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        content_type: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<TResp>
    where
        TResp: DeserializeOwned,
    {
        let req = self
            .authorized(Method::POST, url)
            .await?
            .query(query)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        let resp = Self::check(req.send().await?).await?;
        Ok(resp.json::<TResp>().await?)
    }
}

/// Join a base URL and a path without doubling slashes.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
