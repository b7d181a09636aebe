use anyhow::Context;
use gloo::net::http::{
  Request,
  RequestBuilder,
  Response
};
use herald_core::config::ApiConfig;
use herald_core::transport::{
  HttpReply,
  TaskTransport
};
use serde_json::Value;
use web_sys::RequestCredentials;

/// `fetch`-backed transport rooted at the configured API base.
#[derive(Clone, PartialEq)]
pub struct BrowserTransport {
  base:        String,
  events_path: String,
  token_keys:  Vec<String>
}

impl BrowserTransport {
  pub fn new(api: &ApiConfig) -> Self {
    Self {
      base:        api.base.clone(),
      events_path: api.events_path.clone(),
      token_keys:  api.token_keys.clone()
    }
  }

  fn url(&self, path: &str) -> String {
    format!("{}{path}", self.base)
  }

  /// Bearer credential left in local storage by the login page.
  pub fn token(&self) -> Option<String> {
    let storage = web_sys::window()
      .and_then(|window| {
        window
          .local_storage()
          .ok()
          .flatten()
      })?;
    self.token_keys.iter().find_map(|key| {
      storage
        .get_item(key)
        .ok()
        .flatten()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
    })
  }

  /// Push feed URL; `None` without a credential.
  pub fn events_url(&self) -> Option<String> {
    let token = self.token()?;
    let encoded: String =
      js_sys::encode_uri_component(&token)
        .into();
    Some(format!(
      "{}?token={encoded}",
      self.url(&self.events_path)
    ))
  }

  fn prepare(
    &self,
    builder: RequestBuilder
  ) -> RequestBuilder {
    let builder = builder
      .header("Accept", "application/json")
      .header(
        "X-Requested-With",
        "XMLHttpRequest"
      )
      .credentials(
        RequestCredentials::Include
      );
    match self.token() {
      | Some(token) => builder.header(
        "Authorization",
        &format!("Bearer {token}")
      ),
      | None => builder
    }
  }
}

async fn into_reply(
  response: Response
) -> anyhow::Result<HttpReply> {
  let status = response.status();
  let body = response
    .text()
    .await
    .context("reading response body")?;
  Ok(HttpReply::new(status, body))
}

impl TaskTransport for BrowserTransport {
  async fn get(
    &self,
    path: &str
  ) -> anyhow::Result<HttpReply> {
    let url = self.url(path);
    tracing::debug!(url = %url, "GET");
    let response = self
      .prepare(Request::get(&url))
      .send()
      .await
      .with_context(|| {
        format!("GET {url}")
      })?;
    into_reply(response).await
  }

  async fn put_json(
    &self,
    path: &str,
    body: &Value
  ) -> anyhow::Result<HttpReply> {
    let url = self.url(path);
    tracing::debug!(url = %url, "PUT");
    let request = self
      .prepare(Request::put(&url))
      .json(body)
      .context("encoding update body")?;
    let response = request
      .send()
      .await
      .with_context(|| {
        format!("PUT {url}")
      })?;
    into_reply(response).await
  }
}
