use serde_json::Value;

/// Status line and body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
  pub status: u16,
  pub body:   String
}

impl HttpReply {
  pub fn new(
    status: u16,
    body: impl Into<String>
  ) -> Self {
    Self {
      status,
      body: body.into()
    }
  }

  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }

  pub fn is_unauthorized(&self) -> bool {
    self.status == 401
  }
}

/// HTTP seam used by the task source and the reconciliation client.
///
/// Paths are relative to the API base the implementation was built
/// with. An `Err` means the request never produced a response.
#[allow(async_fn_in_trait)]
pub trait TaskTransport {
  async fn get(
    &self,
    path: &str
  ) -> anyhow::Result<HttpReply>;

  async fn put_json(
    &self,
    path: &str,
    body: &Value
  ) -> anyhow::Result<HttpReply>;
}
