use std::fmt;

use serde_json::Value;
use tracing::{
  debug,
  error,
  info,
  warn
};

use crate::config::CalendarConfig;
use crate::envelope::extract_records;
use crate::store::CalendarStore;
use crate::transport::TaskTransport;

/// Why a 2xx listing produced no records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEmptyReason {
  EmptyBody,
  UnparsableBody(String),
  NoArray,
  EmptyArray
}

impl fmt::Display for FetchEmptyReason {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    match self {
      | Self::EmptyBody => {
        f.write_str("empty response body")
      }
      | Self::UnparsableBody(error) => {
        write!(f, "unparsable body: {error}")
      }
      | Self::NoArray => {
        f.write_str("no task array in body")
      }
      | Self::EmptyArray => {
        f.write_str("task array is empty")
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
  Unauthorized,
  Status(u16),
  Transport(String)
}

impl fmt::Display for AttemptFailure {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    match self {
      | Self::Unauthorized => {
        f.write_str("unauthorized")
      }
      | Self::Status(status) => {
        write!(f, "http status {status}")
      }
      | Self::Transport(error) => {
        write!(f, "network error: {error}")
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchAttempt {
  pub endpoint: String,
  pub failure:  AttemptFailure
}

/// Outcome of reading the upstream task collection.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskFetch {
  /// Served from the store without touching the network.
  Cached { records: Vec<Value> },
  Loaded {
    endpoint:  String,
    extractor: &'static str,
    records:   Vec<Value>
  },
  /// A variant answered 2xx but carried no tasks; later variants were
  /// not tried.
  Empty {
    endpoint: String,
    reason:   FetchEmptyReason
  },
  /// Every variant failed.
  Failed { attempts: Vec<FetchAttempt> }
}

impl TaskFetch {
  /// Records to normalize; empty for `Empty` and `Failed`.
  pub fn records(&self) -> &[Value] {
    match self {
      | Self::Cached { records }
      | Self::Loaded { records, .. } => {
        records
      }
      | Self::Empty { .. }
      | Self::Failed { .. } => &[]
    }
  }

  pub fn is_failed(&self) -> bool {
    matches!(self, Self::Failed { .. })
  }

  pub fn is_cached(&self) -> bool {
    matches!(self, Self::Cached { .. })
  }
}

/// Reads task records over the configured endpoint variants.
pub struct TaskSource<'a, T> {
  transport: &'a T,
  variants:  &'a [String]
}

impl<'a, T> TaskSource<'a, T>
where
  T: TaskTransport
{
  pub fn new(
    transport: &'a T,
    config: &'a CalendarConfig
  ) -> Self {
    Self {
      transport,
      variants: &config.api.listing_variants
    }
  }

  /// Cached snapshot when the store holds one, network otherwise.
  pub async fn read(
    &self,
    store: &CalendarStore
  ) -> TaskFetch {
    if let Some(records) = store.cached()
    {
      info!(
        records = records.len(),
        "using cached task snapshot"
      );
      return TaskFetch::Cached {
        records
      };
    }
    self.fetch().await
  }

  /// Tries each variant in order and stops at the first 2xx.
  #[tracing::instrument(skip_all)]
  pub async fn fetch(&self) -> TaskFetch {
    let mut attempts = Vec::new();

    for endpoint in self.variants {
      let reply = match self
        .transport
        .get(endpoint)
        .await
      {
        | Ok(reply) => reply,
        | Err(error) => {
          warn!(
            endpoint = %endpoint,
            error = %error,
            "task listing network error"
          );
          attempts.push(FetchAttempt {
            endpoint: endpoint.clone(),
            failure:
              AttemptFailure::Transport(
                format!("{error:#}")
              )
          });
          continue;
        }
      };

      if !reply.is_success() {
        let failure =
          if reply.is_unauthorized() {
            warn!(
              endpoint = %endpoint,
              "unauthorized for task \
               listing"
            );
            AttemptFailure::Unauthorized
          } else {
            warn!(
              endpoint = %endpoint,
              status = reply.status,
              "task listing rejected"
            );
            AttemptFailure::Status(
              reply.status
            )
          };
        attempts.push(FetchAttempt {
          endpoint: endpoint.clone(),
          failure
        });
        continue;
      }

      return Self::read_body(
        endpoint, &reply.body
      );
    }

    error!(
      attempts = attempts.len(),
      "all task listing variants failed"
    );
    TaskFetch::Failed { attempts }
  }

  fn read_body(
    endpoint: &str,
    body: &str
  ) -> TaskFetch {
    let empty = |reason| {
      warn!(
        endpoint = %endpoint,
        reason = %reason,
        "task listing returned no \
         tasks; not trying further \
         variants"
      );
      TaskFetch::Empty {
        endpoint: endpoint.to_string(),
        reason
      }
    };

    if body.trim().is_empty() {
      return empty(
        FetchEmptyReason::EmptyBody
      );
    }

    let parsed = match serde_json::from_str::<
      Value,
    >(body)
    {
      | Ok(parsed) => parsed,
      | Err(error) => {
        error!(
          endpoint = %endpoint,
          %error,
          "task listing json parse error"
        );
        return empty(
          FetchEmptyReason::UnparsableBody(
            error.to_string()
          )
        );
      }
    };

    let Some((extractor, records)) =
      extract_records(&parsed)
    else {
      return empty(
        FetchEmptyReason::NoArray
      );
    };

    if records.is_empty() {
      return empty(
        FetchEmptyReason::EmptyArray
      );
    }

    debug!(
      endpoint = %endpoint,
      extractor,
      records = records.len(),
      "loaded task listing"
    );
    TaskFetch::Loaded {
      endpoint: endpoint.to_string(),
      extractor,
      records: records.clone()
    }
  }
}
