//! Calendar subsystem of the Herald notification-task client.
//!
//! Everything in this crate is free of DOM access so it can be driven
//! from the Yew frontend and from native tests alike.

pub mod config;
pub mod datetime;
pub mod envelope;
pub mod feed;
pub mod grid;
pub mod normalize;
pub mod notice;
pub mod reconcile;
pub mod reschedule;
pub mod source;
pub mod store;
pub mod task;
pub mod transport;

use tracing::debug;

use crate::config::CalendarConfig;
use crate::datetime::CalendarZone;
use crate::source::{
  TaskFetch,
  TaskSource
};
use crate::store::CalendarStore;
use crate::task::CanonicalTask;
use crate::transport::TaskTransport;

/// Result of one fetch-normalize pass.
#[derive(Debug, Clone)]
pub struct CalendarLoad {
  pub fetch: TaskFetch,
  pub tasks: Vec<CanonicalTask>
}

/// Runs the full fetch-normalize cycle for the calendar view.
///
/// Returns `None` when a newer load started while this one was
/// waiting on the network; the caller must not render the result.
#[tracing::instrument(skip_all)]
pub async fn load_calendar<T>(
  transport: &T,
  store: &CalendarStore,
  config: &CalendarConfig,
  zone: &CalendarZone
) -> Option<CalendarLoad>
where
  T: TaskTransport
{
  let ticket = store.begin_load();
  let source =
    TaskSource::new(transport, config);
  let fetch = source.read(store).await;

  let tasks = normalize::normalize_tasks(
    fetch.records(),
    zone
  );

  if !store.finish_load(
    ticket,
    &fetch,
    tasks.clone()
  ) {
    debug!(
      ?ticket,
      "discarding stale calendar load"
    );
    return None;
  }

  Some(CalendarLoad {
    fetch,
    tasks
  })
}
