use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use crate::grid::MonthCursor;
use crate::reschedule::RescheduleController;
use crate::source::TaskFetch;
use crate::task::CanonicalTask;

/// Generation stamp handed out when a load starts.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct LoadTicket(u64);

#[derive(Debug, Default)]
struct StoreState {
  cache:      Option<Vec<Value>>,
  snapshot:   Vec<CanonicalTask>,
  cursor:     Option<MonthCursor>,
  generation: u64,
  drag:       RescheduleController
}

/// Shared calendar state: the upstream cache, the normalized snapshot
/// the drag controller reads from, the month cursor and the drag
/// session.
///
/// Cloning yields another handle onto the same state. Borrows never
/// outlive a method call, so handles can be held across awaits.
#[derive(Debug, Clone, Default)]
pub struct CalendarStore {
  inner: Rc<RefCell<StoreState>>
}

impl PartialEq for CalendarStore {
  fn eq(&self, other: &Self) -> bool {
    Rc::ptr_eq(&self.inner, &other.inner)
  }
}

impl CalendarStore {
  pub fn cached(&self) -> Option<Vec<Value>> {
    self.inner.borrow().cache.clone()
  }

  /// Lets the task list collaborator share a listing it already has.
  pub fn seed_cache(
    &self,
    records: Vec<Value>
  ) {
    if records.is_empty() {
      return;
    }
    debug!(
      records = records.len(),
      "seeded task cache"
    );
    self.inner.borrow_mut().cache =
      Some(records);
  }

  /// Drops the cache and fences out loads already in flight, so none
  /// of them can write the old listing back.
  pub fn invalidate(&self) {
    let mut state = self.inner.borrow_mut();
    state.generation =
      state.generation.saturating_add(1);
    if state.cache.take().is_some() {
      debug!("invalidated task cache");
    }
  }

  pub fn begin_load(&self) -> LoadTicket {
    let mut state = self.inner.borrow_mut();
    state.generation =
      state.generation.saturating_add(1);
    LoadTicket(state.generation)
  }

  pub fn is_current(
    &self,
    ticket: LoadTicket
  ) -> bool {
    self.inner.borrow().generation
      == ticket.0
  }

  /// Applies a finished load if no newer load has started since.
  pub fn finish_load(
    &self,
    ticket: LoadTicket,
    fetch: &TaskFetch,
    tasks: Vec<CanonicalTask>
  ) -> bool {
    let mut state = self.inner.borrow_mut();
    if state.generation != ticket.0 {
      return false;
    }

    if let TaskFetch::Loaded {
      records,
      ..
    } = fetch
    {
      state.cache = Some(records.clone());
    }
    state.snapshot = tasks;
    true
  }

  pub fn snapshot(
    &self
  ) -> Vec<CanonicalTask> {
    self.inner.borrow().snapshot.clone()
  }

  pub fn cursor(
    &self
  ) -> Option<MonthCursor> {
    self.inner.borrow().cursor
  }

  pub fn set_cursor(
    &self,
    cursor: MonthCursor
  ) {
    self.inner.borrow_mut().cursor =
      Some(cursor);
  }

  /// Runs `f` against the drag controller. `f` must not call back into
  /// the store.
  pub fn with_drag<R>(
    &self,
    f: impl FnOnce(
      &mut RescheduleController
    ) -> R
  ) -> R {
    f(&mut self.inner.borrow_mut().drag)
  }

  pub fn drag_state(
    &self
  ) -> RescheduleController {
    self.inner.borrow().drag.clone()
  }
}
