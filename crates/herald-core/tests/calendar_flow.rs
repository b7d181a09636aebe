use std::cell::{
  Cell,
  RefCell
};
use std::future::Future;

use chrono::NaiveDate;
use herald_core::config::CalendarConfig;
use herald_core::datetime::CalendarZone;
use herald_core::grid::{
  MonthCursor,
  build_month_grid
};
use herald_core::load_calendar;
use herald_core::reconcile::{
  RescheduleError,
  persist_move
};
use herald_core::reschedule::{
  DragPhase,
  DragStart,
  DropOutcome,
  DropTarget,
  InvalidDrop
};
use herald_core::source::TaskFetch;
use herald_core::store::CalendarStore;
use herald_core::transport::{
  HttpReply,
  TaskTransport
};
use serde_json::{
  Value,
  json
};

const ZONE: CalendarZone =
  CalendarZone::Named(chrono_tz::UTC);

/// In-memory task server answering listings in a chosen envelope.
struct MemoryServer {
  tasks:     RefCell<Vec<Value>>,
  shape:     fn(Vec<Value>) -> Value,
  reject:    Option<(u16, &'static str)>,
  gets:      Cell<usize>,
  puts:      RefCell<Vec<(String, Value)>>
}

impl MemoryServer {
  fn new(
    tasks: Vec<Value>,
    shape: fn(Vec<Value>) -> Value
  ) -> Self {
    Self {
      tasks: RefCell::new(tasks),
      shape,
      reject: None,
      gets: Cell::new(0),
      puts: RefCell::new(Vec::new())
    }
  }
}

impl TaskTransport for MemoryServer {
  async fn get(
    &self,
    _path: &str
  ) -> anyhow::Result<HttpReply> {
    self.gets.set(self.gets.get() + 1);
    let body = (self.shape)(
      self.tasks.borrow().clone()
    );
    Ok(HttpReply::new(200, body.to_string()))
  }

  async fn put_json(
    &self,
    path: &str,
    body: &Value
  ) -> anyhow::Result<HttpReply> {
    self
      .puts
      .borrow_mut()
      .push((path.to_string(), body.clone()));
    if let Some((status, reply)) = self.reject
    {
      return Ok(HttpReply::new(status, reply));
    }

    let id = path.rsplit('/').next().unwrap_or_default();
    for task in self.tasks.borrow_mut().iter_mut() {
      if task["id"].to_string() == id {
        task["scheduled_time"] =
          body["scheduled_time"].clone();
      }
    }
    Ok(HttpReply::new(200, r#"{"ok":true}"#))
  }
}

fn run_async<T>(
  future: impl Future<Output = T>
) -> T {
  tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .expect("tokio runtime")
    .block_on(future)
}

fn seed_tasks() -> Vec<Value> {
  vec![
    json!({
      "id": 1,
      "title": "周报提醒",
      "content": "本周总结",
      "scheduled_time": "2024-03-05 09:30",
      "status": "pending",
      "channel_config": { "channel": "mail" }
    }),
    json!({
      "id": 2,
      "name": "每日站会",
      "next_run": "2024-03-05T10:00:00",
      "status": "pending",
      "cron_expression": "0 10 * * *"
    }),
    json!({
      "id": 3,
      "title": "无日期",
      "status": "pending"
    }),
  ]
}

fn date(
  y: i32,
  m: u32,
  d: u32
) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d)
    .expect("valid date")
}

#[test]
fn envelope_shapes_normalize_identically() {
  let config = CalendarConfig::default();
  let shapes: [fn(Vec<Value>) -> Value; 3] = [
    |tasks| Value::Array(tasks),
    |tasks| json!({ "items": tasks }),
    |tasks| json!({ "data": { "tasks": tasks } })
  ];

  let loads = shapes
    .into_iter()
    .map(|shape| {
      let server =
        MemoryServer::new(seed_tasks(), shape);
      let store = CalendarStore::default();
      run_async(load_calendar(
        &server, &store, &config, &ZONE
      ))
      .expect("current load")
      .tasks
    })
    .collect::<Vec<_>>();

  assert_eq!(loads[0].len(), 2);
  assert_eq!(loads[0], loads[1]);
  assert_eq!(loads[1], loads[2]);
  assert!(loads[0][0].is_draggable());
  assert!(!loads[0][1].is_draggable());
}

#[test]
fn reschedule_refetches_and_moves_the_task() {
  let config = CalendarConfig::default();
  let server = MemoryServer::new(
    seed_tasks(),
    |tasks| json!({ "items": tasks })
  );
  let store = CalendarStore::default();

  run_async(async {
    let first = load_calendar(
      &server, &store, &config, &ZONE
    )
    .await
    .expect("current load");
    assert!(matches!(
      first.fetch,
      TaskFetch::Loaded { .. }
    ));

    let cached = load_calendar(
      &server, &store, &config, &ZONE
    )
    .await
    .expect("current load");
    assert!(cached.fetch.is_cached());
    assert_eq!(server.gets.get(), 1);

    let snapshot = store.snapshot();
    let token = match store.with_drag(|drag| {
      drag.begin_drag(
        "1", true, "preview-1", &snapshot
      )
    }) {
      | DragStart::Started { token } => token,
      | other => panic!("drag refused: {other:?}")
    };
    store.with_drag(|drag| drag.end_drag());

    let outcome = store.with_drag(|drag| {
      drag.drop_on(
        DropTarget::Day(date(2024, 3, 9)),
        Some(&token)
      )
    });
    assert!(matches!(
      outcome,
      DropOutcome::Proposed(_)
    ));
    let proposal = store
      .with_drag(|drag| drag.confirm())
      .expect("pending proposal");

    let receipt = persist_move(
      &server, &store, &config, &proposal
    )
    .await
    .expect("update accepted");
    store.with_drag(|drag| drag.settle());
    assert_eq!(
      receipt.notice(&config).message,
      "✅ 任务已调整到 2024-03-09 09:30"
    );

    let (path, body) =
      server.puts.borrow()[0].clone();
    assert_eq!(path, "/tasks/1");
    assert_eq!(
      body,
      json!({
        "scheduled_time": "2024-03-09 09:30:00",
        "title": "周报提醒",
        "content": "本周总结",
        "channel_config": { "channel": "mail" }
      })
    );

    let reloaded = load_calendar(
      &server, &store, &config, &ZONE
    )
    .await
    .expect("current load");
    assert!(!reloaded.fetch.is_cached());
    assert_eq!(server.gets.get(), 2);

    let grid = build_month_grid(
      MonthCursor::containing(date(2024, 3, 1)),
      &reloaded.tasks,
      date(2024, 3, 1),
      None,
      &config
    );
    let moved = grid
      .day(date(2024, 3, 9))
      .expect("day cell");
    assert_eq!(moved.count(), 1);
    assert_eq!(moved.tasks[0].id.as_str(), "1");
    assert_eq!(
      grid
        .day(date(2024, 3, 5))
        .expect("day cell")
        .count(),
      1
    );
  });
}

#[test]
fn same_day_drop_never_reaches_the_server() {
  let config = CalendarConfig::default();
  let server = MemoryServer::new(
    seed_tasks(),
    Value::Array
  );
  let store = CalendarStore::default();
  run_async(load_calendar(
    &server, &store, &config, &ZONE
  ))
  .expect("current load");

  let snapshot = store.snapshot();
  let outcome = store.with_drag(|drag| {
    let DragStart::Started { token } = drag
      .begin_drag(
        "1", true, "preview-1", &snapshot
      )
    else {
      panic!("drag refused");
    };
    drag.drop_on(
      DropTarget::Day(date(2024, 3, 5)),
      Some(&token)
    )
  });

  assert_eq!(outcome, DropOutcome::SameDay);
  assert!(server.puts.borrow().is_empty());
  assert!(store.drag_state().session().is_none());
}

#[test]
fn abandoned_drag_cannot_be_replayed_by_a_later_drop() {
  let config = CalendarConfig::default();
  let server = MemoryServer::new(
    seed_tasks(),
    Value::Array
  );
  let store = CalendarStore::default();
  run_async(load_calendar(
    &server, &store, &config, &ZONE
  ))
  .expect("current load");

  let snapshot = store.snapshot();
  let session = store.with_drag(|drag| {
    assert!(matches!(
      drag.begin_drag(
        "1", true, "preview-1", &snapshot
      ),
      DragStart::Started { .. }
    ));
    drag.end_drag();
    drag
      .session()
      .map(|session| session.id)
      .expect("held session")
  });
  assert!(
    store.with_drag(|drag| drag.cancel(session))
  );
  assert_eq!(
    store.drag_state().phase(),
    DragPhase::Idle
  );

  for token in [None, Some("hello world")] {
    let outcome = store.with_drag(|drag| {
      drag.drop_on(
        DropTarget::Day(date(2024, 3, 9)),
        token
      )
    });
    assert_eq!(
      outcome,
      DropOutcome::Invalid(
        InvalidDrop::NoSession
      )
    );
  }
  assert!(server.puts.borrow().is_empty());
}

#[test]
fn rejected_update_keeps_cache_and_reports_reason() {
  let config = CalendarConfig::default();
  let mut server = MemoryServer::new(
    seed_tasks(),
    Value::Array
  );
  server.reject =
    Some((409, r#"{"error":"时间冲突"}"#));
  let store = CalendarStore::default();

  run_async(async {
    load_calendar(
      &server, &store, &config, &ZONE
    )
    .await
    .expect("current load");

    let snapshot = store.snapshot();
    let proposal = store.with_drag(|drag| {
      let DragStart::Started { token } = drag
        .begin_drag(
          "1", true, "preview-1", &snapshot
        )
      else {
        panic!("drag refused");
      };
      match drag.drop_on(
        DropTarget::Day(date(2024, 3, 20)),
        Some(&token)
      ) {
        | DropOutcome::Proposed(_) => {
          drag.confirm()
        }
        | other => panic!("no proposal: {other:?}")
      }
    })
    .expect("pending proposal");

    let error = persist_move(
      &server, &store, &config, &proposal
    )
    .await
    .expect_err("update rejected");
    assert_eq!(
      error,
      RescheduleError::Rejected {
        status: 409,
        reason: "时间冲突".to_string()
      }
    );
    assert_eq!(
      error.notice(&config).message,
      "调整失败：时间冲突"
    );
    assert!(store.cached().is_some());
  });
}

#[test]
fn rejection_without_reason_uses_fallback() {
  let config = CalendarConfig::default();
  let mut server =
    MemoryServer::new(seed_tasks(), Value::Array);
  server.reject = Some((500, "<html>"));
  let store = CalendarStore::default();

  run_async(async {
    load_calendar(
      &server, &store, &config, &ZONE
    )
    .await
    .expect("current load");
    let snapshot = store.snapshot();
    let proposal = store
      .with_drag(|drag| {
        drag.begin_drag(
          "1", true, "preview-1", &snapshot
        );
        drag.drop_on(
          DropTarget::Day(date(2024, 3, 1)),
          None
        );
        drag.confirm()
      })
      .expect("pending proposal");

    let error = persist_move(
      &server, &store, &config, &proposal
    )
    .await
    .expect_err("update rejected");
    assert_eq!(error.reason(), "更新失败");
  });
}
