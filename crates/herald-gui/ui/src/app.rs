mod calendar;
mod host;
mod push;

use chrono::NaiveDate;
use gloo::console::log;
use gloo::timers::callback::Timeout;
use herald_core::config::ConfirmMode;
use herald_core::feed::PushEvent;
use herald_core::grid::{
  MonthCursor,
  build_month_grid,
  initial_selection
};
use herald_core::load_calendar;
use herald_core::notice::Notice;
use herald_core::reconcile::{
  persist_move,
  stale_task_notice
};
use herald_core::reschedule::{
  ConfirmRequest,
  DragStart,
  DropOutcome,
  DropTarget
};
use herald_core::source::TaskFetch;
use herald_core::store::CalendarStore;
use herald_core::task::CanonicalTask;
use yew::{
  Callback,
  Html,
  MouseEvent,
  function_component,
  html,
  use_effect_with,
  use_mut_ref,
  use_state
};

use self::calendar::{
  load_calendar_config,
  navigate,
  selected_detail
};
use crate::api::BrowserTransport;
use crate::components::{
  CalendarNav,
  ConfirmModal,
  DayPanel,
  DragRequest,
  MonthGridView,
  NoticeToast,
  Toast
};

#[function_component(App)]
pub fn app() -> Html {
  let config =
    use_state(load_calendar_config);
  let zone = config.zone();
  let transport = {
    let api = config.api.clone();
    use_state(move || {
      BrowserTransport::new(&api)
    })
  };
  let store =
    use_state(CalendarStore::default);
  let cursor = use_state(move || {
    MonthCursor::containing(zone.today())
  });
  let selected = {
    let start = *cursor;
    use_state(move || {
      initial_selection(start, zone.today())
    })
  };
  let tasks =
    use_state(Vec::<CanonicalTask>::new);
  let loading = use_state(|| false);
  let refresh_tick =
    use_state(|| 0_u64);
  let tick_counter =
    use_mut_ref(|| 0_u64);
  let dragging_element =
    use_state(|| None::<String>);
  let drag_over =
    use_state(|| None::<NaiveDate>);
  let confirm_request =
    use_state(|| None::<ConfirmRequest>);
  let submitting = use_state(|| false);
  let toast = use_state(|| None::<Toast>);
  let toast_seq = use_mut_ref(|| 0_u64);

  let reload = {
    let refresh_tick =
      refresh_tick.clone();
    Callback::from(
      move |reason: &'static str| {
        let next = {
          let mut counter =
            tick_counter.borrow_mut();
          *counter = counter.wrapping_add(1);
          *counter
        };
        ui_debug("calendar.reload", reason);
        refresh_tick.set(next);
      }
    )
  };

  let notify = {
    let toast = toast.clone();
    Callback::from(move |notice: Notice| {
      let id = {
        let mut seq = toast_seq.borrow_mut();
        *seq = seq.wrapping_add(1);
        *seq
      };
      toast.set(Some(Toast {
        id,
        notice
      }));
    })
  };

  {
    use_effect_with((), move |_| {
      ui_debug(
        "app.mounted",
        "calendar mounted and hooks \
         initialized"
      );
      || ()
    });
  }

  {
    let store = store.clone();
    let transport = transport.clone();
    let config = config.clone();
    let tasks = tasks.clone();
    let loading = loading.clone();

    use_effect_with(
      (*cursor, *refresh_tick),
      move |(cursor, tick)| {
        let store = (*store).clone();
        let transport =
          (*transport).clone();
        let config = (*config).clone();
        let cursor = *cursor;
        let tick = *tick;

        store.set_cursor(cursor);
        loading.set(true);

        wasm_bindgen_futures::spawn_local(
          async move {
            tracing::info!(
              year = cursor.year(),
              month = cursor.month(),
              tick,
              "loading calendar"
            );
            let zone = config.zone();
            match load_calendar(
              &transport, &store, &config,
              &zone
            )
            .await
            {
              | Some(load) => {
                if let TaskFetch::Failed {
                  attempts
                } = &load.fetch
                {
                  tracing::error!(
                    attempts = attempts.len(),
                    "every listing variant \
                     failed; showing an empty \
                     calendar"
                  );
                }
                tasks.set(load.tasks);
                loading.set(false);
              }
              | None => ui_debug(
                "calendar.load.stale",
                "superseded by a newer load"
              )
            }
          }
        );

        || ()
      }
    );
  }

  {
    let transport = transport.clone();
    let store = store.clone();
    let config = config.clone();
    let reload = reload.clone();
    let notify = notify.clone();

    use_effect_with((), move |_| {
      let on_event = Callback::from(
        move |event: PushEvent| {
          if let Some(notice) =
            event.notice(&config)
          {
            notify.emit(notice);
          }
          if event.invalidates_calendar() {
            store.invalidate();
            reload.emit("push");
          } else {
            tracing::debug!(
              ?event,
              "ignoring push event"
            );
          }
        }
      );

      let subscription = transport
        .events_url()
        .and_then(|url| {
          push::subscribe(&url, on_event)
        });
      if subscription.is_none() {
        ui_debug(
          "push.skipped",
          "no credential or feed \
           unavailable"
        );
      }

      move || drop(subscription)
    });
  }

  {
    let toast = toast.clone();
    let timeout_ms =
      config.policies.notice_timeout_ms;

    use_effect_with(
      (*toast).as_ref().map(|toast| toast.id),
      move |id| {
        let timer = id.map(|_| {
          Timeout::new(timeout_ms, move || {
            toast.set(None);
          })
        });
        move || drop(timer)
      }
    );
  }

  let on_dismiss = {
    let toast = toast.clone();
    Callback::from(move |id: u64| {
      if (*toast).as_ref().map(|toast| toast.id)
        == Some(id)
      {
        toast.set(None);
      }
    })
  };

  let on_prev = {
    let cursor = cursor.clone();
    let selected = selected.clone();
    Callback::from(move |_: MouseEvent| {
      let (next, selection) =
        navigate(*cursor, -1, zone.today());
      cursor.set(next);
      selected.set(selection);
    })
  };

  let on_next = {
    let cursor = cursor.clone();
    let selected = selected.clone();
    Callback::from(move |_: MouseEvent| {
      let (next, selection) =
        navigate(*cursor, 1, zone.today());
      cursor.set(next);
      selected.set(selection);
    })
  };

  let on_refresh = {
    let store = store.clone();
    let reload = reload.clone();
    Callback::from(move |_: MouseEvent| {
      store.invalidate();
      reload.emit("manual");
    })
  };

  let on_select = {
    let selected = selected.clone();
    Callback::from(move |day: NaiveDate| {
      ui_debug(
        "calendar.select",
        &day.to_string()
      );
      selected.set(Some(day));
    })
  };

  let on_drag_start = {
    let store = store.clone();
    let dragging_element =
      dragging_element.clone();
    Callback::from(
      move |request: DragRequest| {
        let snapshot = store.snapshot();
        let started =
          store.with_drag(|drag| {
            drag.begin_drag(
              &request.task_id,
              request.marked_draggable,
              &request.element_key,
              &snapshot
            )
          });
        if matches!(
          started,
          DragStart::Started { .. }
        ) {
          dragging_element.set(Some(
            request.element_key.clone()
          ));
        }
        started
      }
    )
  };

  let on_drag_end = {
    let store = store.clone();
    let dragging_element =
      dragging_element.clone();
    let drag_over = drag_over.clone();
    Callback::from(move |_: ()| {
      let session =
        store.with_drag(|drag| {
          drag.end_drag();
          drag
            .session()
            .map(|session| session.id)
        });
      dragging_element.set(None);
      drag_over.set(None);

      if let Some(session) = session {
        let store = (*store).clone();
        Timeout::new(0, move || {
          if store.with_drag(|drag| {
            drag.cancel(session)
          }) {
            ui_debug(
              "drag.cancelled",
              "drag ended without a drop"
            );
          }
        })
        .forget();
      }
    })
  };

  let on_drag_over = {
    let drag_over = drag_over.clone();
    Callback::from(move |day: NaiveDate| {
      if *drag_over != Some(day) {
        drag_over.set(Some(day));
      }
    })
  };

  let submit = {
    let store = store.clone();
    let transport = transport.clone();
    let config = config.clone();
    let notify = notify.clone();
    let reload = reload.clone();
    let confirm_request =
      confirm_request.clone();
    let submitting = submitting.clone();

    Callback::from(move |_: ()| {
      let Some(proposal) = store
        .with_drag(|drag| drag.confirm())
      else {
        ui_debug(
          "drag.confirm.empty",
          "no proposal awaiting confirmation"
        );
        return;
      };

      submitting.set(true);
      let store = (*store).clone();
      let transport = (*transport).clone();
      let config = (*config).clone();
      let notify = notify.clone();
      let reload = reload.clone();
      let confirm_request =
        confirm_request.clone();
      let submitting = submitting.clone();

      wasm_bindgen_futures::spawn_local(
        async move {
          match persist_move(
            &transport, &store, &config,
            &proposal
          )
          .await
          {
            | Ok(receipt) => {
              notify.emit(
                receipt.notice(&config)
              );
              reload.emit("rescheduled");
            }
            | Err(error) => {
              tracing::error!(
                error = %error,
                "reschedule failed"
              );
              notify
                .emit(error.notice(&config));
            }
          }
          store.with_drag(|drag| drag.settle());
          submitting.set(false);
          confirm_request.set(None);
        }
      );
    })
  };

  let on_drop = {
    let store = store.clone();
    let config = config.clone();
    let dragging_element =
      dragging_element.clone();
    let drag_over = drag_over.clone();
    let confirm_request =
      confirm_request.clone();
    let notify = notify.clone();
    let submit = submit.clone();

    Callback::from(
      move |(target, token): (
        DropTarget,
        Option<String>
      )| {
        drag_over.set(None);
        dragging_element.set(None);

        let outcome =
          store.with_drag(|drag| {
            drag.drop_on(
              target,
              token.as_deref()
            )
          });

        match outcome {
          | DropOutcome::Proposed(proposal) => {
            let request =
              proposal.confirm_request(&config);
            match config.policies.confirm {
              | ConfirmMode::Modal => {
                confirm_request
                  .set(Some(request));
              }
              | ConfirmMode::Native => {
                if host::native_confirm(
                  &request
                ) {
                  submit.emit(());
                } else {
                  store.with_drag(|drag| {
                    drag.decline()
                  });
                }
              }
            }
          }
          | DropOutcome::SameDay => {
            ui_debug(
              "drag.drop.same_day",
              "task already on this day"
            );
          }
          | DropOutcome::Invalid(reason) => {
            ui_debug(
              "drag.drop.invalid",
              &format!("{reason:?}")
            );
          }
          | DropOutcome::MissingTaskData => {
            notify.emit(stale_task_notice(
              &config
            ));
          }
        }
      }
    )
  };

  let on_accept = {
    let submit = submit.clone();
    Callback::from(move |_: MouseEvent| {
      submit.emit(());
    })
  };

  let on_cancel = {
    let store = store.clone();
    let confirm_request =
      confirm_request.clone();
    let submitting = submitting.clone();
    Callback::from(move |_: MouseEvent| {
      if *submitting {
        return;
      }
      store.with_drag(|drag| drag.decline());
      confirm_request.set(None);
    })
  };

  let on_open = Callback::from(
    move |task_id: String| {
      if !host::open_task_editor(&task_id) {
        ui_debug(
          "task.open.unhandled",
          &task_id
        );
      }
    }
  );

  let grid = build_month_grid(
    *cursor,
    &tasks,
    zone.today(),
    *selected,
    &config
  );
  let detail =
    selected_detail(&grid, &config);

  html! {
      <div class="calendar-container">
          <CalendarNav
              label={grid.label.clone()}
              loading={*loading}
              {on_prev}
              {on_next}
              {on_refresh}
          />
          <MonthGridView
              grid={grid}
              dragging_element={(*dragging_element).clone()}
              drag_over={*drag_over}
              {on_select}
              {on_drag_over}
              {on_drop}
              {on_drag_start}
              {on_drag_end}
          />
          <DayPanel {detail} {on_open} />
          <ConfirmModal
              request={(*confirm_request).clone()}
              busy={*submitting}
              {on_accept}
              {on_cancel}
          />
          <NoticeToast toast={(*toast).clone()} {on_dismiss} />
      </div>
  }
}

fn ui_debug(
  event: &str,
  detail: &str
) {
  tracing::debug!(
    event, detail, "ui-debug"
  );
  log!(format!(
    "[ui-debug] {event}: {detail}"
  ));
}
