use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{
  error,
  info,
  warn
};

use crate::datetime::CalendarZone;

fn default_api_base() -> String {
  "/api".to_string()
}

fn default_listing_variants()
-> Vec<String> {
  vec![
    "/tasks?page_size=300&sort_by=scheduled_time&sort_order=asc"
      .to_string(),
    "/tasks".to_string(),
    "/tasks?status=pending".to_string(),
  ]
}

fn default_update_path() -> String {
  "/tasks/{id}".to_string()
}

fn default_events_path() -> String {
  "/events".to_string()
}

fn default_token_keys() -> Vec<String> {
  vec![
    "token".to_string(),
    "access_token".to_string(),
    "jwt".to_string(),
  ]
}

fn default_preview_limit() -> usize {
  3
}

fn default_notice_timeout_ms() -> u32 {
  3_000
}

fn default_weekdays() -> Vec<String> {
  ["日", "一", "二", "三", "四", "五", "六"]
    .iter()
    .map(|label| label.to_string())
    .collect()
}

fn default_month_format() -> String {
  "%Y年%-m月".to_string()
}

fn default_day_heading() -> String {
  "{date} 的任务列表".to_string()
}

fn default_empty_day() -> String {
  "📭 这一天暂无任务安排".to_string()
}

fn default_confirm_title() -> String {
  "确认调整任务日期".to_string()
}

fn default_confirm_message() -> String {
  "将任务「{title}」\n\n从 {from} → {to}\n\n⏰ 时间保持：{time}"
    .to_string()
}

fn default_confirm_accept() -> String {
  "确认调整".to_string()
}

fn default_confirm_cancel() -> String {
  "取消".to_string()
}

fn default_moved() -> String {
  "✅ 任务已调整到 {date} {time}"
    .to_string()
}

fn default_move_failed() -> String {
  "调整失败：{reason}".to_string()
}

fn default_update_failed() -> String {
  "更新失败".to_string()
}

fn default_stale_task() -> String {
  "任务数据无效，请刷新页面后重试"
    .to_string()
}

fn default_task_executed() -> String {
  "{icon} 任务 \"{title}\" 执行完成: {message}"
    .to_string()
}

fn default_calendar_synced() -> String {
  "📅 {message}".to_string()
}

fn default_status_labels()
-> BTreeMap<String, String> {
  [
    ("pending", "待发送"),
    ("waiting", "等待中"),
    ("sent", "已发送"),
    ("failed", "失败"),
    ("cancelled", "已取消"),
    ("paused", "已暂停")
  ]
  .into_iter()
  .map(|(status, label)| {
    (status.to_string(), label.to_string())
  })
  .collect()
}

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct CalendarConfig {
  #[serde(default)]
  pub version:       u32,
  #[serde(default)]
  pub api:           ApiConfig,
  #[serde(default)]
  pub policies:      CalendarPolicies,
  #[serde(default)]
  pub labels:        CalendarLabels,
  #[serde(
    default = "default_status_labels"
  )]
  pub status_labels:
    BTreeMap<String, String>
}

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct ApiConfig {
  #[serde(default = "default_api_base")]
  pub base:             String,
  #[serde(
    default = "default_listing_variants"
  )]
  pub listing_variants: Vec<String>,
  #[serde(
    default = "default_update_path"
  )]
  pub update_path:      String,
  #[serde(
    default = "default_events_path"
  )]
  pub events_path:      String,
  #[serde(
    default = "default_token_keys"
  )]
  pub token_keys:       Vec<String>
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Deserialize,
  Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmMode {
  /// In-page modal dialog.
  #[default]
  Modal,
  /// Blocking `window.confirm`.
  Native
}

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct CalendarPolicies {
  #[serde(
    default = "default_preview_limit"
  )]
  pub preview_limit:     usize,
  #[serde(default)]
  pub timezone:          Option<String>,
  #[serde(
    default = "default_notice_timeout_ms"
  )]
  pub notice_timeout_ms: u32,
  #[serde(default)]
  pub confirm:           ConfirmMode
}

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct CalendarLabels {
  #[serde(default = "default_weekdays")]
  pub weekdays:        Vec<String>,
  #[serde(
    default = "default_month_format"
  )]
  pub month_format:    String,
  #[serde(
    default = "default_day_heading"
  )]
  pub day_heading:     String,
  #[serde(default = "default_empty_day")]
  pub empty_day:       String,
  #[serde(
    default = "default_confirm_title"
  )]
  pub confirm_title:   String,
  #[serde(
    default = "default_confirm_message"
  )]
  pub confirm_message: String,
  #[serde(
    default = "default_confirm_accept"
  )]
  pub confirm_accept:  String,
  #[serde(
    default = "default_confirm_cancel"
  )]
  pub confirm_cancel:  String,
  #[serde(default = "default_moved")]
  pub moved:           String,
  #[serde(
    default = "default_move_failed"
  )]
  pub move_failed:     String,
  #[serde(
    default = "default_update_failed"
  )]
  pub update_failed:   String,
  #[serde(
    default = "default_stale_task"
  )]
  pub stale_task:      String,
  #[serde(
    default = "default_task_executed"
  )]
  pub task_executed:   String,
  #[serde(
    default = "default_calendar_synced"
  )]
  pub calendar_synced: String
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base:             default_api_base(),
      listing_variants:
        default_listing_variants(),
      update_path:
        default_update_path(),
      events_path:
        default_events_path(),
      token_keys:       default_token_keys()
    }
  }
}

impl Default for CalendarPolicies {
  fn default() -> Self {
    Self {
      preview_limit:
        default_preview_limit(),
      timezone:          None,
      notice_timeout_ms:
        default_notice_timeout_ms(),
      confirm:           ConfirmMode::Modal
    }
  }
}

impl Default for CalendarLabels {
  fn default() -> Self {
    Self {
      weekdays:        default_weekdays(),
      month_format:
        default_month_format(),
      day_heading:     default_day_heading(),
      empty_day:       default_empty_day(),
      confirm_title:
        default_confirm_title(),
      confirm_message:
        default_confirm_message(),
      confirm_accept:
        default_confirm_accept(),
      confirm_cancel:
        default_confirm_cancel(),
      moved:           default_moved(),
      move_failed:     default_move_failed(),
      update_failed:
        default_update_failed(),
      stale_task:      default_stale_task(),
      task_executed:
        default_task_executed(),
      calendar_synced:
        default_calendar_synced()
    }
  }
}

impl Default for CalendarConfig {
  fn default() -> Self {
    Self {
      version:       1,
      api:           ApiConfig::default(),
      policies:
        CalendarPolicies::default(),
      labels:        CalendarLabels::default(),
      status_labels:
        default_status_labels()
    }
  }
}

impl CalendarConfig {
  /// Parses an embedded or user-supplied TOML document. Any parse error
  /// falls back to the built-in defaults.
  pub fn from_toml_str(raw: &str) -> Self {
    match toml::from_str::<CalendarConfig>(
      raw
    ) {
      | Ok(mut config) => {
        config.sanitize();
        info!(
          version = config.version,
          timezone = ?config.policies.timezone,
          endpoints = config.api.listing_variants.len(),
          confirm = ?config.policies.confirm,
          "loaded calendar config"
        );
        config
      }
      | Err(error) => {
        error!(%error, "failed parsing calendar config; using defaults");
        CalendarConfig::default()
      }
    }
  }

  fn sanitize(&mut self) {
    let trimmed_base = self
      .api
      .base
      .trim()
      .trim_end_matches('/')
      .to_string();
    self.api.base = trimmed_base;

    self.api.listing_variants.retain(
      |variant| !variant.trim().is_empty()
    );
    if self.api.listing_variants.is_empty()
    {
      warn!(
        "no listing variants configured; \
         using defaults"
      );
      self.api.listing_variants =
        default_listing_variants();
    }

    if !self.api.update_path.contains("{id}")
    {
      warn!(
        update_path = %self.api.update_path,
        "update path lacks {{id}} \
         placeholder; using default"
      );
      self.api.update_path =
        default_update_path();
    }

    if self.api.token_keys.is_empty() {
      self.api.token_keys =
        default_token_keys();
    }

    if self.policies.preview_limit == 0 {
      self.policies.preview_limit =
        default_preview_limit();
    }

    if self.policies.notice_timeout_ms
      == 0
    {
      self.policies.notice_timeout_ms =
        default_notice_timeout_ms();
    }

    if self.labels.weekdays.len() != 7 {
      warn!(
        count = self.labels.weekdays.len(),
        "weekday labels must list seven \
         days starting Sunday; using \
         defaults"
      );
      self.labels.weekdays =
        default_weekdays();
    }

    if self
      .labels
      .month_format
      .trim()
      .is_empty()
    {
      self.labels.month_format =
        default_month_format();
    }
  }

  pub fn zone(&self) -> CalendarZone {
    CalendarZone::resolve(
      self.policies.timezone.as_deref()
    )
  }

  pub fn update_path(
    &self,
    task_id: &str
  ) -> String {
    self
      .api
      .update_path
      .replace("{id}", task_id)
  }

  /// Display label for a status; unknown statuses are shown verbatim.
  pub fn status_label<'a>(
    &'a self,
    status: &'a str
  ) -> &'a str {
    self
      .status_labels
      .get(status)
      .map(String::as_str)
      .unwrap_or(status)
  }
}

/// Substitutes `{name}` placeholders in a label template.
pub fn fill_template(
  template: &str,
  values: &[(&str, &str)]
) -> String {
  values.iter().fold(
    template.to_string(),
    |acc, (name, value)| {
      acc.replace(
        &format!("{{{name}}}"),
        value
      )
    }
  )
}
