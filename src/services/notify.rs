//! Alert orchestration: select, format, dispatch, then advance the watermark.

use crate::clients::NotificationSink;
use crate::domain::{CelestialBody, CloseApproachEvent, NotificationState};
use crate::services::approach::{format_alert, select_notifiable, AlertContext};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotificationOutcome {
    /// Notifications off or no recipient configured
    Disabled,
    NothingToSend,
    Sent { count: usize, recipient: String },
    Failed { reason: String },
}

pub struct NotificationService {
    sink: Arc<dyn NotificationSink>,
}

impl NotificationService {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    pub fn sink_name(&self) -> &'static str {
        self.sink.sink_name()
    }

    /// Run one notification check over a freshly fetched working set.
    ///
    /// The watermark moves to `now` only after the sink confirms delivery; a
    /// failed delivery leaves it untouched so the same events stay eligible.
    pub async fn check(
        &self,
        events: &[CloseApproachEvent],
        body: CelestialBody,
        state: &mut NotificationState,
        now: NaiveDateTime,
    ) -> NotificationOutcome {
        if !state.is_active() {
            return NotificationOutcome::Disabled;
        }

        let qualifying = select_notifiable(events, state, now);
        if qualifying.is_empty() {
            return NotificationOutcome::NothingToSend;
        }

        let alert = format_alert(
            &qualifying,
            AlertContext {
                body_name: body.display_name(),
                threshold_au: state.threshold_au,
            },
        );

        match self
            .sink
            .dispatch(&state.recipient, &alert.subject, &alert.body)
            .await
        {
            Ok(sent) => {
                state.record_delivery(now);
                info!(
                    recipient = %sent.recipient,
                    count = qualifying.len(),
                    sink = self.sink.sink_name(),
                    "close-approach alert delivered"
                );
                NotificationOutcome::Sent {
                    count: qualifying.len(),
                    recipient: sent.recipient,
                }
            }
            Err(e) => {
                warn!(error = %e, sink = self.sink.sink_name(), "close-approach alert failed");
                NotificationOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
