/// In-memory session store: current working set and notification settings
use crate::domain::{CelestialBody, CloseApproachEvent, DistanceUnit, NotificationState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};

/// Most recent fetch result
#[derive(Debug, Clone, Serialize)]
pub struct WorkingSet {
    pub body: CelestialBody,
    pub unit: DistanceUnit,
    pub fetched_at: DateTime<Utc>,
    pub events: Vec<CloseApproachEvent>,
}

#[derive(Clone)]
pub struct SessionRepo {
    working_set: Arc<RwLock<Option<WorkingSet>>>,
    notifications: Arc<Mutex<NotificationState>>,
}

impl SessionRepo {
    pub fn new(notifications: NotificationState) -> Self {
        Self {
            working_set: Arc::new(RwLock::new(None)),
            notifications: Arc::new(Mutex::new(notifications)),
        }
    }

    /// Replace the working set; an empty fetch clears previous results
    pub async fn replace_working_set(&self, set: WorkingSet) {
        *self.working_set.write().await = Some(set);
    }

    /// Current working set, if it holds any events
    pub async fn working_set(&self) -> Option<WorkingSet> {
        self.working_set
            .read()
            .await
            .as_ref()
            .filter(|s| !s.events.is_empty())
            .cloned()
    }

    pub async fn notification_state(&self) -> NotificationState {
        self.notifications.lock().await.clone()
    }

    /// Exclusive access for a check-and-dispatch cycle or a settings update
    pub async fn lock_notifications(&self) -> MutexGuard<'_, NotificationState> {
        self.notifications.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ApproachTime;

    fn set(events: Vec<CloseApproachEvent>) -> WorkingSet {
        WorkingSet {
            body: CelestialBody::Moon,
            unit: DistanceUnit::Au,
            fetched_at: Utc::now(),
            events,
        }
    }

    #[tokio::test]
    async fn test_empty_fetch_clears_working_set() {
        let repo = SessionRepo::new(NotificationState::default());
        assert!(repo.working_set().await.is_none());

        repo.replace_working_set(set(vec![CloseApproachEvent {
            designation: "A".into(),
            close_approach_time: ApproachTime::Invalid(String::new()),
            distance_au: 0.1,
            relative_velocity: None,
            infinity_velocity: None,
        }]))
        .await;
        assert_eq!(repo.working_set().await.unwrap().events.len(), 1);

        repo.replace_working_set(set(Vec::new())).await;
        assert!(repo.working_set().await.is_none());
    }

    #[tokio::test]
    async fn test_notification_state_is_shared() {
        let repo = SessionRepo::new(NotificationState::default());
        let other = repo.clone();
        repo.lock_notifications().await.enabled = true;
        assert!(other.notification_state().await.enabled);
    }
}
