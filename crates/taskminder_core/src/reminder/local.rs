//! In-process reminder scheduler.
//!
//! # Responsibility
//! - Keep pending reminders in memory and deliver them once due.
//! - Let the presentation layer register delivery handlers explicitly.
//!
//! # Invariants
//! - A delivered or cancelled reminder is never delivered again.
//! - Handlers run outside the internal lock, so a handler may call back
//!   into the scheduler.
//! - Dropping a `DeliverySubscription` unregisters its handler.

use crate::reminder::scheduler::{
    PermissionStatus, ReminderContent, ReminderHandle, ReminderScheduler, SchedulerError,
    SchedulerResult,
};
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use uuid::Uuid;

type DeliveryHandler = Arc<dyn Fn(&DeliveredReminder) + Send + Sync>;

/// Reminder handed to delivery handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredReminder {
    pub handle: ReminderHandle,
    pub content: ReminderContent,
    pub fire_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct PendingReminder {
    content: ReminderContent,
    fire_at: DateTime<Utc>,
}

struct LocalState {
    permission: PermissionStatus,
    pending: BTreeMap<ReminderHandle, PendingReminder>,
    handlers: BTreeMap<u64, DeliveryHandler>,
    next_handler_id: u64,
}

/// Shared, cloneable in-memory scheduler.
///
/// Clones share state: the coordinator owns one clone while the
/// presentation layer keeps another to subscribe and drive delivery.
#[derive(Clone)]
pub struct LocalScheduler {
    inner: Arc<Mutex<LocalState>>,
}

impl Default for LocalScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalScheduler {
    /// Creates a scheduler that grants notification permission.
    pub fn new() -> Self {
        Self::with_permission(PermissionStatus::Granted)
    }

    pub fn with_permission(permission: PermissionStatus) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LocalState {
                permission,
                pending: BTreeMap::new(),
                handlers: BTreeMap::new(),
                next_handler_id: 0,
            })),
        }
    }

    /// Changes the answer returned by future permission requests.
    pub fn set_permission(&self, permission: PermissionStatus) -> SchedulerResult<()> {
        self.lock()?.permission = permission;
        Ok(())
    }

    /// Registers a delivery handler for as long as the returned guard lives.
    pub fn subscribe(
        &self,
        handler: impl Fn(&DeliveredReminder) + Send + Sync + 'static,
    ) -> SchedulerResult<DeliverySubscription> {
        let mut state = self.lock()?;
        let id = state.next_handler_id;
        state.next_handler_id += 1;
        state.handlers.insert(id, Arc::new(handler));
        debug!("event=delivery_subscribe module=reminder status=ok subscription_id={id}");

        Ok(DeliverySubscription {
            inner: Arc::downgrade(&self.inner),
            id,
        })
    }

    /// Returns pending reminders ordered by handle.
    pub fn pending(&self) -> SchedulerResult<Vec<DeliveredReminder>> {
        let state = self.lock()?;
        Ok(state
            .pending
            .iter()
            .map(|(handle, pending)| DeliveredReminder {
                handle: handle.clone(),
                content: pending.content.clone(),
                fire_at: pending.fire_at,
            })
            .collect())
    }

    /// Delivers every pending reminder with `fire_at <= now`.
    ///
    /// Reminders are removed from the pending set before handlers run and
    /// are delivered in fire-time order.
    pub fn fire_due(&self, now: DateTime<Utc>) -> SchedulerResult<Vec<DeliveredReminder>> {
        let (mut delivered, handlers) = {
            let mut state = self.lock()?;
            let due: Vec<ReminderHandle> = state
                .pending
                .iter()
                .filter(|(_, pending)| pending.fire_at <= now)
                .map(|(handle, _)| handle.clone())
                .collect();

            let mut delivered = Vec::with_capacity(due.len());
            for handle in due {
                if let Some(pending) = state.pending.remove(&handle) {
                    delivered.push(DeliveredReminder {
                        handle,
                        content: pending.content,
                        fire_at: pending.fire_at,
                    });
                }
            }
            let handlers: Vec<DeliveryHandler> = state.handlers.values().cloned().collect();
            (delivered, handlers)
        };

        delivered.sort_by(|a, b| a.fire_at.cmp(&b.fire_at));
        for reminder in &delivered {
            info!(
                "event=reminder_fire module=reminder status=ok task_id={} handlers={}",
                reminder.content.task_id,
                handlers.len()
            );
            for handler in &handlers {
                handler(reminder);
            }
        }

        Ok(delivered)
    }

    fn lock(&self) -> SchedulerResult<MutexGuard<'_, LocalState>> {
        self.inner
            .lock()
            .map_err(|_| SchedulerError::Unavailable("local scheduler lock poisoned".to_string()))
    }
}

impl ReminderScheduler for LocalScheduler {
    fn request_permission(&self) -> SchedulerResult<PermissionStatus> {
        Ok(self.lock()?.permission)
    }

    fn schedule(
        &self,
        content: &ReminderContent,
        fire_at: DateTime<Utc>,
    ) -> SchedulerResult<ReminderHandle> {
        let mut state = self.lock()?;
        if state.permission == PermissionStatus::Denied {
            return Err(SchedulerError::Rejected(
                "notification permission not granted".to_string(),
            ));
        }

        let handle = ReminderHandle::new(Uuid::new_v4().to_string());
        state.pending.insert(
            handle.clone(),
            PendingReminder {
                content: content.clone(),
                fire_at,
            },
        );
        Ok(handle)
    }

    fn cancel(&self, handle: &ReminderHandle) -> SchedulerResult<()> {
        self.lock()?.pending.remove(handle);
        Ok(())
    }

    fn list_pending(&self) -> SchedulerResult<Vec<ReminderHandle>> {
        Ok(self.lock()?.pending.keys().cloned().collect())
    }
}

/// Registration guard returned by `LocalScheduler::subscribe`.
///
/// Drop it (or call `unsubscribe`) to stop receiving deliveries.
pub struct DeliverySubscription {
    inner: Weak<Mutex<LocalState>>,
    id: u64,
}

impl DeliverySubscription {
    pub fn unsubscribe(self) {}
}

impl Drop for DeliverySubscription {
    fn drop(&mut self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut state = match inner.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.handlers.remove(&self.id);
        debug!(
            "event=delivery_unsubscribe module=reminder status=ok subscription_id={}",
            self.id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::LocalScheduler;
    use crate::model::task::TaskId;
    use crate::reminder::scheduler::{
        PermissionStatus, ReminderContent, ReminderScheduler, SchedulerError,
    };
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::{Arc, Mutex};

    fn content(id: i64) -> ReminderContent {
        ReminderContent {
            task_id: TaskId::from(id),
            title: format!("task {id}"),
            body: "body".to_string(),
        }
    }

    #[test]
    fn fire_due_delivers_once_in_fire_order() {
        let scheduler = LocalScheduler::new();
        let base = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        scheduler.schedule(&content(2), base + Duration::minutes(20)).unwrap();
        scheduler.schedule(&content(1), base + Duration::minutes(10)).unwrap();
        scheduler.schedule(&content(3), base + Duration::hours(5)).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = scheduler
            .subscribe(move |reminder| {
                sink.lock().unwrap().push(reminder.content.task_id.to_string());
            })
            .unwrap();

        let delivered = scheduler.fire_due(base + Duration::hours(1)).unwrap();
        assert_eq!(delivered.len(), 2);
        assert_eq!(*seen.lock().unwrap(), ["1", "2"]);
        assert_eq!(scheduler.list_pending().unwrap().len(), 1);

        assert!(scheduler
            .fire_due(base + Duration::hours(1))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn dropped_subscription_stops_receiving() {
        let scheduler = LocalScheduler::new();
        let now = Utc::now();
        let count = Arc::new(Mutex::new(0_u32));
        let sink = Arc::clone(&count);
        let subscription = scheduler
            .subscribe(move |_| *sink.lock().unwrap() += 1)
            .unwrap();

        scheduler.schedule(&content(1), now).unwrap();
        scheduler.fire_due(now).unwrap();
        subscription.unsubscribe();

        scheduler.schedule(&content(2), now).unwrap();
        scheduler.fire_due(now).unwrap();
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn cancel_removes_pending_and_ignores_unknown_handles() {
        let scheduler = LocalScheduler::new();
        let handle = scheduler.schedule(&content(1), Utc::now()).unwrap();

        scheduler.cancel(&handle).unwrap();
        scheduler.cancel(&handle).unwrap();
        assert!(scheduler.list_pending().unwrap().is_empty());
    }

    #[test]
    fn denied_permission_rejects_schedule() {
        let scheduler = LocalScheduler::with_permission(PermissionStatus::Denied);
        assert_eq!(
            scheduler.request_permission().unwrap(),
            PermissionStatus::Denied
        );
        let err = scheduler.schedule(&content(1), Utc::now()).unwrap_err();
        assert!(matches!(err, SchedulerError::Rejected(_)));
    }
}
