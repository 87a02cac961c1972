use chrono::{DateTime, Duration, TimeZone, Utc};
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use taskminder_core::{
    FixedClock, PermissionStatus, ReminderContent, ReminderCoordinator, ReminderError,
    ReminderHandle, ReminderScheduler, ReminderState, SchedulerError, SchedulerResult, Task,
    TaskId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Permission,
    Schedule(TaskId, DateTime<Utc>),
    Cancel(ReminderHandle),
}

struct RecordingScheduler {
    calls: RefCell<Vec<Call>>,
    live: RefCell<BTreeSet<ReminderHandle>>,
    next_handle: Cell<u32>,
    permission: Cell<PermissionStatus>,
    fail_schedule: Cell<bool>,
    fail_cancel: Cell<bool>,
}

impl RecordingScheduler {
    fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            live: RefCell::new(BTreeSet::new()),
            next_handle: Cell::new(0),
            permission: Cell::new(PermissionStatus::Granted),
            fail_schedule: Cell::new(false),
            fail_cancel: Cell::new(false),
        }
    }

    fn live_count(&self) -> usize {
        self.live.borrow().len()
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|call| pred(call)).count()
    }

    fn schedules(&self) -> usize {
        self.count(|call| matches!(call, Call::Schedule(..)))
    }

    fn cancels(&self) -> usize {
        self.count(|call| matches!(call, Call::Cancel(_)))
    }

    fn permission_requests(&self) -> usize {
        self.count(|call| matches!(call, Call::Permission))
    }
}

impl ReminderScheduler for RecordingScheduler {
    fn request_permission(&self) -> SchedulerResult<PermissionStatus> {
        self.calls.borrow_mut().push(Call::Permission);
        Ok(self.permission.get())
    }

    fn schedule(
        &self,
        content: &ReminderContent,
        fire_at: DateTime<Utc>,
    ) -> SchedulerResult<ReminderHandle> {
        self.calls
            .borrow_mut()
            .push(Call::Schedule(content.task_id.clone(), fire_at));
        if self.fail_schedule.get() {
            return Err(SchedulerError::Rejected("quota exceeded".to_string()));
        }
        let next = self.next_handle.get() + 1;
        self.next_handle.set(next);
        let handle = ReminderHandle::new(format!("h{next}"));
        self.live.borrow_mut().insert(handle.clone());
        Ok(handle)
    }

    fn cancel(&self, handle: &ReminderHandle) -> SchedulerResult<()> {
        self.calls.borrow_mut().push(Call::Cancel(handle.clone()));
        if self.fail_cancel.get() {
            return Err(SchedulerError::Unavailable("service restarting".to_string()));
        }
        self.live.borrow_mut().remove(handle);
        Ok(())
    }

    fn list_pending(&self) -> SchedulerResult<Vec<ReminderHandle>> {
        Ok(self.live.borrow().iter().cloned().collect())
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
}

fn coordinator() -> ReminderCoordinator<RecordingScheduler, FixedClock> {
    ReminderCoordinator::with_clock(RecordingScheduler::new(), FixedClock::new(now()))
}

fn task(id: i64, due_at: DateTime<Utc>, completed: bool) -> Task {
    Task::new(TaskId::from(id), "Pay rent", "Monthly", due_at, completed).unwrap()
}

#[test]
fn future_incomplete_task_is_scheduled_on_create() {
    let mut reminders = coordinator();
    let t = task(42, now() + Duration::hours(2), false);

    let state = reminders.on_task_created(&t).unwrap();

    assert!(state.is_scheduled());
    assert_eq!(reminders.state(t.id()), state);
    assert_eq!(
        reminders.scheduler().calls.borrow().last(),
        Some(&Call::Schedule(TaskId::from(42), t.due_at()))
    );
}

#[test]
fn repeated_update_never_leaves_two_live_reminders() {
    let mut reminders = coordinator();
    let t = task(1, now() + Duration::minutes(30), false);

    let first = reminders.on_task_updated(&t).unwrap();
    let second = reminders.on_task_updated(&t).unwrap();

    assert_ne!(first, second);
    let scheduler = reminders.scheduler();
    assert_eq!(scheduler.schedules(), 2);
    assert_eq!(scheduler.cancels(), 1);
    assert_eq!(scheduler.live_count(), 1);
    assert_eq!(reminders.scheduled_len(), 1);
}

#[test]
fn completing_a_task_always_ends_in_none() {
    let mut reminders = coordinator();
    let due = now() + Duration::days(1);

    reminders.on_task_created(&task(1, due, false)).unwrap();
    let state = reminders.on_task_updated(&task(1, due, true)).unwrap();
    assert_eq!(state, ReminderState::None);
    assert_eq!(reminders.scheduler().live_count(), 0);

    let state = reminders
        .on_task_completed_toggle(&task(2, due, true))
        .unwrap();
    assert_eq!(state, ReminderState::None);
    assert!(reminders.is_tracked(&TaskId::from(2)));
    assert_eq!(reminders.scheduler().schedules(), 1);
}

#[test]
fn past_or_present_due_dates_are_skipped_silently() {
    let mut reminders = coordinator();

    let past = reminders
        .on_task_created(&task(1, now() - Duration::minutes(1), false))
        .unwrap();
    let present = reminders.on_task_created(&task(2, now(), false)).unwrap();

    assert_eq!(past, ReminderState::None);
    assert_eq!(present, ReminderState::None);
    assert!(reminders.scheduler().calls.borrow().is_empty());
}

#[test]
fn moving_due_date_into_the_past_cancels_reminder() {
    let mut reminders = coordinator();
    reminders
        .on_task_created(&task(1, now() + Duration::hours(1), false))
        .unwrap();

    let state = reminders
        .on_task_updated(&task(1, now() - Duration::hours(1), false))
        .unwrap();

    assert_eq!(state, ReminderState::None);
    assert_eq!(reminders.scheduler().cancels(), 1);
    assert_eq!(reminders.scheduler().live_count(), 0);
}

#[test]
fn deleting_forgets_the_id_with_or_without_reminder() {
    let mut reminders = coordinator();
    let scheduled = task(1, now() + Duration::hours(1), false);
    let idle = task(2, now() - Duration::hours(1), false);
    reminders.on_task_created(&scheduled).unwrap();
    reminders.on_task_created(&idle).unwrap();

    reminders.on_task_deleted(scheduled.id()).unwrap();
    reminders.on_task_deleted(idle.id()).unwrap();
    reminders.on_task_deleted(&TaskId::from(99)).unwrap();

    assert!(!reminders.is_tracked(scheduled.id()));
    assert!(!reminders.is_tracked(idle.id()));
    assert_eq!(reminders.tracked_len(), 0);
    assert_eq!(reminders.scheduler().live_count(), 0);
}

#[test]
fn cancel_failure_keeps_old_handle_and_skips_schedule() {
    let mut reminders = coordinator();
    let t = task(1, now() + Duration::hours(1), false);
    let original = reminders.on_task_created(&t).unwrap();

    reminders.scheduler().fail_cancel.set(true);
    let err = reminders
        .on_task_updated(&task(1, now() + Duration::hours(3), false))
        .unwrap_err();

    assert!(matches!(err, ReminderError::Cancel { .. }));
    assert_eq!(reminders.state(t.id()), original);
    assert_eq!(reminders.scheduler().schedules(), 1);

    let err = reminders.on_task_deleted(t.id()).unwrap_err();
    assert!(matches!(err, ReminderError::Cancel { .. }));
    assert!(reminders.is_tracked(t.id()));

    reminders.scheduler().fail_cancel.set(false);
    reminders.on_task_deleted(t.id()).unwrap();
    assert!(!reminders.is_tracked(t.id()));
    assert_eq!(reminders.scheduler().live_count(), 0);
}

#[test]
fn schedule_failure_leaves_state_none() {
    let mut reminders = coordinator();
    let t = task(1, now() + Duration::hours(1), false);
    reminders.on_task_created(&t).unwrap();

    reminders.scheduler().fail_schedule.set(true);
    let err = reminders.on_task_updated(&t).unwrap_err();

    assert!(matches!(err, ReminderError::Schedule { ref task_id, .. } if *task_id == TaskId::from(1)));
    assert_eq!(reminders.state(t.id()), ReminderState::None);
    assert_eq!(reminders.scheduler().live_count(), 0);
}

#[test]
fn permission_is_requested_once_when_granted() {
    let mut reminders = coordinator();
    reminders
        .on_task_created(&task(1, now() + Duration::hours(1), false))
        .unwrap();
    reminders
        .on_task_created(&task(2, now() + Duration::hours(2), false))
        .unwrap();

    assert_eq!(reminders.scheduler().permission_requests(), 1);
}

#[test]
fn denied_permission_is_reported_and_asked_again() {
    let mut reminders = coordinator();
    reminders
        .scheduler()
        .permission
        .set(PermissionStatus::Denied);
    let t = task(1, now() + Duration::hours(1), false);

    let err = reminders.on_task_created(&t).unwrap_err();
    assert_eq!(err, ReminderError::PermissionDenied);
    assert_eq!(reminders.state(t.id()), ReminderState::None);
    assert_eq!(reminders.scheduler().schedules(), 0);

    reminders
        .scheduler()
        .permission
        .set(PermissionStatus::Granted);
    assert!(reminders.on_task_updated(&t).unwrap().is_scheduled());
    assert_eq!(reminders.scheduler().permission_requests(), 2);
}

#[test]
fn reconcile_schedules_listed_tasks_and_forgets_missing_ones() {
    let mut reminders = coordinator();
    let gone = task(9, now() + Duration::hours(1), false);
    reminders.on_task_created(&gone).unwrap();

    let listing = vec![
        task(1, now() + Duration::hours(1), false),
        task(2, now() + Duration::hours(2), true),
        task(3, now() - Duration::hours(2), false),
    ];
    let report = reminders.reconcile(&listing);

    assert!(report.is_clean());
    assert_eq!(report.scheduled, 1);
    assert_eq!(report.cleared, 2);
    assert_eq!(report.removed, 1);
    assert!(!reminders.is_tracked(gone.id()));
    assert_eq!(reminders.scheduler().live_count(), 1);
    assert_eq!(reminders.pending_handles().unwrap().len(), 1);
}

#[test]
fn reconcile_collects_failures_without_stopping() {
    let mut reminders = coordinator();
    reminders.scheduler().fail_schedule.set(true);

    let report = reminders.reconcile(&[
        task(1, now() + Duration::hours(1), false),
        task(2, now() + Duration::hours(2), false),
    ]);

    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.scheduled, 0);
    assert_eq!(reminders.tracked_len(), 2);
}

#[test]
fn delivered_reminder_returns_to_none_unless_stale() {
    let mut reminders = coordinator();
    let t = task(1, now() + Duration::hours(1), false);
    let first = reminders.on_task_created(&t).unwrap();
    let stale = first.handle().cloned().unwrap();
    let current = reminders.on_task_updated(&t).unwrap();

    reminders.on_reminder_delivered(t.id(), &stale);
    assert_eq!(reminders.state(t.id()), current);

    let live = current.handle().cloned().unwrap();
    reminders.on_reminder_delivered(t.id(), &live);
    assert_eq!(reminders.state(t.id()), ReminderState::None);
}
