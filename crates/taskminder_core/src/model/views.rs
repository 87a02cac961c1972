//! Derived task list projections.
//!
//! Views are pure functions of a `list_tasks()` result. They are never
//! mutated independently, so "active" and "completed" cannot drift apart.

use crate::model::task::Task;

/// Active/completed split of one task listing, preserving input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskViews {
    pub active: Vec<Task>,
    pub completed: Vec<Task>,
}

impl TaskViews {
    pub fn partition(tasks: impl IntoIterator<Item = Task>) -> Self {
        let (completed, active): (Vec<Task>, Vec<Task>) =
            tasks.into_iter().partition(|task| task.is_completed());
        Self { active, completed }
    }

    pub fn len(&self) -> usize {
        self.active.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.completed.is_empty()
    }
}

/// Borrowing filter over tasks that are not completed.
pub fn active_tasks(tasks: &[Task]) -> impl Iterator<Item = &Task> {
    tasks.iter().filter(|task| !task.is_completed())
}

/// Borrowing filter over completed tasks.
pub fn completed_tasks(tasks: &[Task]) -> impl Iterator<Item = &Task> {
    tasks.iter().filter(|task| task.is_completed())
}

#[cfg(test)]
mod tests {
    use super::{active_tasks, completed_tasks, TaskViews};
    use crate::model::task::{Task, TaskId};
    use chrono::Utc;

    fn task(id: i64, done: bool) -> Task {
        Task::new(TaskId::from(id), "t", "d", Utc::now(), done).unwrap()
    }

    #[test]
    fn partition_keeps_order_within_each_view() {
        let views = TaskViews::partition(vec![
            task(1, false),
            task(2, true),
            task(3, false),
            task(4, true),
        ]);

        let active: Vec<_> = views.active.iter().map(|t| t.id().to_string()).collect();
        let completed: Vec<_> = views.completed.iter().map(|t| t.id().to_string()).collect();
        assert_eq!(active, ["1", "3"]);
        assert_eq!(completed, ["2", "4"]);
        assert_eq!(views.len(), 4);
    }

    #[test]
    fn borrowing_filters_match_partition() {
        let tasks = vec![task(1, true), task(2, false)];
        assert_eq!(active_tasks(&tasks).count(), 1);
        assert_eq!(completed_tasks(&tasks).count(), 1);
    }
}
