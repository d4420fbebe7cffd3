//! Embedded sub-documents of an application: notes, reminders and timeline.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::application::{
    ApplicationStatus, Note, Reminder, TimelineEvent, TimelineKind,
};

pub trait SubDocument {
    fn id(&self) -> Uuid;
}

impl SubDocument for Note {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl SubDocument for Reminder {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl SubDocument for TimelineEvent {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Removes the item with `id`. Returns false when no such item exists.
pub fn remove_by_id<T: SubDocument>(items: &mut Vec<T>, id: Uuid) -> bool {
    let before = items.len();
    items.retain(|item| item.id() != id);
    items.len() != before
}

/// Inserts keeping the timeline ordered by `occurred_at`.
/// Events sharing a timestamp keep insertion order.
pub fn insert_event(timeline: &mut Vec<TimelineEvent>, event: TimelineEvent) {
    let idx = timeline.partition_point(|e| e.occurred_at <= event.occurred_at);
    timeline.insert(idx, event);
}

pub fn status_change_event(
    old: ApplicationStatus,
    new: ApplicationStatus,
    at: DateTime<Utc>,
) -> TimelineEvent {
    TimelineEvent::new(TimelineKind::StatusChange, format!("{old} → {new}"), at)
}

#[derive(Debug, Clone, Serialize)]
pub struct DueReminder {
    pub application_id: Uuid,
    pub application_slug: String,
    pub job_title: String,
    pub reminder: Reminder,
}

/// Open reminders due before `now + within_days`, soonest first.
/// Overdue reminders are included.
pub fn collect_due<'a, I>(applications: I, now: DateTime<Utc>, within_days: i64) -> Vec<DueReminder>
where
    I: IntoIterator<Item = (Uuid, &'a str, &'a str, &'a [Reminder])>,
{
    let horizon = now + Duration::days(within_days);
    let mut due: Vec<DueReminder> = applications
        .into_iter()
        .flat_map(|(application_id, slug, job_title, reminders)| {
            reminders
                .iter()
                .filter(|r| !r.completed && r.due_at <= horizon)
                .map(move |r| DueReminder {
                    application_id,
                    application_slug: slug.to_string(),
                    job_title: job_title.to_string(),
                    reminder: r.clone(),
                })
        })
        .collect();
    due.sort_by_key(|d| d.reminder.due_at);
    due
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
    }

    fn reminder(title: &str, due_at: DateTime<Utc>, completed: bool) -> Reminder {
        Reminder {
            id: Uuid::new_v4(),
            title: title.to_string(),
            due_at,
            completed,
            created_at: at(1, 0),
        }
    }

    #[test]
    fn test_remove_by_id_reports_missing() {
        let note = Note {
            id: Uuid::new_v4(),
            body: "called recruiter".to_string(),
            created_at: at(1, 9),
        };
        let keep = note.id;
        let mut notes = vec![note];
        assert!(!remove_by_id(&mut notes, Uuid::new_v4()));
        assert_eq!(notes.len(), 1);
        assert!(remove_by_id(&mut notes, keep));
        assert!(notes.is_empty());
    }

    #[test]
    fn test_insert_event_keeps_order() {
        let mut timeline = vec![
            TimelineEvent::new(TimelineKind::Created, "created", at(1, 9)),
            TimelineEvent::new(TimelineKind::Custom, "phone screen", at(5, 9)),
        ];
        insert_event(
            &mut timeline,
            TimelineEvent::new(TimelineKind::Custom, "sent portfolio", at(3, 9)),
        );
        insert_event(
            &mut timeline,
            TimelineEvent::new(TimelineKind::Custom, "same time", at(5, 9)),
        );
        let descriptions: Vec<&str> = timeline.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(
            descriptions,
            vec!["created", "sent portfolio", "phone screen", "same time"]
        );
    }

    #[test]
    fn test_status_change_description() {
        let event = status_change_event(
            ApplicationStatus::Applied,
            ApplicationStatus::Interviewing,
            at(2, 0),
        );
        assert_eq!(event.kind, TimelineKind::StatusChange);
        assert_eq!(event.description, "applied → interviewing");
    }

    #[test]
    fn test_collect_due_filters_and_sorts() {
        let now = at(10, 12);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let first = vec![
            reminder("follow up", at(14, 0), false),
            reminder("done already", at(11, 0), true),
            reminder("far future", at(28, 0), false),
        ];
        let second = vec![reminder("overdue thank-you", at(8, 0), false)];

        let due = collect_due(
            [
                (a, "acme-x1", "Backend Engineer", first.as_slice()),
                (b, "globex-y2", "Platform Engineer", second.as_slice()),
            ],
            now,
            7,
        );

        let titles: Vec<&str> = due.iter().map(|d| d.reminder.title.as_str()).collect();
        assert_eq!(titles, vec!["overdue thank-you", "follow up"]);
        assert_eq!(due[0].application_id, b);
        assert_eq!(due[1].application_slug, "acme-x1");
    }
}
