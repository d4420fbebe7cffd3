//! Visit aggregation — turns raw visit facts into the dashboard summary.
//!
//! Pure and deterministic: the caller supplies the window and the clock.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::visit::VisitFact;

// ────────────────────────────────────────────────────────────────────────────
// Output data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub window_days: u32,
    pub generated_at: DateTime<Utc>,
    pub totals: Totals,
    pub applications: Vec<ApplicationStats>,
    pub by_day: Vec<DayBucket>,
    pub by_hour: Vec<HourBucket>,
    pub by_device: Vec<CountBucket>,
    pub by_browser: Vec<CountBucket>,
    pub by_source: Vec<CountBucket>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Totals {
    pub views: u64,
    /// Distinct client IPs.
    pub unique_visitors: u64,
    pub avg_time_on_page_secs: f64,
    pub avg_scroll_depth: f64,
}

/// Share of visits (0.0 – 1.0) that saw each section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SectionRates {
    pub cover_letter: f64,
    pub experience: f64,
    pub skills: f64,
    pub projects: f64,
    pub education: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationStats {
    pub application_id: Uuid,
    pub slug: String,
    pub company_name: String,
    pub job_title: String,
    pub views: u64,
    pub unique_visitors: u64,
    pub avg_time_on_page_secs: f64,
    pub avg_scroll_depth: f64,
    pub section_rates: SectionRates,
    pub last_visit_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub views: u64,
    pub unique_visitors: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HourBucket {
    pub hour: u32,
    pub views: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountBucket {
    pub key: String,
    pub count: u64,
}

// ────────────────────────────────────────────────────────────────────────────
// Window
// ────────────────────────────────────────────────────────────────────────────

/// A window of whole UTC days ending today (inclusive).
#[derive(Debug, Clone, Copy)]
pub struct Window {
    pub days: u32,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
}

impl Window {
    pub fn ending_at(now: DateTime<Utc>, days: u32) -> Self {
        let last_day = now.date_naive();
        let first_day = last_day - Duration::days(days.saturating_sub(1) as i64);
        Self {
            days,
            first_day,
            last_day,
        }
    }

    /// Midnight UTC of the first day; the lower bound for the visit query.
    pub fn start(&self) -> DateTime<Utc> {
        self.first_day
            .and_hms_opt(0, 0, 0)
            .map(|dt| Utc.from_utc_datetime(&dt))
            .unwrap_or_else(Utc::now)
    }

    fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first_day && date <= self.last_day
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Aggregation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Accumulator<'a> {
    views: u64,
    ips: HashSet<&'a str>,
    time_total: i64,
    scroll_total: i64,
    section_counts: [u64; 5],
}

impl<'a> Accumulator<'a> {
    fn add(&mut self, fact: &'a VisitFact) {
        self.views += 1;
        self.ips.insert(fact.ip.as_str());
        self.time_total += fact.time_on_page_secs as i64;
        self.scroll_total += fact.max_scroll_depth as i64;
        for (count, seen) in self.section_counts.iter_mut().zip(fact.sections.0.flags()) {
            if seen {
                *count += 1;
            }
        }
    }

    fn avg(&self, total: i64) -> f64 {
        if self.views == 0 {
            0.0
        } else {
            round2(total as f64 / self.views as f64)
        }
    }

    fn rate(&self, idx: usize) -> f64 {
        if self.views == 0 {
            0.0
        } else {
            round2(self.section_counts[idx] as f64 / self.views as f64)
        }
    }

    fn totals(&self) -> Totals {
        Totals {
            views: self.views,
            unique_visitors: self.ips.len() as u64,
            avg_time_on_page_secs: self.avg(self.time_total),
            avg_scroll_depth: self.avg(self.scroll_total),
        }
    }

    fn section_rates(&self) -> SectionRates {
        SectionRates {
            cover_letter: self.rate(0),
            experience: self.rate(1),
            skills: self.rate(2),
            projects: self.rate(3),
            education: self.rate(4),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn count_buckets<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<CountBucket> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }
    let mut buckets: Vec<CountBucket> = counts
        .into_iter()
        .map(|(key, count)| CountBucket {
            key: key.to_string(),
            count,
        })
        .collect();
    buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    buckets
}

/// Summarises visits inside `window`. Facts outside the window are ignored.
pub fn aggregate_visits(
    facts: &[VisitFact],
    window: Window,
    now: DateTime<Utc>,
) -> AnalyticsSummary {
    let in_window: Vec<&VisitFact> = facts
        .iter()
        .filter(|f| window.contains(f.created_at.date_naive()))
        .collect();

    let mut totals = Accumulator::default();
    let mut per_app: HashMap<Uuid, (Accumulator, &VisitFact, DateTime<Utc>)> = HashMap::new();
    let mut per_day: BTreeMap<NaiveDate, (u64, HashSet<&str>)> = BTreeMap::new();
    let mut per_hour = [0u64; 24];

    for fact in in_window.iter().copied() {
        totals.add(fact);

        let entry = per_app
            .entry(fact.application_id)
            .or_insert_with(|| (Accumulator::default(), fact, fact.created_at));
        entry.0.add(fact);
        if fact.created_at > entry.2 {
            entry.2 = fact.created_at;
        }

        let day = per_day.entry(fact.created_at.date_naive()).or_default();
        day.0 += 1;
        day.1.insert(fact.ip.as_str());

        per_hour[fact.created_at.hour() as usize] += 1;
    }

    let mut applications: Vec<ApplicationStats> = per_app
        .into_iter()
        .map(|(application_id, (acc, sample, last_visit_at))| {
            let totals = acc.totals();
            ApplicationStats {
                application_id,
                slug: sample.application_slug.clone(),
                company_name: sample.company_name.clone(),
                job_title: sample.job_title.clone(),
                views: totals.views,
                unique_visitors: totals.unique_visitors,
                avg_time_on_page_secs: totals.avg_time_on_page_secs,
                avg_scroll_depth: totals.avg_scroll_depth,
                section_rates: acc.section_rates(),
                last_visit_at,
            }
        })
        .collect();
    applications.sort_by(|a, b| {
        b.views
            .cmp(&a.views)
            .then_with(|| b.last_visit_at.cmp(&a.last_visit_at))
    });

    let by_day = window
        .first_day
        .iter_days()
        .take_while(|d| *d <= window.last_day)
        .map(|date| {
            let (views, unique_visitors) = per_day
                .get(&date)
                .map(|(v, ips)| (*v, ips.len() as u64))
                .unwrap_or((0, 0));
            DayBucket {
                date,
                views,
                unique_visitors,
            }
        })
        .collect();

    let by_hour = per_hour
        .iter()
        .enumerate()
        .map(|(hour, views)| HourBucket {
            hour: hour as u32,
            views: *views,
        })
        .collect();

    AnalyticsSummary {
        window_days: window.days,
        generated_at: now,
        totals: totals.totals(),
        applications,
        by_day,
        by_hour,
        by_device: count_buckets(in_window.iter().map(|f| f.device.as_str())),
        by_browser: count_buckets(in_window.iter().map(|f| f.browser.as_str())),
        by_source: count_buckets(in_window.iter().map(|f| f.source.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;

    fn fact(
        app: Uuid,
        slug: &str,
        ip: &str,
        at: DateTime<Utc>,
        time: i32,
        scroll: i16,
        sections: SectionViews,
    ) -> VisitFact {
        VisitFact {
            application_id: app,
            application_slug: slug.to_string(),
            job_title: "Backend Engineer".to_string(),
            company_name: "Acme".to_string(),
            ip: ip.to_string(),
            source: "linkedin".to_string(),
            device: "desktop".to_string(),
            browser: "chrome".to_string(),
            time_on_page_secs: time,
            max_scroll_depth: scroll,
            sections: Json(sections),
            created_at: at,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 18, 0, 0).unwrap()
    }

    use crate::models::visit::SectionViews;

    #[test]
    fn test_empty_input_yields_zero_filled_buckets() {
        let summary = aggregate_visits(&[], Window::ending_at(now(), 7), now());
        assert_eq!(summary.totals, Totals::default());
        assert!(summary.applications.is_empty());
        assert_eq!(summary.by_day.len(), 7);
        assert!(summary.by_day.iter().all(|d| d.views == 0));
        assert_eq!(summary.by_hour.len(), 24);
        assert_eq!(summary.by_day[0].date, NaiveDate::from_ymd_opt(2026, 3, 4).unwrap());
        assert_eq!(summary.by_day[6].date, NaiveDate::from_ymd_opt(2026, 3, 10).unwrap());
    }

    #[test]
    fn test_totals_and_unique_ips() {
        let app = Uuid::new_v4();
        let at = Utc.with_ymd_and_hms(2026, 3, 9, 9, 30, 0).unwrap();
        let facts = vec![
            fact(app, "acme", "1.1.1.1", at, 30, 50, SectionViews::default()),
            fact(app, "acme", "1.1.1.1", at, 90, 100, SectionViews::default()),
            fact(app, "acme", "2.2.2.2", at, 60, 0, SectionViews::default()),
        ];
        let summary = aggregate_visits(&facts, Window::ending_at(now(), 30), now());
        assert_eq!(summary.totals.views, 3);
        assert_eq!(summary.totals.unique_visitors, 2);
        assert!((summary.totals.avg_time_on_page_secs - 60.0).abs() < f64::EPSILON);
        assert!((summary.totals.avg_scroll_depth - 50.0).abs() < f64::EPSILON);
        assert_eq!(summary.by_hour[9].views, 3);
    }

    #[test]
    fn test_applications_sorted_by_views() {
        let quiet = Uuid::new_v4();
        let busy = Uuid::new_v4();
        let at = Utc.with_ymd_and_hms(2026, 3, 8, 12, 0, 0).unwrap();
        let facts = vec![
            fact(quiet, "quiet", "1.1.1.1", at, 10, 10, SectionViews::default()),
            fact(busy, "busy", "2.2.2.2", at, 10, 10, SectionViews::default()),
            fact(busy, "busy", "3.3.3.3", at + Duration::hours(2), 10, 10, SectionViews::default()),
        ];
        let summary = aggregate_visits(&facts, Window::ending_at(now(), 30), now());
        assert_eq!(summary.applications[0].slug, "busy");
        assert_eq!(summary.applications[0].views, 2);
        assert_eq!(summary.applications[0].last_visit_at, at + Duration::hours(2));
        assert_eq!(summary.applications[1].slug, "quiet");
    }

    #[test]
    fn test_section_rates() {
        let app = Uuid::new_v4();
        let at = Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap();
        let seen_letter = SectionViews {
            cover_letter: true,
            ..Default::default()
        };
        let seen_all = SectionViews {
            cover_letter: true,
            experience: true,
            skills: true,
            projects: true,
            education: true,
        };
        let facts = vec![
            fact(app, "a", "1.1.1.1", at, 0, 0, seen_letter),
            fact(app, "a", "1.1.1.2", at, 0, 0, seen_all),
            fact(app, "a", "1.1.1.3", at, 0, 0, SectionViews::default()),
            fact(app, "a", "1.1.1.4", at, 0, 0, seen_letter),
        ];
        let summary = aggregate_visits(&facts, Window::ending_at(now(), 1), now());
        let rates = &summary.applications[0].section_rates;
        assert!((rates.cover_letter - 0.75).abs() < f64::EPSILON);
        assert!((rates.projects - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_facts_outside_window_ignored() {
        let app = Uuid::new_v4();
        let old = Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap();
        let recent = Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap();
        let facts = vec![
            fact(app, "a", "1.1.1.1", old, 0, 0, SectionViews::default()),
            fact(app, "a", "1.1.1.1", recent, 0, 0, SectionViews::default()),
        ];
        let summary = aggregate_visits(&facts, Window::ending_at(now(), 7), now());
        assert_eq!(summary.totals.views, 1);
        assert_eq!(summary.by_day.last().unwrap().views, 1);
    }

    #[test]
    fn test_count_buckets_sorted_desc_then_key() {
        let buckets = count_buckets(["safari", "chrome", "firefox", "chrome", "firefox"].into_iter());
        let keys: Vec<_> = buckets.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["chrome", "firefox", "safari"]);
        assert_eq!(buckets[0].count, 2);
    }

    #[test]
    fn test_window_start_is_midnight_of_first_day() {
        let window = Window::ending_at(now(), 30);
        assert_eq!(
            window.start(),
            Utc.with_ymd_and_hms(2026, 2, 9, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_summary_round_trips_for_cache() {
        let summary = aggregate_visits(&[], Window::ending_at(now(), 3), now());
        let json = serde_json::to_string(&summary).unwrap();
        let back: AnalyticsSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.by_day, summary.by_day);
    }
}
