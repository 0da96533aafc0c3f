//! Monthly task completion grid.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::api::CompletionRecord;

/// One task's row: `days[d - 1]` is true when it was completed on day `d`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRow {
    pub task: String,
    pub days: Vec<bool>,
}

/// Which tasks were completed on which days of one month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyCompletions {
    year: i32,
    month: u32,
    days_in_month: u32,
    /// Distinct task texts in first-seen order.
    tasks: Vec<String>,
    done: BTreeMap<String, BTreeSet<u32>>,
}

impl MonthlyCompletions {
    /// Keep only records that fall in `year`/`month`. `None` for an invalid month.
    pub fn new(records: &[CompletionRecord], year: i32, month: u32) -> Option<Self> {
        let days_in_month = days_in_month(year, month)?;
        let mut tasks = Vec::new();
        let mut done: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();
        for record in records {
            let date = record.completed_at.date_naive();
            if date.year() != year || date.month() != month {
                continue;
            }
            if !done.contains_key(&record.task_text) {
                tasks.push(record.task_text.clone());
            }
            done.entry(record.task_text.clone())
                .or_default()
                .insert(date.day());
        }
        Some(Self {
            year,
            month,
            days_in_month,
            tasks,
            done,
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn days_in_month(&self) -> u32 {
        self.days_in_month
    }

    pub fn tasks(&self) -> &[String] {
        &self.tasks
    }

    pub fn is_completed(&self, task: &str, day: u32) -> bool {
        self.done.get(task).is_some_and(|days| days.contains(&day))
    }

    /// Days on which every task was completed. Empty when there are no tasks.
    pub fn fully_completed_days(&self) -> Vec<u32> {
        if self.tasks.is_empty() {
            return Vec::new();
        }
        (1..=self.days_in_month)
            .filter(|&day| self.tasks.iter().all(|t| self.is_completed(t, day)))
            .collect()
    }

    /// Tasks completed on every day of the month.
    pub fn fully_completed_tasks(&self) -> Vec<&str> {
        self.tasks
            .iter()
            .filter(|t| (1..=self.days_in_month).all(|day| self.is_completed(t, day)))
            .map(String::as_str)
            .collect()
    }

    pub fn rows(&self) -> Vec<CompletionRow> {
        self.tasks
            .iter()
            .map(|task| CompletionRow {
                task: task.clone(),
                days: (1..=self.days_in_month)
                    .map(|day| self.is_completed(task, day))
                    .collect(),
            })
            .collect()
    }
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((next - first).num_days() as u32)
}
