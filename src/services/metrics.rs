use std::collections::VecDeque;
use thiserror::Error;

use crate::models::{GameRecord, MetricRecord};

pub const DEFAULT_WINDOW: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricsError {
    #[error("window must be a positive integer, got {0}")]
    InvalidWindow(String),
}

/// Number of trailing games a rolling average covers. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize(usize);

impl WindowSize {
    pub fn new(window: i64) -> Result<Self, MetricsError> {
        if window <= 0 {
            return Err(MetricsError::InvalidWindow(window.to_string()));
        }
        usize::try_from(window)
            .map(WindowSize)
            .map_err(|_| MetricsError::InvalidWindow(window.to_string()))
    }

    /// Parse a user-supplied window such as a query parameter.
    pub fn parse(raw: &str) -> Result<Self, MetricsError> {
        let trimmed = raw.trim();
        let value: i64 = trimmed
            .parse()
            .map_err(|_| MetricsError::InvalidWindow(format!("'{}'", trimmed)))?;
        Self::new(value)
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        WindowSize(DEFAULT_WINDOW)
    }
}

/// Trailing window over (points for, points against) pairs.
///
/// Sums are kept as integers so every average is a single exact division of the
/// window total by the window length.
pub struct RollingWindow {
    capacity: usize,
    scores: VecDeque<(i32, i32)>,
    sum_for: i64,
    sum_against: i64,
}

impl RollingWindow {
    pub fn new(window: WindowSize) -> Self {
        Self {
            capacity: window.get(),
            scores: VecDeque::new(),
            sum_for: 0,
            sum_against: 0,
        }
    }

    pub fn push(&mut self, points_for: i32, points_against: i32) {
        self.scores.push_back((points_for, points_against));
        self.sum_for += i64::from(points_for);
        self.sum_against += i64::from(points_against);

        while self.scores.len() > self.capacity {
            if let Some((old_for, old_against)) = self.scores.pop_front() {
                self.sum_for -= i64::from(old_for);
                self.sum_against -= i64::from(old_against);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn average_points_for(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.sum_for as f64 / self.scores.len() as f64
    }

    pub fn average_points_against(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.sum_against as f64 / self.scores.len() as f64
    }
}

/// Rolling scoring averages over a date-ordered game log.
///
/// Emits one record per game. The first `window - 1` records average over every
/// game seen so far; after that each record covers exactly the last `window` games.
pub fn compute_rolling_metrics(games: &[GameRecord], window: WindowSize) -> Vec<MetricRecord> {
    let mut rolling = RollingWindow::new(window);

    games
        .iter()
        .map(|game| {
            rolling.push(game.points_for, game.points_against);

            let avg_points_for = rolling.average_points_for();
            let avg_points_against = rolling.average_points_against();

            MetricRecord {
                date: game.date,
                avg_points_for,
                avg_points_against,
                net_differential: avg_points_for - avg_points_against,
            }
        })
        .collect()
}
