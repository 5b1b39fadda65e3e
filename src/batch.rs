//! Many independent queries over one grid
//!
//! [`run_batch`] answers a list of (start, goal) queries in input order. Each
//! query gets a private open set, so queries share nothing but the grid.
//! Wall-clock timings go into a [`TimingCollector`] that the caller owns;
//! the batch hands back its [`TimingReport`] with the results.

use crate::grid::{CostGrid, GridCoord};
use crate::pathfinding::{AStar, GridPath, SearchConfig, SearchError, SearchOutcome, SearchStats};
use log::debug;
use rustc_hash::FxHashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Timer name for a single query
pub const QUERY_TIMER: &str = "find_path";
/// Timer name for a whole batch
pub const BATCH_TIMER: &str = "run_batch";

/// One (start, goal) request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Query {
    /// Start cell
    pub start: GridCoord,
    /// Goal cell
    pub goal: GridCoord,
}

impl Query {
    /// Creates a query
    pub fn new(start: GridCoord, goal: GridCoord) -> Self {
        Self { start, goal }
    }
}

impl From<((i32, i32), (i32, i32))> for Query {
    fn from((start, goal): ((i32, i32), (i32, i32))) -> Self {
        Query::new(start.into(), goal.into())
    }
}

/// Answer to one [`Query`]
#[derive(Clone, Debug, PartialEq)]
pub struct QueryResult {
    /// The request
    pub query: Query,
    /// Found path or NotFound
    pub outcome: SearchOutcome,
    /// Search counters
    pub stats: SearchStats,
    /// Wall-clock time spent on the search
    pub elapsed: Duration,
}

impl QueryResult {
    /// The path, if one was found
    pub fn path(&self) -> Option<&GridPath> {
        match &self.outcome {
            SearchOutcome::Found(path) => Some(path),
            SearchOutcome::NotFound => None,
        }
    }

    /// Total path cost, if a path was found
    pub fn total_cost(&self) -> Option<f64> {
        self.path().map(|p| p.total_cost)
    }
}

/// Results of a batch, in query order, with their timings
#[derive(Clone, Debug)]
pub struct BatchReport {
    /// One entry per query
    pub results: Vec<QueryResult>,
    /// Per-timer summary
    pub timings: TimingReport,
}

impl BatchReport {
    /// Number of queries that reached their goal
    pub fn found(&self) -> usize {
        self.results.iter().filter(|r| r.path().is_some()).count()
    }
}

/// Collects named wall-clock durations.
///
/// The collector is a plain value: create one, pass it where timings are
/// taken and call [`report`](Self::report) when done.
#[derive(Clone, Debug, Default)]
pub struct TimingCollector {
    samples: FxHashMap<String, Vec<Duration>>,
}

impl TimingCollector {
    /// Creates an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one sample under `name`.
    pub fn record(&mut self, name: &str, elapsed: Duration) {
        self.samples.entry(name.to_owned()).or_default().push(elapsed);
    }

    /// Runs `f`, recording its wall-clock time under `name`.
    pub fn time<T>(&mut self, name: &str, f: impl FnOnce() -> T) -> T {
        let started = Instant::now();
        let out = f();
        self.record(name, started.elapsed());
        out
    }

    /// Samples recorded under `name`
    pub fn samples(&self, name: &str) -> &[Duration] {
        self.samples.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Drops every sample
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Summarises the samples per name, sorted by name.
    pub fn report(&self) -> TimingReport {
        let mut entries: Vec<TimingEntry> = self
            .samples
            .iter()
            .filter(|(_, samples)| !samples.is_empty())
            .map(|(name, samples)| TimingEntry::summarise(name, samples))
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        TimingReport { entries }
    }
}

/// Summary of the samples recorded under one name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimingEntry {
    /// Timer name
    pub name: String,
    /// Number of samples
    pub calls: usize,
    /// Sum of all samples
    pub total: Duration,
    /// Longest sample
    pub max: Duration,
}

impl TimingEntry {
    fn summarise(name: &str, samples: &[Duration]) -> Self {
        TimingEntry {
            name: name.to_owned(),
            calls: samples.len(),
            total: samples.iter().sum(),
            max: samples.iter().copied().max().unwrap_or_default(),
        }
    }

    /// Mean sample, zero when there are no calls
    pub fn mean(&self) -> Duration {
        u32::try_from(self.calls)
            .ok()
            .filter(|&n| n > 0)
            .map_or(Duration::ZERO, |n| self.total / n)
    }
}

/// Per-name timing summary
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimingReport {
    /// One entry per timer, sorted by name
    pub entries: Vec<TimingEntry>,
}

impl TimingReport {
    /// Entry for `name`, if anything was recorded under it
    pub fn get(&self, name: &str) -> Option<&TimingEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

impl fmt::Display for TimingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in &self.entries {
            writeln!(
                f,
                "{} called {} times. Execution time max: {:.3}s, mean: {:.3}s",
                e.name,
                e.calls,
                e.max.as_secs_f64(),
                e.mean().as_secs_f64()
            )?;
        }
        Ok(())
    }
}

/// Answers every query against `grid` in order.
///
/// The configuration is validated once up front. A query whose start or goal
/// lies outside the grid aborts the batch with
/// [`SearchError::OutOfBounds`]; a query without a route is a `NotFound`
/// result, not an error.
pub fn run_batch(grid: &CostGrid, queries: &[Query], config: &SearchConfig) -> Result<BatchReport, SearchError> {
    let mut timings = TimingCollector::new();
    let results = run_batch_timed(grid, queries, config, &mut timings)?;
    Ok(BatchReport {
        results,
        timings: timings.report(),
    })
}

/// Like [`run_batch`], recording timings into a caller-owned collector.
pub fn run_batch_timed(
    grid: &CostGrid,
    queries: &[Query],
    config: &SearchConfig,
    timings: &mut TimingCollector,
) -> Result<Vec<QueryResult>, SearchError> {
    let search = AStar::new(grid, config.clone())?;
    let batch_started = Instant::now();
    let mut results = Vec::with_capacity(queries.len());

    for &query in queries {
        let started = Instant::now();
        let result = search.find_path(query.start, query.goal)?;
        let elapsed = started.elapsed();
        timings.record(QUERY_TIMER, elapsed);

        results.push(QueryResult {
            query,
            outcome: result.outcome,
            stats: result.stats,
            elapsed,
        });
    }

    let elapsed = batch_started.elapsed();
    timings.record(BATCH_TIMER, elapsed);
    debug!(
        "[Batch] {} queries, {} found, {:.3}s",
        results.len(),
        results.iter().filter(|r| r.path().is_some()).count(),
        elapsed.as_secs_f64()
    );
    Ok(results)
}
