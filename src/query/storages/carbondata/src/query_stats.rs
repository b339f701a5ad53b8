// Copyright 2021 Datafuse Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

use chrono::DateTime;
use chrono::Utc;
use log::info;
use log::warn;
use parking_lot::Mutex;

use crate::QueryId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Milestone {
    /// Block discovery starts.
    BlockAllocation,
    /// Block discovery is done and splits are packaged.
    BlockIdentification,
}

impl Display for Milestone {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Milestone::BlockAllocation => write!(f, "Time taken to load blocks"),
            Milestone::BlockIdentification => write!(f, "Time taken to identify Blocks to scan"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryStatistic {
    pub milestone: Milestone,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryTimeline {
    pub query_id: QueryId,
    pub statistics: Vec<QueryStatistic>,
}

impl QueryTimeline {
    pub fn elapsed_ms(&self, from: Milestone, to: Milestone) -> Option<i64> {
        let at = |m| {
            self.statistics
                .iter()
                .find(|s| s.milestone == m)
                .map(|s| s.timestamp)
        };
        Some((at(to)? - at(from)?).num_milliseconds())
    }
}

/// Diagnostics only: implementations log and drop their own failures.
pub trait QueryStatisticsRecorder: Send + Sync {
    fn begin(&self, query_id: &QueryId);

    fn mark(&self, query_id: &QueryId, milestone: Milestone, timestamp: DateTime<Utc>);

    fn flush(&self, query_id: &QueryId);
}

const RECENT_TIMELINES: usize = 128;

/// Keeps a timeline per running query and logs it on flush.
///
/// The last flushed timelines stay available through [`Self::recent`].
pub struct DriverStatisticsRecorder {
    running: Mutex<HashMap<QueryId, Vec<QueryStatistic>>>,
    recent: Mutex<VecDeque<QueryTimeline>>,
}

impl DriverStatisticsRecorder {
    pub fn create() -> Self {
        DriverStatisticsRecorder {
            running: Mutex::new(HashMap::new()),
            recent: Mutex::new(VecDeque::with_capacity(RECENT_TIMELINES)),
        }
    }

    pub fn running_queries(&self) -> usize {
        self.running.lock().len()
    }

    pub fn timeline(&self, query_id: &QueryId) -> Option<QueryTimeline> {
        self.running.lock().get(query_id).map(|statistics| QueryTimeline {
            query_id: query_id.clone(),
            statistics: statistics.clone(),
        })
    }

    /// Flushed timelines, oldest first.
    pub fn recent(&self) -> Vec<QueryTimeline> {
        self.recent.lock().iter().cloned().collect()
    }
}

impl Default for DriverStatisticsRecorder {
    fn default() -> Self {
        Self::create()
    }
}

impl QueryStatisticsRecorder for DriverStatisticsRecorder {
    fn begin(&self, query_id: &QueryId) {
        let mut running = self.running.lock();
        if running.insert(query_id.clone(), vec![]).is_some() {
            warn!("query statistics of {} restarted", query_id);
        }
    }

    fn mark(&self, query_id: &QueryId, milestone: Milestone, timestamp: DateTime<Utc>) {
        match self.running.lock().get_mut(query_id) {
            Some(statistics) => statistics.push(QueryStatistic {
                milestone,
                timestamp,
            }),
            None => warn!(
                "query statistic '{}' dropped, query {} is not recording",
                milestone, query_id
            ),
        }
    }

    fn flush(&self, query_id: &QueryId) {
        let Some(statistics) = self.running.lock().remove(query_id) else {
            warn!("query {} is not recording, nothing to flush", query_id);
            return;
        };

        let timeline = QueryTimeline {
            query_id: query_id.clone(),
            statistics,
        };
        match timeline.elapsed_ms(Milestone::BlockAllocation, Milestone::BlockIdentification) {
            Some(ms) => info!(
                "query {}: {} milestones, block identification took {} ms",
                query_id,
                timeline.statistics.len(),
                ms
            ),
            None => info!(
                "query {}: {} milestones recorded",
                query_id,
                timeline.statistics.len()
            ),
        }

        let mut recent = self.recent.lock();
        if recent.len() == RECENT_TIMELINES {
            recent.pop_front();
        }
        recent.push_back(timeline);
    }
}
