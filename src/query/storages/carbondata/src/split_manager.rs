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

use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use std::sync::Arc;

use carbonsplit_common_exception::ErrorCode;
use carbonsplit_common_exception::Result;
use carbonsplit_query_config::InnerCarbonConfig;
use carbonsplit_storages_common_cache::TableCacheKey;
use chrono::Utc;
use log::debug;
use log::error;
use log::info;
use log::warn;

use crate::metastore::CatalogLookup;
use crate::metastore::HiveMetastore;
use crate::metastore::ResolvedTable;
use crate::metastore::Table;
use crate::pruning::BlockPruner;
use crate::CarbonTableCache;
use crate::CarbonTableReader;
use crate::ConnectorSession;
use crate::FilterTranslator;
use crate::FixedSplitSource;
use crate::HdfsEnvironment;
use crate::Milestone;
use crate::QueryContext;
use crate::QueryId;
use crate::QueryStatisticsRecorder;
use crate::SchemaTableName;
use crate::SplitPackager;
use crate::SplitSchedulingStrategy;
use crate::TransactionHandle;
use crate::TupleDomain;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HiveTableHandle {
    pub schema_table_name: SchemaTableName,
    pub compact_effective_predicate: TupleDomain,
}

impl HiveTableHandle {
    pub fn new(schema_table_name: SchemaTableName, predicate: TupleDomain) -> Self {
        HiveTableHandle {
            schema_table_name,
            compact_effective_predicate: predicate,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitRequest {
    pub transaction: TransactionHandle,
    pub session: ConnectorSession,
    pub table: HiveTableHandle,
    pub strategy: SplitSchedulingStrategy,
}

#[async_trait::async_trait]
pub trait SplitManager: Send + Sync {
    async fn get_splits(&self, request: &SplitRequest) -> Result<FixedSplitSource>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanningState {
    Start,
    FormatCheck,
    Fallback,
    MetadataResolved,
    FilterTranslated,
    BlocksPruned,
    SplitsPackaged,
    Done,
    Failed,
}

impl Display for PlanningState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlanningState::Start => "start",
            PlanningState::FormatCheck => "format_check",
            PlanningState::Fallback => "fallback",
            PlanningState::MetadataResolved => "metadata_resolved",
            PlanningState::FilterTranslated => "filter_translated",
            PlanningState::BlocksPruned => "blocks_pruned",
            PlanningState::SplitsPackaged => "splits_packaged",
            PlanningState::Done => "done",
            PlanningState::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

struct Planning<'a> {
    table: &'a SchemaTableName,
    state: PlanningState,
}

impl<'a> Planning<'a> {
    fn start(table: &'a SchemaTableName) -> Self {
        Planning {
            table,
            state: PlanningState::Start,
        }
    }

    fn advance(&mut self, next: PlanningState) {
        debug!(
            "split planning of {}: {} -> {}",
            self.table, self.state, next
        );
        self.state = next;
    }

    // A missing table is reported as is, anything else once as a planning failure.
    fn fail(&mut self, e: ErrorCode) -> ErrorCode {
        let failed_in = self.state;
        self.state = PlanningState::Failed;

        if e.code() == ErrorCode::UNKNOWN_TABLE {
            info!("split planning of {}: {}", self.table, e.message());
            return e;
        }

        error!(
            "split planning of {} failed in state {}: {}",
            self.table, failed_in, e
        );
        ErrorCode::GenericInternalError(format!(
            "Failed while trying to get splits of {}",
            self.table
        ))
        .set_cause(e)
    }
}

/// Plans splits of carbon tables and hands every other table to `fallback`.
pub struct CarbondataSplitManager {
    format_tag: String,
    catalog: CatalogLookup,
    environment: Arc<dyn HdfsEnvironment>,
    reader: Arc<dyn CarbonTableReader>,
    pruner: BlockPruner,
    table_cache: Arc<CarbonTableCache>,
    recorder: Arc<dyn QueryStatisticsRecorder>,
    fallback: Arc<dyn SplitManager>,
}

impl CarbondataSplitManager {
    pub fn create(
        settings: &InnerCarbonConfig,
        metastore: Arc<dyn HiveMetastore>,
        environment: Arc<dyn HdfsEnvironment>,
        reader: Arc<dyn CarbonTableReader>,
        table_cache: Arc<CarbonTableCache>,
        recorder: Arc<dyn QueryStatisticsRecorder>,
        fallback: Arc<dyn SplitManager>,
    ) -> Self {
        CarbondataSplitManager {
            format_tag: settings.format_tag.clone(),
            catalog: CatalogLookup::new(metastore),
            environment,
            pruner: BlockPruner::create(reader.clone(), settings),
            reader,
            table_cache,
            recorder,
            fallback,
        }
    }

    pub fn table_cache(&self) -> &Arc<CarbonTableCache> {
        &self.table_cache
    }

    #[fastrace::trace]
    #[async_backtrace::framed]
    async fn plan_carbon_splits(
        &self,
        request: &SplitRequest,
        table: &Table,
        query_id: &QueryId,
        planning: &mut Planning<'_>,
    ) -> Result<FixedSplitSource> {
        let name = &request.table.schema_table_name;
        let location = table.storage.location.as_str();
        let env = self
            .environment
            .context(&request.session, name, location)?;

        let key = TableCacheKey::new(&name.schema_name, &name.table_name, location);
        let carbon_table = self
            .table_cache
            .get_or_load(key, || self.reader.open_table(location, &env))
            .await?;

        let predicate = &request.table.compact_effective_predicate;
        let translation = FilterTranslator::translate(predicate);
        if !translation.degraded_columns.is_empty() {
            warn!(
                "query {}: {} predicate column(s) of {} evaluated by the engine only: {:?}",
                query_id,
                translation.degraded_columns.len(),
                name,
                translation.degraded_columns
            );
        }
        planning.advance(PlanningState::FilterTranslated);

        let splits = self
            .pruner
            .plan(&carbon_table, &translation.filter, predicate, query_id, &env)
            .await?;
        planning.advance(PlanningState::BlocksPruned);

        let context = QueryContext::create(query_id.clone(), carbon_table.table_path.as_str());
        let splits = SplitPackager::pack_all(&splits, table, &context)?;
        planning.advance(PlanningState::SplitsPackaged);

        Ok(FixedSplitSource::new(splits))
    }
}

#[async_trait::async_trait]
impl SplitManager for CarbondataSplitManager {
    #[async_backtrace::framed]
    async fn get_splits(&self, request: &SplitRequest) -> Result<FixedSplitSource> {
        let name = &request.table.schema_table_name;
        let mut planning = Planning::start(name);

        planning.advance(PlanningState::FormatCheck);
        let table = self
            .catalog
            .lookup(name)
            .await
            .map_err(|e| planning.fail(e))?;

        let table = match ResolvedTable::resolve(table, &self.format_tag) {
            ResolvedTable::Generic(table) => {
                planning.advance(PlanningState::Fallback);
                debug!(
                    "{} is stored as {}, planned by the generic split manager",
                    name, table.storage.input_format
                );
                return self.fallback.get_splits(request).await;
            }
            ResolvedTable::Carbon(table) => table,
        };
        planning.advance(PlanningState::MetadataResolved);

        let query_id = QueryId::generate();
        self.recorder.begin(&query_id);
        self.recorder
            .mark(&query_id, Milestone::BlockAllocation, Utc::now());

        match self
            .plan_carbon_splits(request, &table, &query_id, &mut planning)
            .await
        {
            Ok(source) => {
                self.recorder
                    .mark(&query_id, Milestone::BlockIdentification, Utc::now());
                self.recorder.flush(&query_id);
                planning.advance(PlanningState::Done);
                info!(
                    "query {}: planned {} carbon split(s) for {}",
                    query_id,
                    source.len(),
                    name
                );
                Ok(source)
            }
            Err(e) => {
                self.recorder.flush(&query_id);
                Err(planning.fail(e))
            }
        }
    }
}
