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

#![allow(clippy::uninlined_format_args)]

mod block;
mod carbon_table;
mod existence_filter;
mod filter_expr;
mod filter_translator;
mod hdfs_environment;
mod manifest_reader;
pub mod metastore;
mod multi_block_split;
pub mod predicate;
pub mod pruning;
mod query_context;
mod query_stats;
mod schema_table_name;
mod session;
mod split;
mod split_manager;
mod split_packager;
mod table_cache;
mod table_reader;

pub use block::BlockDescriptor;
pub use block::ColumnStatistics;
pub use carbon_table::CarbonColumn;
pub use carbon_table::CarbonTable;
pub use existence_filter::ExistenceFilter;
pub use filter_expr::ColumnRef;
pub use filter_expr::FilterExpr;
pub use filter_translator::translate;
pub use filter_translator::FilterTranslation;
pub use filter_translator::FilterTranslator;
pub use hdfs_environment::DefaultHdfsEnvironment;
pub use hdfs_environment::HdfsEnvironment;
pub use hdfs_environment::ScanEnvironment;
pub use manifest_reader::ManifestTableReader;
pub use manifest_reader::TableManifest;
pub use multi_block_split::BlockLocation;
pub use multi_block_split::CarbonMultiBlockSplit;
pub use multi_block_split::CarbonSplitPayload;
pub use predicate::Scalar;
pub use predicate::TupleDomain;
pub use query_context::QueryContext;
pub use query_context::QueryId;
pub use query_stats::DriverStatisticsRecorder;
pub use query_stats::Milestone;
pub use query_stats::QueryStatistic;
pub use query_stats::QueryStatisticsRecorder;
pub use query_stats::QueryTimeline;
pub use schema_table_name::SchemaTableName;
pub use session::ConnectorSession;
pub use session::TransactionHandle;
pub use split::FixedSplitSource;
pub use split::HivePartitionKey;
pub use split::HiveSplit;
pub use split::HostAddress;
pub use split::SplitSchedulingStrategy;
pub use split_manager::CarbondataSplitManager;
pub use split_manager::HiveTableHandle;
pub use split_manager::PlanningState;
pub use split_manager::SplitManager;
pub use split_manager::SplitRequest;
pub use split_packager::SplitPackager;
pub use split_packager::CARBON_SPLIT_KEY;
pub use split_packager::INDEX_KEY;
pub use split_packager::QUERY_ID_KEY;
pub use split_packager::TABLE_PATH_KEY;
pub use table_cache::CarbonTableCache;
pub use table_reader::CarbonTableReader;
