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

use std::sync::Arc;

use carbonsplit_common_exception::ErrorCode;
use carbonsplit_common_exception::Result;
use carbonsplit_query_config::InnerCarbonConfig;
use carbonsplit_query_config::InnerStorageConfig;
use carbonsplit_storages_carbondata::predicate::ColumnType;
use carbonsplit_storages_carbondata::predicate::Domain;
use carbonsplit_storages_carbondata::predicate::HiveColumnHandle;
use carbonsplit_storages_carbondata::predicate::Range;
use carbonsplit_storages_carbondata::predicate::ValueSet;
use carbonsplit_storages_carbondata::pruning::BlockPruner;
use carbonsplit_storages_carbondata::translate;
use carbonsplit_storages_carbondata::CarbonColumn;
use carbonsplit_storages_carbondata::CarbonSplitPayload;
use carbonsplit_storages_carbondata::CarbonTableCache;
use carbonsplit_storages_carbondata::CarbonTableReader;
use carbonsplit_storages_carbondata::CarbondataSplitManager;
use carbonsplit_storages_carbondata::DefaultHdfsEnvironment;
use carbonsplit_storages_carbondata::DriverStatisticsRecorder;
use carbonsplit_storages_carbondata::ManifestTableReader;
use carbonsplit_storages_carbondata::SplitManager;
use carbonsplit_storages_carbondata::TableManifest;
use carbonsplit_storages_carbondata::TupleDomain;
use carbonsplit_storages_carbondata::CARBON_SPLIT_KEY;
use opendal::services;
use opendal::Operator;
use pretty_assertions::assert_eq;

use crate::common::hive_table;
use crate::common::orders_blocks;
use crate::common::region_equals;
use crate::common::scan_environment;
use crate::common::split_request;
use crate::common::string;
use crate::common::MemoryMetastore;
use crate::common::RecordingSplitManager;
use crate::common::CARBON_INPUT_FORMAT;
use crate::common::ORDERS_LOCATION;

const ORDERS_MANIFEST: &str = "sales/orders/Metadata/manifest.json";

fn orders_manifest() -> TableManifest {
    TableManifest {
        version: 7,
        table_path: None,
        columns: vec![
            CarbonColumn {
                name: "region".to_string(),
                column_type: ColumnType::String,
            },
            CarbonColumn {
                name: "amount".to_string(),
                column_type: ColumnType::Double,
            },
        ],
        blocks: orders_blocks(),
    }
}

async fn memory_operator(files: &[(&str, Vec<u8>)]) -> Result<Operator> {
    let operator = Operator::new(services::Memory::default())?.finish();
    for (path, content) in files {
        operator.write(path, content.clone()).await?;
    }
    Ok(operator)
}

fn reader(operator: Operator) -> ManifestTableReader {
    ManifestTableReader::create(operator, &InnerCarbonConfig::default())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_manifest_path() -> Result<()> {
    let reader = reader(memory_operator(&[]).await?);
    assert_eq!(reader.manifest_path(ORDERS_LOCATION), ORDERS_MANIFEST);
    assert_eq!(
        reader.manifest_path("s3://bucket/warehouse/t/"),
        "warehouse/t/Metadata/manifest.json"
    );
    assert_eq!(
        reader.manifest_path("/warehouse/t"),
        "warehouse/t/Metadata/manifest.json"
    );
    assert_eq!(reader.manifest_path("hdfs://x"), "Metadata/manifest.json");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_open_table_and_list_blocks() -> Result<()> {
    let manifest = serde_json::to_vec(&orders_manifest())?;
    let reader = reader(memory_operator(&[(ORDERS_MANIFEST, manifest)]).await?);
    let env = scan_environment(ORDERS_LOCATION);

    let table = reader.open_table(ORDERS_LOCATION, &env).await?;
    assert_eq!(table.name.to_string(), "sales.orders");
    assert_eq!(table.table_path, ORDERS_LOCATION);
    assert_eq!(table.version, 7);
    assert_eq!(
        table.column("amount").map(|c| &c.column_type),
        Some(&ColumnType::Double)
    );

    let blocks = reader.list_blocks(&table, &env).await?;
    assert_eq!(blocks, orders_blocks());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_table_path_falls_back_to_location() -> Result<()> {
    let env = scan_environment(ORDERS_LOCATION);

    let empty = TableManifest {
        table_path: Some("".to_string()),
        ..orders_manifest()
    };
    let table = reader(memory_operator(&[(ORDERS_MANIFEST, serde_json::to_vec(&empty)?)]).await?)
        .open_table(ORDERS_LOCATION, &env)
        .await?;
    assert_eq!(table.table_path, ORDERS_LOCATION);

    let explicit = TableManifest {
        table_path: Some("hdfs://y/warehouse/orders".to_string()),
        ..orders_manifest()
    };
    let table = reader(memory_operator(&[(ORDERS_MANIFEST, serde_json::to_vec(&explicit)?)]).await?)
        .open_table(ORDERS_LOCATION, &env)
        .await?;
    assert_eq!(table.table_path, "hdfs://y/warehouse/orders");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_manifest_read_failures() -> Result<()> {
    let reader = reader(
        memory_operator(&[(ORDERS_MANIFEST, b"{\"columns\": [".to_vec())]).await?,
    );

    let env = scan_environment(ORDERS_LOCATION);
    let err = reader.open_table(ORDERS_LOCATION, &env).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::BLOCK_DISCOVERY_ERROR);
    assert!(err.message().starts_with("malformed carbon manifest"));

    let missing = "hdfs://x/sales/missing";
    let err = reader
        .open_table(missing, &scan_environment(missing))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::BLOCK_DISCOVERY_ERROR);
    assert!(err.message().starts_with("cannot read carbon manifest"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_plan_orders_from_manifest() -> Result<()> {
    let manifest = serde_json::to_vec(&orders_manifest())?;
    let operator = memory_operator(&[(ORDERS_MANIFEST, manifest)]).await?;
    let settings = InnerCarbonConfig::default();

    let manager = CarbondataSplitManager::create(
        &settings,
        Arc::new(MemoryMetastore::default().with_table(hive_table(
            "sales",
            "orders",
            ORDERS_LOCATION,
            CARBON_INPUT_FORMAT,
        ))),
        Arc::new(DefaultHdfsEnvironment::create(&InnerStorageConfig::default())),
        Arc::new(ManifestTableReader::create(operator, &settings)),
        CarbonTableCache::create(&settings),
        Arc::new(DriverStatisticsRecorder::create()),
        Arc::new(RecordingSplitManager::new(vec![])),
    );

    let source = manager
        .get_splits(&split_request("sales", "orders", region_equals("EU")))
        .await?;
    assert_eq!(source.len(), 1);

    let payload =
        CarbonSplitPayload::from_json(source.splits()[0].property(CARBON_SPLIT_KEY).unwrap_or(""))?;
    assert_eq!(payload.blocks.len(), 1);
    assert_eq!(payload.blocks[0].file_path, orders_blocks()[0].file_path);
    assert_eq!(manager.table_cache().len(), 1);
    Ok(())
}

#[test]
fn test_unrecorded_null_count_keeps_the_block() -> Result<()> {
    let manifest: TableManifest = serde_json::from_str(
        r#"{
            "version": 1,
            "columns": [{"name": "region", "column_type": "String"}],
            "blocks": [{
                "file_path": "hdfs://x/sales/orders/part-0.carbondata",
                "offset": 0,
                "length": 1024,
                "row_count": 100,
                "column_statistics": {
                    "region": {"min": {"String": "AS"}, "max": {"String": "EU"}}
                }
            }]
        }"#,
    )?;
    let stats = &manifest.blocks[0].column_statistics["region"];
    assert_eq!(stats.null_count, None);

    let region = HiveColumnHandle::regular("region", ColumnType::String);
    let only_null = translate(&TupleDomain::with_column_domains([(
        region.clone(),
        Domain::only_null(),
    )]));
    let (kept, _) = BlockPruner::prune(&only_null, manifest.blocks.clone());
    assert_eq!(kept.len(), 1);

    let absent_or_null = translate(&TupleDomain::with_column_domains([(
        region,
        Domain::create(ValueSet::Ranges(vec![Range::equal(string("ZZ"))]), true),
    )]));
    let (kept, _) = BlockPruner::prune(&absent_or_null, manifest.blocks.clone());
    assert_eq!(kept.len(), 1);

    // Only a recorded zero count rules nulls out.
    let mut counted = manifest.blocks;
    if let Some(stats) = counted[0].column_statistics.get_mut("region") {
        stats.null_count = Some(0);
    }
    let (kept, _) = BlockPruner::prune(&only_null, counted);
    assert!(kept.is_empty());
    Ok(())
}
