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

use carbonsplit_common_exception::ErrorCode;
use carbonsplit_common_exception::Result;
use carbonsplit_storages_carbondata::predicate::ColumnType;
use carbonsplit_storages_carbondata::BlockDescriptor;
use carbonsplit_storages_carbondata::CarbonMultiBlockSplit;
use carbonsplit_storages_carbondata::CarbonSplitPayload;
use carbonsplit_storages_carbondata::ColumnRef;
use carbonsplit_storages_carbondata::FilterExpr;
use carbonsplit_storages_carbondata::HostAddress;
use carbonsplit_storages_carbondata::QueryContext;
use carbonsplit_storages_carbondata::QueryId;
use carbonsplit_storages_carbondata::SplitPackager;
use carbonsplit_storages_carbondata::CARBON_SPLIT_KEY;
use carbonsplit_storages_carbondata::INDEX_KEY;
use carbonsplit_storages_carbondata::QUERY_ID_KEY;
use carbonsplit_storages_carbondata::TABLE_PATH_KEY;
use pretty_assertions::assert_eq;

use crate::common::hive_table;
use crate::common::string;
use crate::common::CARBON_INPUT_FORMAT;
use crate::common::ORDERS_LOCATION;

fn multi_block_split(paths: &[&str], hosts: &[&str]) -> CarbonMultiBlockSplit {
    CarbonMultiBlockSplit {
        blocks: paths
            .iter()
            .map(|p| BlockDescriptor::new(*p, 0, 1024, 100))
            .collect(),
        locations: hosts.iter().map(|h| h.to_string()).collect(),
        filter: FilterExpr::Equals {
            column: ColumnRef::new("region", ColumnType::String),
            value: string("EU"),
        },
        query_id: QueryId::from("8c1e0c4f"),
    }
}

fn context() -> QueryContext {
    QueryContext::create(QueryId::from("8c1e0c4f"), ORDERS_LOCATION)
}

#[test]
fn test_pack_sets_required_keys() -> Result<()> {
    let mut table = hive_table("sales", "orders", ORDERS_LOCATION, CARBON_INPUT_FORMAT);
    // Split keys win over a clashing serde parameter.
    table
        .storage
        .serde_parameters
        .insert(INDEX_KEY.to_string(), "stale".to_string());

    let split = multi_block_split(&["part-0", "part-1"], &["node1:50010", "[::1]:50010"]);
    let hive_split = SplitPackager::pack(&split, &table, &context(), 3)?;

    assert_eq!(hive_split.property(TABLE_PATH_KEY), Some(ORDERS_LOCATION));
    assert_eq!(hive_split.property(QUERY_ID_KEY), Some("8c1e0c4f"));
    assert_eq!(hive_split.property(INDEX_KEY), Some("3"));
    assert_eq!(hive_split.property("serialization.format"), Some("1"));
    assert_eq!(hive_split.property("field.delim"), Some(","));

    let payload = CarbonSplitPayload::from_json(hive_split.property(CARBON_SPLIT_KEY).unwrap_or(""))?;
    assert_eq!(payload.query_id, QueryId::from("8c1e0c4f"));
    assert_eq!(payload.filter, split.filter);
    let paths: Vec<_> = payload.blocks.iter().map(|b| b.file_path.as_str()).collect();
    assert_eq!(paths, vec!["part-0", "part-1"]);

    assert_eq!(hive_split.database, "sales");
    assert_eq!(hive_split.table, "orders");
    assert_eq!(hive_split.partition_name, "orders");
    assert_eq!(hive_split.path, ORDERS_LOCATION);
    assert_eq!(
        (hive_split.start, hive_split.length, hive_split.file_size),
        (0, 0, 0)
    );
    assert_eq!(hive_split.addresses, vec![
        HostAddress::new("node1", Some(50010)),
        HostAddress::new("::1", Some(50010)),
    ]);
    assert!(!hive_split.force_local_scheduling);
    Ok(())
}

#[test]
fn test_pack_all_numbers_from_one() -> Result<()> {
    let table = hive_table("sales", "orders", ORDERS_LOCATION, CARBON_INPUT_FORMAT);
    let splits = vec![
        multi_block_split(&["a"], &["n1"]),
        multi_block_split(&["b"], &["n2"]),
        multi_block_split(&["c"], &[]),
    ];
    let packed = SplitPackager::pack_all(&splits, &table, &context())?;
    let indexes: Vec<_> = packed.iter().filter_map(|s| s.property(INDEX_KEY)).collect();
    assert_eq!(indexes, vec!["1", "2", "3"]);

    // Packing is a pure function of its input.
    assert_eq!(packed, SplitPackager::pack_all(&splits, &table, &context())?);
    Ok(())
}

#[test]
fn test_pack_rejects_malformed_host() {
    let table = hive_table("sales", "orders", ORDERS_LOCATION, CARBON_INPUT_FORMAT);
    let split = multi_block_split(&["a"], &["node1:http"]);
    let err = SplitPackager::pack(&split, &table, &context(), 1).unwrap_err();
    assert_eq!(err.code(), ErrorCode::BAD_ARGUMENTS);
}

#[test]
fn test_host_address() -> Result<()> {
    let cases = [
        ("node1", HostAddress::new("node1", None)),
        ("node1:50010", HostAddress::new("node1", Some(50010))),
        (" 10.0.0.1:9000 ", HostAddress::new("10.0.0.1", Some(9000))),
        ("[fe80::1]", HostAddress::new("fe80::1", None)),
        ("[fe80::1]:9000", HostAddress::new("fe80::1", Some(9000))),
        ("fe80::1", HostAddress::new("fe80::1", None)),
    ];
    for (text, expected) in cases {
        assert_eq!(text.parse::<HostAddress>()?, expected, "{text}");
    }

    for invalid in ["", ":9000", "node1:", "node1:99999", "[fe80::1", "[fe80::1]9000"] {
        assert!(invalid.parse::<HostAddress>().is_err(), "{invalid}");
    }

    assert_eq!(HostAddress::new("node1", Some(1)).to_string(), "node1:1");
    assert_eq!(HostAddress::new("fe80::1", Some(1)).to_string(), "[fe80::1]:1");
    Ok(())
}
