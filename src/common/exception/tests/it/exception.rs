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

use std::error::Error;

use carbonsplit_common_exception::ErrorCode;
use carbonsplit_common_exception::Result;
use carbonsplit_common_exception::ResultExt;
use carbonsplit_common_exception::SerializedError;
use carbonsplit_common_exception::ToErrorCode;
use pretty_assertions::assert_eq;

#[test]
fn test_format_with_error_codes() {
    assert_eq!(
        ErrorCode::Ok("test message 1").to_string(),
        "Ok. Code: 0, Text = test message 1."
    );

    assert_eq!(
        ErrorCode::UnknownTable("table `sales`.`missing` doesn't exist").to_string(),
        "UnknownTable. Code: 2002, Text = table `sales`.`missing` doesn't exist."
    );
}

#[test]
fn test_error_code_constants() {
    assert_eq!(ErrorCode::UNKNOWN_TABLE, 2002);
    assert_eq!(ErrorCode::METASTORE_UNAVAILABLE, 2003);
    assert_eq!(ErrorCode::BLOCK_DISCOVERY_ERROR, 3004);
    assert_eq!(ErrorCode::GENERIC_INTERNAL_ERROR, 1048);
    assert_eq!(ErrorCode::BlockDiscoveryError("x").code(), 3004);
    assert_eq!(ErrorCode::BlockDiscoveryError("x").name(), "BlockDiscoveryError");
}

#[test]
fn test_derive_from_std_error() {
    let fmt_error = std::fmt::Error {};

    let r: Result<()> = Err(fmt_error).map_err_to_code(ErrorCode::Unimplemented, || 123);
    assert_eq!(
        "Unimplemented. Code: 1002, Text = 123, cause: an error occurred when formatting an argument.",
        r.unwrap_err().to_string()
    );
}

#[test]
fn test_cause_is_kept_as_source() {
    let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
    let storage: ErrorCode = io.into();
    assert_eq!(storage.code(), ErrorCode::STORAGE_OTHER);

    let wrapped = ErrorCode::GenericInternalError("Failed while trying to get splits")
        .set_cause(storage.clone());
    let source = wrapped.source().expect("cause must be exposed as source");
    assert_eq!(source.to_string(), storage.to_string());
    assert!(wrapped.message().contains("disk on fire"));
}

#[test]
fn test_result_ext() {
    let r: Result<()> = Err(ErrorCode::StorageOther("read failed"));
    let e = r.with_context(|| "reading manifest").unwrap_err();
    assert_eq!(e.message(), "reading manifest\nread failed");

    let r: Result<()> = Err(ErrorCode::StorageOther("read failed"));
    let e = r
        .wrap_err(ErrorCode::BlockDiscoveryError, "cannot list blocks")
        .unwrap_err();
    assert_eq!(e.code(), ErrorCode::BLOCK_DISCOVERY_ERROR);
    assert!(e.cause().is_some());
}

#[test]
fn test_clone_shares_cause() {
    let e = ErrorCode::MetastoreUnavailable("connect timed out")
        .set_cause(std::io::Error::new(std::io::ErrorKind::TimedOut, "timeout"));
    let cloned = e.clone();
    assert_eq!(e.to_string(), cloned.to_string());
    assert_eq!(e.code(), cloned.code());
}

#[test]
fn test_serialized_error_round_trip() {
    let e = ErrorCode::TableInfoError("bad location");
    let serialized = SerializedError::from(&e);
    let back = ErrorCode::from(&serialized);
    assert_eq!(back.code(), ErrorCode::TABLE_INFO_ERROR);
    assert_eq!(back.message(), "bad location");
}
