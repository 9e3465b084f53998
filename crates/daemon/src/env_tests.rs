// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn data_dir_honors_override() {
    std::env::set_var("GAFFER_DATA_DIR", "/srv/gaffer-data");
    assert_eq!(data_dir(), PathBuf::from("/srv/gaffer-data"));
    std::env::remove_var("GAFFER_DATA_DIR");
    assert!(data_dir().ends_with("gaffer"));
}

#[test]
#[serial]
fn port_falls_back_on_garbage() {
    std::env::set_var("GAFFER_PORT", "not-a-port");
    assert_eq!(port(), 4520);
    std::env::set_var("GAFFER_PORT", "9000");
    assert_eq!(port(), 9000);
    std::env::remove_var("GAFFER_PORT");
}

#[test]
#[serial]
fn agent_bin_empty_is_none() {
    std::env::set_var("GAFFER_AGENT_BIN", "");
    assert_eq!(agent_bin(), None);
    std::env::set_var("GAFFER_AGENT_BIN", "/opt/assistant");
    assert_eq!(agent_bin(), Some(PathBuf::from("/opt/assistant")));
    std::env::remove_var("GAFFER_AGENT_BIN");
}
