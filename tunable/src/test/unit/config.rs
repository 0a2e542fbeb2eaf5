use std::collections::HashMap;

use test_case::test_case;

use crate::config::parse_flag;
use crate::TuningConfig;

#[test]
fn test_defaults() {
    let config = TuningConfig::default();
    assert!(config.numerical_check);
    assert!(!config.duplicate_inputs);
    assert_eq!(TuningConfig::builder().build(), config);
}

#[test]
fn test_builder_overrides() {
    let config = TuningConfig::builder().numerical_check(false).duplicate_inputs(true).build();
    assert_eq!(config, TuningConfig { numerical_check: false, duplicate_inputs: true });
}

#[test_case(&[], true, false; "unset")]
#[test_case(&[("GEMMTUNE_NUMERICAL_CHECK", "0")], false, false; "check disabled")]
#[test_case(&[("GEMMTUNE_DUPLICATE_INPUTS", "1")], true, true; "inputs duplicated")]
#[test_case(&[("GEMMTUNE_NUMERICAL_CHECK", "off"), ("GEMMTUNE_DUPLICATE_INPUTS", "yes")], false, true; "words")]
#[test_case(&[("GEMMTUNE_NUMERICAL_CHECK", "maybe")], true, false; "unrecognized")]
fn test_from_lookup(vars: &[(&str, &str)], numerical_check: bool, duplicate_inputs: bool) {
    let vars: HashMap<&str, &str> = vars.iter().copied().collect();
    let config = TuningConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));
    assert_eq!(config, TuningConfig { numerical_check, duplicate_inputs });
}

#[test_case("1", Some(true))]
#[test_case(" TRUE ", Some(true))]
#[test_case("0", Some(false))]
#[test_case("No", Some(false))]
#[test_case("", None)]
#[test_case("2", None)]
fn test_parse_flag(value: &str, expected: Option<bool>) {
    assert_eq!(parse_flag(value), expected);
}
