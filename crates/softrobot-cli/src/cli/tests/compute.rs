//! Tests for pcc and tendons subcommands.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::Path;

#[test]
fn cli_parse_pcc() {
    match parse(&["softrobot", "pcc", "params.json"]) {
        CliCommand::Pcc {
            params,
            tendons,
            max_retries,
        } => {
            assert_eq!(params, Path::new("params.json"));
            assert!(!tendons);
            assert!(max_retries.is_none());
        }
        _ => panic!("expected Pcc"),
    }
}

#[test]
fn cli_parse_pcc_with_tendons_and_retries() {
    match parse(&["softrobot", "pcc", "p.json", "--tendons", "--max-retries", "0"]) {
        CliCommand::Pcc {
            tendons,
            max_retries,
            ..
        } => {
            assert!(tendons);
            assert_eq!(max_retries, Some(0));
        }
        _ => panic!("expected Pcc with --tendons"),
    }
}

#[test]
fn cli_parse_tendons_analyze() {
    match parse(&["softrobot", "tendons", "p.json", "--analyze"]) {
        CliCommand::Tendons { params, analyze } => {
            assert_eq!(params, Path::new("p.json"));
            assert!(analyze);
        }
        _ => panic!("expected Tendons"),
    }
}

#[test]
fn cli_bridge_flag_is_global() {
    let cli = Cli::try_parse_from(["softrobot", "pcc", "p.json", "--bridge"]).unwrap();
    assert!(cli.bridge);
    let cli = Cli::try_parse_from(["softrobot", "me"]).unwrap();
    assert!(!cli.bridge);
}

#[test]
fn cli_pcc_requires_params_file() {
    assert!(Cli::try_parse_from(["softrobot", "pcc"]).is_err());
}
