//! Tests for resolve and fetch subcommands.

use super::{parse, parse_err};
use crate::cli::CliCommand;
use clap::error::ErrorKind;
use std::path::Path;

#[test]
fn cli_parse_resolve_version() {
    match parse(&["snaprev", "resolve", "--version", "72.0.3586.2"]) {
        CliCommand::Resolve {
            base,
            max_attempts,
            output,
        } => {
            assert_eq!(base.chrome_version.as_deref(), Some("72.0.3586.2"));
            assert!(base.base_revision.is_none());
            assert!(max_attempts.is_none());
            assert!(output.is_none());
        }
        _ => panic!("expected Resolve"),
    }
}

#[test]
fn cli_parse_resolve_base_revision_with_overrides() {
    match parse(&[
        "snaprev",
        "resolve",
        "--base-revision",
        "612437",
        "--max-attempts",
        "10",
        "--output",
        "/tmp/revs.json",
    ]) {
        CliCommand::Resolve {
            base,
            max_attempts,
            output,
        } => {
            assert_eq!(base.base_revision, Some(612437));
            assert_eq!(max_attempts, Some(10));
            assert_eq!(output.as_deref(), Some(Path::new("/tmp/revs.json")));
        }
        _ => panic!("expected Resolve"),
    }
}

#[test]
fn cli_resolve_requires_a_starting_point() {
    assert_eq!(
        parse_err(&["snaprev", "resolve"]),
        ErrorKind::MissingRequiredArgument
    );
}

#[test]
fn cli_resolve_version_and_revision_conflict() {
    assert_eq!(
        parse_err(&[
            "snaprev",
            "resolve",
            "--version",
            "72.0.3586.2",
            "--base-revision",
            "1"
        ]),
        ErrorKind::ArgumentConflict
    );
}

#[test]
fn cli_parse_fetch_from_table() {
    match parse(&[
        "snaprev",
        "fetch",
        "--table",
        "revisions.json",
        "--out-dir",
        "chrome",
        "--keep-archive",
        "chrome.zip",
    ]) {
        CliCommand::Fetch {
            source,
            max_attempts,
            out_dir,
            keep_archive,
        } => {
            assert_eq!(source.table.as_deref(), Some(Path::new("revisions.json")));
            assert!(source.chrome_version.is_none());
            assert!(max_attempts.is_none());
            assert_eq!(out_dir.as_deref(), Some(Path::new("chrome")));
            assert_eq!(keep_archive.as_deref(), Some(Path::new("chrome.zip")));
        }
        _ => panic!("expected Fetch"),
    }
}

#[test]
fn cli_parse_fetch_base_revision() {
    match parse(&["snaprev", "fetch", "--base-revision", "1000", "--max-attempts", "2"]) {
        CliCommand::Fetch {
            source,
            max_attempts,
            out_dir,
            ..
        } => {
            assert_eq!(source.base_revision, Some(1000));
            assert_eq!(max_attempts, Some(2));
            assert!(out_dir.is_none());
        }
        _ => panic!("expected Fetch"),
    }
}

#[test]
fn cli_fetch_table_conflicts_with_version() {
    assert_eq!(
        parse_err(&[
            "snaprev",
            "fetch",
            "--table",
            "t.json",
            "--version",
            "72.0.3586.2"
        ]),
        ErrorKind::ArgumentConflict
    );
}
