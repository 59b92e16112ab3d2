use super::parse;
use crate::cli::transfer_options;
use parsync_core::config::ParsyncConfig;

#[test]
fn options_from_partial_and_bwlimit() {
    assert!(transfer_options(false, None).is_empty());
    assert_eq!(transfer_options(true, None), vec!["--partial", "--inplace"]);
    assert_eq!(
        transfer_options(true, Some(250)),
        vec!["--partial", "--inplace", "--bwlimit=250"]
    );
    assert!(transfer_options(false, Some(0)).is_empty());
}

#[test]
fn specs_share_destination_and_options() {
    let cli = parse(&["parsync", "--partial", "/srv/photos/", "docs", "/backup"]);
    let specs = cli.specs();
    assert_eq!(specs.len(), 2);
    assert_eq!(specs[0].name, "photos");
    assert_eq!(specs[0].source, "/srv/photos/");
    assert_eq!(specs[1].name, "docs");
    assert!(specs.iter().all(|s| s.destination == "/backup"));
    assert!(specs.iter().all(|s| s.options == ["--partial", "--inplace"]));
}

#[test]
fn cli_overrides_config() {
    let cli = parse(&["parsync", "--parallel", "0", "--no-archive", "--fail-fast", "a", "b"]);
    let mut cfg = ParsyncConfig {
        workers: 6,
        ..ParsyncConfig::default()
    };
    cli.apply_to(&mut cfg);
    assert_eq!(cfg.workers, 0);
    assert!(!cfg.archive);
    assert!(cfg.fail_fast);
    assert_eq!(cfg.program, "rsync");
}

#[test]
fn absent_flags_leave_config_alone() {
    let cli = parse(&["parsync", "a", "b"]);
    let mut cfg = ParsyncConfig {
        workers: 6,
        fail_fast: true,
        ..ParsyncConfig::default()
    };
    cli.apply_to(&mut cfg);
    assert_eq!(cfg.workers, 6);
    assert!(cfg.archive);
    assert!(cfg.fail_fast);
}
