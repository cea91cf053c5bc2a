// End-to-end checks: sheet rows in, OpenControl documents out, through both the
// library pipeline and the `ocsheet` binary.
mod support;

use anyhow::Result;
use opencontrol_sheet::opencontrol::{CATALOG_FILE_NAME, FamilyDocument};
use opencontrol_sheet::{
    ControlError, ControlKey, Family, FamilyCode, IngestConfig, IngestError, MalformedPolicy,
    NarrativeEntry, OutputConfig, OutputLayout, SheetRow, SourceConfig, build_catalog,
    load_catalog_from_path, normalize_family, parse_control, read_csv_rows, validate_output_dir,
    write_catalog,
};
use serde_json::{Value, json};
use std::fs;
use std::process::Command;
use support::{
    SAMPLE_SHEET, ocsheet_binary, run_command, run_failing, scratch_dir, write_fixture,
};

fn ac() -> Family {
    Family::from(FamilyCode::AccessControl)
}

fn key(raw: &str) -> ControlKey {
    ControlKey(raw.to_string())
}

#[test]
fn literal_precedence_cases() {
    let cases: &[(&str, &str, NarrativeEntry)] = &[
        ("AC-1", "AC-1", NarrativeEntry::text_only()),
        ("AC-2a.", "AC-2", NarrativeEntry::for_enhancement("a")),
        ("AC-2a.1.", "AC-2", NarrativeEntry::for_enhancement("a.1")),
        ("AC-2 (21)", "AC-2 (21)", NarrativeEntry::text_only()),
        ("AC-3 (3)(a)", "AC-3 (3)", NarrativeEntry::for_enhancement("a")),
        ("AC-3 (3)(b)(1)", "AC-3 (3)", NarrativeEntry::for_enhancement("b")),
        ("AC-3   (3)(a)", "AC-3 (3)", NarrativeEntry::for_enhancement("a")),
    ];
    for (raw, expected_key, fragment) in cases {
        let entry = parse_control(raw).unwrap();
        assert_eq!(entry.control_key, key(expected_key), "{raw}");
        assert_eq!(entry.narrative, vec![fragment.clone()], "{raw}");
        assert!(entry.covered_by.is_empty());
        assert!(entry.implementation_status.is_empty());
    }
    assert_eq!(
        parse_control("SC-43a)").unwrap_err(),
        ControlError::Malformed {
            raw: "SC-43a)".to_string()
        }
    );
}

#[test]
fn family_normalization_is_whitespace_insensitive() {
    assert_eq!(normalize_family("ACCESS CONTROL"), ac());
    assert_eq!(normalize_family("ACCESS   CONTROL"), ac());
    assert_eq!(normalize_family("MADE_UP_FAMILY"), Family::unmapped());
}

#[test]
fn sample_sheet_builds_expected_catalog() -> Result<()> {
    let rows = read_csv_rows(SAMPLE_SHEET.as_bytes(), &SourceConfig::default())?;
    assert_eq!(rows.len(), 9);
    let (catalog, report) = build_catalog(&rows, &IngestConfig::default())?;

    assert_eq!(report.rows, 9);
    assert_eq!(report.unmapped_family_rows, 1);
    assert!(report.skipped.is_empty());

    let families: Vec<&str> = catalog.families().map(Family::as_str).collect();
    assert_eq!(
        families,
        vec!["", "AC-Access_Control", "AU-Audit_and_Accountability"]
    );

    let controls = catalog.family(&ac()).unwrap();
    let keys: Vec<&str> = controls.keys().map(ControlKey::as_str).collect();
    assert_eq!(keys, vec!["AC-1", "AC-2", "AC-2 (21)", "AC-3 (3)"]);
    assert_eq!(
        controls[&key("AC-2")].narrative,
        vec![
            NarrativeEntry::for_enhancement("a"),
            NarrativeEntry::for_enhancement("a.1")
        ]
    );
    assert_eq!(
        controls[&key("AC-3 (3)")].narrative,
        vec![
            NarrativeEntry::for_enhancement("a"),
            NarrativeEntry::for_enhancement("b"),
            NarrativeEntry::for_enhancement("b"),
        ]
    );
    assert!(catalog.get(&Family::unmapped(), &key("ZZ-1")).is_some());
    Ok(())
}

#[test]
fn malformed_row_aborts_by_default_and_skips_when_configured() -> Result<()> {
    let rows = vec![
        SheetRow::new("ACCESS CONTROL", "AC-1"),
        SheetRow::new("SYSTEM AND COMMUNICATIONS PROTECTION", "SC-43a)"),
        SheetRow::new("ACCESS CONTROL", "AC-1"),
    ];

    let err = build_catalog(&rows, &IngestConfig::default()).unwrap_err();
    let IngestError::Row { row, source, .. } = &err;
    assert_eq!(*row, 2);
    assert_eq!(source.raw(), "SC-43a)");

    let config = IngestConfig {
        on_malformed: MalformedPolicy::Skip,
        ..IngestConfig::default()
    };
    let (catalog, report) = build_catalog(&rows, &config)?;
    assert_eq!(report.skipped.len(), 1);
    assert!(
        catalog
            .family(&Family::from(FamilyCode::SystemAndCommunicationsProtection))
            .is_none()
    );
    assert_eq!(
        catalog.get(&ac(), &key("AC-1")).unwrap().narrative,
        vec![NarrativeEntry::text_only(), NarrativeEntry::text_only()]
    );
    Ok(())
}

#[test]
fn written_documents_validate_and_reload() -> Result<()> {
    let rows = read_csv_rows(SAMPLE_SHEET.as_bytes(), &SourceConfig::default())?;
    let (catalog, _) = build_catalog(&rows, &IngestConfig::default())?;

    let single = scratch_dir();
    write_catalog(&catalog, single.path(), &OutputConfig::default())?;
    let reloaded = load_catalog_from_path(&single.path().join(CATALOG_FILE_NAME))?;
    assert_eq!(&reloaded, catalog.data());
    assert!(validate_output_dir(single.path())?.is_empty());

    let per_family = scratch_dir();
    let output = OutputConfig {
        layout: OutputLayout::PerFamily,
        pretty: true,
    };
    let written = write_catalog(&catalog, per_family.path(), &output)?;
    assert_eq!(written.len(), 3);
    assert!(validate_output_dir(per_family.path())?.is_empty());

    let doc: FamilyDocument = serde_json::from_str(&fs::read_to_string(
        per_family.path().join("AC-Access_Control.json"),
    )?)?;
    assert_eq!(doc.family, ac());
    assert_eq!(doc.satisfies.len(), 4);
    assert!(per_family.path().join("unmapped.json").is_file());
    Ok(())
}

#[test]
fn cli_convert_prints_catalog_to_stdout() -> Result<()> {
    let dir = scratch_dir();
    let input = write_fixture(dir.path(), "sheet.csv", SAMPLE_SHEET)?;

    let mut cmd = Command::new(ocsheet_binary());
    cmd.arg("convert").arg("--input").arg(&input);
    let output = run_command(cmd)?;
    let value: Value = serde_json::from_slice(&output.stdout)?;

    assert_eq!(
        value["AC-Access_Control"]["AC-3 (3)"],
        json!({
            "control_key": "AC-3 (3)",
            "covered_by": [],
            "implementation_status": "",
            "narrative": [
                {"key": "a", "text": "Text for enhancement"},
                {"key": "b", "text": "Text for enhancement"},
                {"key": "b", "text": "Text for enhancement"}
            ]
        })
    );
    assert_eq!(
        value["AU-Audit_and_Accountability"]["AU-2"]["narrative"],
        json!([{"text": "Text only"}])
    );
    assert!(value[""]["ZZ-1"].is_object());
    Ok(())
}

#[test]
fn cli_convert_honors_config_and_flags() -> Result<()> {
    let dir = scratch_dir();
    let input = write_fixture(
        dir.path(),
        "rows.ndjson",
        "{\"family\":\"ACCESS CONTROL\",\"control\":\"AC-3 (3)(b)(2)\"}\n\
[\"ACCESS CONTROL\",\"SC-43a)\"]\n",
    )?;
    let config = write_fixture(
        dir.path(),
        "ocsheet.toml",
        "sub_enhancement = \"compound\"\n\n[output]\nlayout = \"per_family\"\n",
    )?;
    let out = dir.path().join("out");

    let mut cmd = Command::new(ocsheet_binary());
    cmd.arg("convert")
        .arg("--input")
        .arg(&input)
        .arg("--format")
        .arg("json")
        .arg("--config")
        .arg(&config)
        .arg("--skip-malformed")
        .arg("--out")
        .arg(&out);
    let output = run_command(cmd)?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("skipped row 2"), "stderr: {stderr}");

    let doc: Value = serde_json::from_str(&fs::read_to_string(out.join("AC-Access_Control.json"))?)?;
    assert_eq!(
        doc["satisfies"][0]["narrative"],
        json!([{"key": "b.2", "text": "Text for enhancement plus"}])
    );

    let mut validate = Command::new(ocsheet_binary());
    validate.arg("validate").arg(&out);
    let output = run_command(validate)?;
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "ok");
    Ok(())
}

#[test]
fn cli_convert_aborts_on_malformed_control() -> Result<()> {
    let dir = scratch_dir();
    let input = write_fixture(dir.path(), "bad.csv", "Family,Control\nACCESS CONTROL,SC-43a)\n")?;

    let mut cmd = Command::new(ocsheet_binary());
    cmd.arg("convert").arg("--input").arg(&input);
    let output = run_failing(cmd)?;
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("SC-43a)"), "stderr: {stderr}");
    assert!(output.stdout.is_empty());
    Ok(())
}

#[test]
fn cli_family_and_control_helpers() -> Result<()> {
    let mut family = Command::new(ocsheet_binary());
    family.arg("family").arg("SYSTEM AND   INFORMATION INTEGRITY");
    let output = run_command(family)?;
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "SI-System_and_Information_Integrity"
    );

    let mut control = Command::new(ocsheet_binary());
    control.arg("control").arg("AC-2a.1.");
    let output = run_command(control)?;
    let value: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["control_key"], "AC-2");
    assert_eq!(value["narrative"][0]["key"], "a.1");

    let mut bad = Command::new(ocsheet_binary());
    bad.arg("control").arg("SC-43a)");
    run_failing(bad)?;
    Ok(())
}

#[test]
fn cli_validate_reports_invalid_documents() -> Result<()> {
    let dir = scratch_dir();
    write_fixture(
        dir.path(),
        "AC-Access_Control.json",
        &json!({
            "family": "AC-Access_Control",
            "satisfies": [{"control_key": "AC-2a.", "covered_by": [],
                           "implementation_status": "", "narrative": [{"text": "Text only"}]}]
        })
        .to_string(),
    )?;

    let mut cmd = Command::new(ocsheet_binary());
    cmd.arg("validate").arg(dir.path());
    let output = run_failing(cmd)?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("control_key"), "stderr: {stderr}");
    assert!(stderr.contains("1 problem(s)"), "stderr: {stderr}");
    Ok(())
}

#[test]
fn cli_convert_reads_config_from_environment() -> Result<()> {
    let dir = scratch_dir();
    let input = write_fixture(dir.path(), "sheet.csv", SAMPLE_SHEET)?;
    let config = write_fixture(
        dir.path(),
        "env.toml",
        "sub_enhancement = \"compound\"\n\n[output]\nlayout = \"per_family\"\n",
    )?;
    let out = dir.path().join("out");

    let mut cmd = Command::new(ocsheet_binary());
    cmd.env("OCSHEET_CONFIG", &config)
        .arg("convert")
        .arg("--input")
        .arg(&input)
        .arg("--out")
        .arg(&out);
    run_command(cmd)?;

    assert!(!out.join(CATALOG_FILE_NAME).exists());
    let doc: Value = serde_json::from_str(&fs::read_to_string(out.join("AC-Access_Control.json"))?)?;
    let ac3 = doc["satisfies"]
        .as_array()
        .and_then(|entries| entries.iter().find(|e| e["control_key"] == "AC-3 (3)"))
        .cloned()
        .unwrap_or(Value::Null);
    assert_eq!(
        ac3["narrative"],
        json!([
            {"key": "a", "text": "Text for enhancement"},
            {"key": "b.1", "text": "Text for enhancement plus"},
            {"key": "b.2", "text": "Text for enhancement plus"}
        ])
    );

    // An explicit --config wins over the environment.
    let defaults = write_fixture(dir.path(), "defaults.toml", "")?;
    let mut cmd = Command::new(ocsheet_binary());
    cmd.env("OCSHEET_CONFIG", dir.path().join("missing.toml"))
        .arg("convert")
        .arg("--input")
        .arg(&input)
        .arg("--config")
        .arg(&defaults);
    let output = run_command(cmd)?;
    let value: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(
        value["AC-Access_Control"]["AC-3 (3)"]["narrative"][1]["key"],
        "b"
    );

    let mut cmd = Command::new(ocsheet_binary());
    cmd.env("OCSHEET_CONFIG", dir.path().join("missing.toml"))
        .arg("convert")
        .arg("--input")
        .arg(&input);
    let output = run_failing(cmd)?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing.toml"), "stderr: {stderr}");
    Ok(())
}

#[test]
fn cli_flags_override_config_file() -> Result<()> {
    let dir = scratch_dir();
    let input = write_fixture(dir.path(), "sheet.csv", SAMPLE_SHEET)?;
    let config = write_fixture(
        dir.path(),
        "ocsheet.toml",
        "[output]\nlayout = \"per_family\"\n",
    )?;
    let out = dir.path().join("out");

    let mut cmd = Command::new(ocsheet_binary());
    cmd.arg("convert")
        .arg("--input")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .arg("--layout")
        .arg("single")
        .arg("--drop-leading-placeholder")
        .arg("--summary")
        .arg("--out")
        .arg(&out);
    let output = run_command(cmd)?;

    assert!(!out.join("AC-Access_Control.json").exists());
    let catalog = load_catalog_from_path(&out.join(CATALOG_FILE_NAME))?;
    let controls = &catalog[&ac()];
    assert_eq!(
        controls[&key("AC-2")].narrative,
        vec![NarrativeEntry::for_enhancement("a.1")]
    );
    assert_eq!(controls[&key("AC-1")].narrative, vec![NarrativeEntry::text_only()]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("> AC-Access_Control\n"), "stderr: {stderr}");
    assert!(stderr.contains("- AC-3 (3) [b, b]\n"), "stderr: {stderr}");
    assert!(stderr.contains("> (unmapped)\n"), "stderr: {stderr}");
    assert!(
        stderr.contains("9 rows, 6 controls, 7 narrative fragments, 0 skipped"),
        "stderr: {stderr}"
    );
    Ok(())
}
