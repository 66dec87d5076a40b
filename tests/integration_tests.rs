//! Integration tests for the murp CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the murp binary
fn murp() -> Command {
    Command::cargo_bin("murp").unwrap()
}

/// Create a temporary directory with an initialized project
fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    murp().current_dir(tmp.path()).arg("init").assert().success();
    tmp
}

/// Create a vendor and return its ID
fn create_vendor(tmp: &TempDir, name: &str) -> String {
    let output = murp()
        .current_dir(tmp.path())
        .args(["vendor", "new", name, "--lead-time", "10", "-f", "id"])
        .output()
        .unwrap();
    assert!(output.status.success());
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Create an inventory item
fn create_item(tmp: &TempDir, sku: &str, name: &str, extra: &[&str]) {
    murp()
        .current_dir(tmp.path())
        .args(["inv", "new", "--sku", sku, "--name", name])
        .args(extra)
        .assert()
        .success();
}

/// Create a BOM with the given component lines
fn create_bom(tmp: &TempDir, sku: &str, lines: &[(&str, &str, &str)]) {
    murp()
        .current_dir(tmp.path())
        .args(["bom", "new", "--sku", sku, "--name", "Garden Blend"])
        .assert()
        .success();
    for (line_sku, name, qty) in lines {
        murp()
            .current_dir(tmp.path())
            .args(["bom", "add", sku, line_sku, qty, "--name", name])
            .assert()
            .success();
    }
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_help_displays() {
    murp()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("materials resource planning"))
        .stdout(predicate::str::contains("inv"))
        .stdout(predicate::str::contains("vendor"))
        .stdout(predicate::str::contains("bom"));
}

#[test]
fn test_version_displays() {
    murp()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("murp"));
}

#[test]
fn test_unknown_command_fails() {
    murp().arg("frobnicate").assert().failure();
}

#[test]
fn test_command_outside_project_fails() {
    let tmp = TempDir::new().unwrap();
    murp()
        .current_dir(tmp.path())
        .args(["inv", "list"])
        .assert()
        .failure();
}

#[test]
fn test_completions_bash() {
    murp()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("murp"));
}

// ============================================================================
// Init Command Tests
// ============================================================================

#[test]
fn test_init_creates_project_structure() {
    let tmp = TempDir::new().unwrap();
    murp()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized MuRP project"));

    assert!(tmp.path().join(".murp").is_dir());
    assert!(tmp.path().join(".murp/config.yaml").is_file());
    assert!(tmp.path().join(".murp/murp.db").is_file());
    assert!(tmp.path().join(".murp/artwork").is_dir());
}

// ============================================================================
// Inventory Tests
// ============================================================================

#[test]
fn test_inv_new_and_list() {
    let tmp = setup_test_project();

    murp()
        .current_dir(tmp.path())
        .args(["inv", "new", "--sku", "kelp-01", "--name", "Kelp Meal", "--qty", "40"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created item"));

    murp()
        .current_dir(tmp.path())
        .args(["inv", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("KELP-01"))
        .stdout(predicate::str::contains("Kelp Meal"))
        .stdout(predicate::str::contains("1 item(s) found"));
}

#[test]
fn test_inv_new_rejects_empty_sku() {
    let tmp = setup_test_project();

    murp()
        .current_dir(tmp.path())
        .args(["inv", "new", "--sku", "", "--name", "Nameless"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sku"));

    murp()
        .current_dir(tmp.path())
        .args(["inv", "list", "--count"])
        .assert()
        .success()
        .stdout(predicate::str::diff("0\n"));
}

#[test]
fn test_inv_new_rejects_duplicate_sku() {
    let tmp = setup_test_project();
    create_item(&tmp, "BONE-02", "Bone Meal", &[]);

    murp()
        .current_dir(tmp.path())
        .args(["inv", "new", "--sku", "bone-02", "--name", "Bone Meal Again"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_inv_list_low_filters() {
    let tmp = setup_test_project();
    create_item(&tmp, "LOW-1", "Nearly Gone", &["--qty", "1", "--reorder-point", "10"]);
    create_item(&tmp, "FULL-1", "Plenty", &["--qty", "500", "--reorder-point", "10"]);

    murp()
        .current_dir(tmp.path())
        .args(["inv", "list", "--low"])
        .assert()
        .success()
        .stdout(predicate::str::contains("LOW-1"))
        .stdout(predicate::str::contains("FULL-1").not());
}

#[test]
fn test_inv_list_json() {
    let tmp = setup_test_project();
    create_item(&tmp, "JSON-1", "Json Item", &[]);

    let output = murp()
        .current_dir(tmp.path())
        .args(["inv", "list", "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed.as_array().map(|a| a.len()), Some(1));
}

// ============================================================================
// Vendor Tests
// ============================================================================

const VENDOR_CSV: &str = "name,contact_email,lead_time_days\n\
Acme Organics,orders@acme.example,14\n\
,nobody@example.com,7\n\
Slow Supply,slow@example.com,soon\n\
Hill Farms,sales@hill.example,\n";

#[test]
fn test_vendor_import_fails_on_invalid_rows() {
    let tmp = setup_test_project();
    let csv = tmp.path().join("vendors.csv");
    fs::write(&csv, VENDOR_CSV).unwrap();

    murp()
        .current_dir(tmp.path())
        .args(["vendor", "import"])
        .arg(&csv)
        .assert()
        .failure()
        .stderr(predicate::str::contains("row 3"))
        .stderr(predicate::str::contains("row 4"));

    murp()
        .current_dir(tmp.path())
        .args(["vendor", "list", "--count"])
        .assert()
        .success()
        .stdout(predicate::str::diff("0\n"));
}

#[test]
fn test_vendor_import_skip_errors_keeps_valid_rows() {
    let tmp = setup_test_project();
    let csv = tmp.path().join("vendors.csv");
    fs::write(&csv, VENDOR_CSV).unwrap();

    murp()
        .current_dir(tmp.path())
        .args(["vendor", "import", "--skip-errors"])
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 vendor(s)"));

    murp()
        .current_dir(tmp.path())
        .args(["vendor", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Acme Organics"))
        .stdout(predicate::str::contains("Hill Farms"))
        .stdout(predicate::str::contains("Slow Supply").not());
}

#[test]
fn test_vendor_import_skips_existing_names() {
    let tmp = setup_test_project();
    create_vendor(&tmp, "Acme Organics");
    let csv = tmp.path().join("vendors.csv");
    fs::write(&csv, "name\nacme organics\nNew Vendor\n").unwrap();

    murp()
        .current_dir(tmp.path())
        .args(["vendor", "import"])
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 vendor(s); 1 skipped"));
}

// ============================================================================
// BOM Tests
// ============================================================================

#[test]
fn test_bom_export_import_round_trip() {
    let tmp = setup_test_project();
    create_bom(
        &tmp,
        "BLEND-01",
        &[("KELP-01", "Kelp Meal", "2.5"), ("BONE-02", "Bone Meal", "1")],
    );

    let exported = tmp.path().join("blend.csv");
    murp()
        .current_dir(tmp.path())
        .args(["bom", "export", "BLEND-01", "-o"])
        .arg(&exported)
        .assert()
        .success();
    let text = fs::read_to_string(&exported).unwrap();
    assert!(text.starts_with("sku,name,quantity,unit"));
    assert!(text.contains("KELP-01,Kelp Meal,2.5"));

    murp()
        .current_dir(tmp.path())
        .args(["bom", "new", "--sku", "BLEND-02", "--name", "Copy"])
        .assert()
        .success();
    murp()
        .current_dir(tmp.path())
        .args(["bom", "import", "BLEND-02"])
        .arg(&exported)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 line(s)"));

    murp()
        .current_dir(tmp.path())
        .args(["bom", "show", "BLEND-02"])
        .assert()
        .success()
        .stdout(predicate::str::contains("KELP-01"))
        .stdout(predicate::str::contains("BONE-02"));
}

#[test]
fn test_bom_import_rejects_bad_quantity() {
    let tmp = setup_test_project();
    create_bom(&tmp, "BLEND-01", &[]);
    let csv = tmp.path().join("bad.csv");
    fs::write(&csv, "sku,name,quantity,unit\nKELP-01,Kelp,lots,kg\n").unwrap();

    murp()
        .current_dir(tmp.path())
        .args(["bom", "import", "BLEND-01"])
        .arg(&csv)
        .assert()
        .failure()
        .stderr(predicate::str::contains("row 2"));
}

#[test]
fn test_bom_template_has_headers() {
    let tmp = setup_test_project();
    murp()
        .current_dir(tmp.path())
        .args(["bom", "template"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("sku,name,quantity,unit"));
}

#[test]
fn test_bom_add_rejects_non_finite_quantity() {
    let tmp = setup_test_project();
    create_bom(&tmp, "BLEND-01", &[]);

    for bad in ["NaN", "inf", "0"] {
        murp()
            .current_dir(tmp.path())
            .args(["bom", "add", "BLEND-01", "KELP-01", bad])
            .assert()
            .failure()
            .stderr(predicate::str::contains("quantity"));
    }
}

#[test]
fn test_bom_add_trims_name_and_unit_for_export() {
    let tmp = setup_test_project();
    create_bom(&tmp, "BLEND-01", &[]);
    murp()
        .current_dir(tmp.path())
        .args(["bom", "add", "BLEND-01", "KELP-01", "2.5", "--name", "  Kelp Meal ", "--unit", " kg "])
        .assert()
        .success();

    murp()
        .current_dir(tmp.path())
        .args(["bom", "export", "BLEND-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("KELP-01,Kelp Meal,2.5,kg"));
}

// ============================================================================
// Purchase Order Tests
// ============================================================================

#[test]
fn test_po_auto_requires_enabled_or_force() {
    let tmp = setup_test_project();
    murp()
        .current_dir(tmp.path())
        .args(["po", "auto"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("auto-PO is off"));
}

#[test]
fn test_po_auto_drafts_for_low_item() {
    let tmp = setup_test_project();
    let vendor = create_vendor(&tmp, "Acme Organics");
    create_item(
        &tmp,
        "KELP-01",
        "Kelp Meal",
        &[
            "--qty",
            "2",
            "--reorder-point",
            "20",
            "--reorder-qty",
            "50",
            "--unit-cost",
            "4",
            "--vendor",
            &vendor,
        ],
    );
    create_item(&tmp, "NOVEND-1", "Orphan", &["--qty", "0", "--reorder-point", "5", "--reorder-qty", "5"]);

    murp()
        .current_dir(tmp.path())
        .args(["po", "auto", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Drafted"))
        .stderr(predicate::str::contains("NOVEND-1"));

    murp()
        .current_dir(tmp.path())
        .args(["po", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Acme Organics"))
        .stdout(predicate::str::contains("draft"));

    // Items already on an open PO are not drafted twice
    murp()
        .current_dir(tmp.path())
        .args(["po", "auto", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to order"));
}

#[test]
fn test_po_auto_dry_run_writes_nothing() {
    let tmp = setup_test_project();
    let vendor = create_vendor(&tmp, "Acme Organics");
    create_item(
        &tmp,
        "KELP-01",
        "Kelp Meal",
        &["--qty", "0", "--reorder-point", "20", "--reorder-qty", "50", "--vendor", &vendor],
    );

    murp()
        .current_dir(tmp.path())
        .args(["po", "auto", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would draft 1 PO(s)"));

    murp()
        .current_dir(tmp.path())
        .args(["po", "list", "-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

// ============================================================================
// Three-Way Match Tests
// ============================================================================

const MATCH_JSON: &str = r#"[
    {
        "po_id": "PO-TEST-1",
        "order_total": 1000.0,
        "invoice_total": 1050.0,
        "receipt_total": 1000.0,
        "discrepancies": [
            {"kind": "price", "sku": "KELP-01", "message": "unit price 5.25 vs 5.00", "expected": 5.0, "actual": 5.25}
        ],
        "match_status": "discrepancy"
    }
]"#;

#[test]
fn test_match_import_and_resolve() {
    let tmp = setup_test_project();
    let file = tmp.path().join("matches.json");
    fs::write(&file, MATCH_JSON).unwrap();

    murp()
        .current_dir(tmp.path())
        .args(["match", "import"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 match record(s)"));

    murp()
        .current_dir(tmp.path())
        .args(["match", "show", "PO-TEST-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unit price 5.25 vs 5.00"))
        .stdout(predicate::str::contains("pending"));

    murp()
        .current_dir(tmp.path())
        .args(["match", "resolve", "PO-TEST-1", "dispute", "--notes", "price mismatch"])
        .assert()
        .success()
        .stdout(predicate::str::contains("marked"));

    murp()
        .current_dir(tmp.path())
        .args(["match", "resolve", "PO-TEST-1", "approve"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already resolved"));

    // A fresh import of the computed data keeps the reviewer's decision
    murp()
        .current_dir(tmp.path())
        .args(["match", "import"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("kept the existing resolution on 1 record(s)"));

    murp()
        .current_dir(tmp.path())
        .args(["match", "show", "PO-TEST-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("disputed"))
        .stdout(predicate::str::contains("price mismatch"));
}

// ============================================================================
// Label Tests
// ============================================================================

#[test]
fn test_label_matches_bom_in_order() {
    let tmp = setup_test_project();
    create_bom(
        &tmp,
        "BLEND-01",
        &[("KELP-01", "Kelp Meal", "2"), ("BONE-02", "Bone Meal", "1")],
    );

    murp()
        .current_dir(tmp.path())
        .args(["label", "BLEND-01", "kelp meal,Bone Meal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Label matches the BOM, in order"));
}

#[test]
fn test_label_reports_missing_ingredient() {
    let tmp = setup_test_project();
    create_bom(
        &tmp,
        "BLEND-01",
        &[("KELP-01", "Kelp Meal", "2"), ("BONE-02", "Bone Meal", "1")],
    );

    murp()
        .current_dir(tmp.path())
        .args(["label", "BLEND-01", "Kelp Meal,Feather Meal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("missing from label"))
        .stdout(predicate::str::contains("not in BOM"))
        .stdout(predicate::str::contains("Label and BOM differ"));
}

#[test]
fn test_label_requires_ingredients() {
    let tmp = setup_test_project();
    create_bom(&tmp, "BLEND-01", &[("KELP-01", "Kelp Meal", "2")]);

    murp()
        .current_dir(tmp.path())
        .args(["label", "BLEND-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no label ingredients"));
}

// ============================================================================
// Heatmap Tests
// ============================================================================

#[test]
fn test_heatmap_from_factors() {
    murp()
        .args([
            "heatmap",
            "--factors",
            "0.5,0.6,1.2,1.5,1.4,1.0,0.9,0.8,0.9,1.0,0.7,0.5",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Apr"));
}

#[test]
fn test_heatmap_rejects_wrong_factor_count() {
    murp()
        .args(["heatmap", "--factors", "1,1,1,1,1,1,1,1,1,1,1"])
        .assert()
        .failure();
}

// ============================================================================
// Compliance Tests
// ============================================================================

#[test]
fn test_sds_set_marks_compliance_on_file() {
    let tmp = setup_test_project();
    create_item(&tmp, "BORAX", "Borax", &[]);

    murp()
        .current_dir(tmp.path())
        .args(["compliance", "set", "BORAX", "ca", "restricted"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SDS missing"));

    murp()
        .current_dir(tmp.path())
        .args([
            "compliance", "sds", "set", "borax", "--cas", "1303-96-4", "--hazard", "H360FD",
            "--signal", "danger", "--expires", "2030-01-01",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("SDS created"))
        .stdout(predicate::str::contains("1 state record(s) marked on file"));

    // Later states pick up the document too
    murp()
        .current_dir(tmp.path())
        .args(["compliance", "set", "BORAX", "OR", "compliant"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SDS on_file"));

    murp()
        .current_dir(tmp.path())
        .args(["compliance", "sds", "show", "--hazard", "h360fd"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BORAX"))
        .stdout(predicate::str::contains("Borax"));

    murp()
        .current_dir(tmp.path())
        .args(["compliance", "sds", "show", "--cas", "57-13-6"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No SDS documents found"));
}

#[test]
fn test_sds_set_rejects_bad_dates() {
    let tmp = setup_test_project();
    murp()
        .current_dir(tmp.path())
        .args(["compliance", "sds", "set", "UREA", "--revised", "2025-06-01", "--expires", "2024-06-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("before revision"));

    murp()
        .current_dir(tmp.path())
        .args(["compliance", "sds", "set", "UREA", "--expires", "next year"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid date"));
}

// ============================================================================
// Registration Tests
// ============================================================================

#[test]
fn test_reg_new_and_list() {
    let tmp = setup_test_project();

    murp()
        .current_dir(tmp.path())
        .args([
            "reg", "new", "--product", "Garden Blend", "--state", "or", "--number", "OR-1234",
            "--expires", "2099-12-31",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Registered"));

    murp()
        .current_dir(tmp.path())
        .args(["reg", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Garden Blend"))
        .stdout(predicate::str::contains("OR"));
}

#[test]
fn test_reg_new_rejects_bad_state() {
    let tmp = setup_test_project();

    murp()
        .current_dir(tmp.path())
        .args([
            "reg", "new", "--product", "Garden Blend", "--state", "Oregon", "--number", "1",
            "--expires", "2099-12-31",
        ])
        .assert()
        .failure();
}

// ============================================================================
// Activity Tests
// ============================================================================

#[test]
fn test_activity_log_and_list() {
    let tmp = setup_test_project();

    murp()
        .current_dir(tmp.path())
        .args(["activity", "log", "Counted the warehouse", "--agent", "tester"])
        .assert()
        .success();

    murp()
        .current_dir(tmp.path())
        .args(["activity", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Counted the warehouse"))
        .stdout(predicate::str::contains("tester"));
}

// ============================================================================
// Settings Tests
// ============================================================================

#[test]
fn test_settings_auto_po_threshold_persists() {
    let tmp = setup_test_project();

    murp()
        .current_dir(tmp.path())
        .args(["settings", "auto-po", "--threshold", "critical"])
        .assert()
        .success();

    murp()
        .current_dir(tmp.path())
        .args(["settings", "auto-po", "-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("critical"));
}

#[test]
fn test_settings_backup_toggle() {
    let tmp = setup_test_project();

    murp()
        .current_dir(tmp.path())
        .args(["settings", "backup"])
        .assert()
        .success()
        .stdout(predicate::str::diff("off\n"));

    murp()
        .current_dir(tmp.path())
        .args(["settings", "backup", "on"])
        .assert()
        .success();

    murp()
        .current_dir(tmp.path())
        .args(["settings", "backup"])
        .assert()
        .success()
        .stdout(predicate::str::diff("on\n"));
}
