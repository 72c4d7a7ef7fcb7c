use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::tempdir;

fn write_file(path: &Path, contents: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

const SHAPES: &str = r#""""Geometry helpers."""

__all__ = ["Circle", "area_of"]


class Circle(Shape):
    """A circle with a `radius_cm` field."""

    def __init__(self, radius_cm):
        """Create a circle."""

    def _cache(self):
        """Private."""


def area_of(shape,
            unit="cm"):
    """Return the area_in_units."""


def not_exported():
    """Hidden by __all__."""
"#;

#[test]
fn cli_documents_single_module_as_markdown() {
    let dir = tempdir().unwrap();
    let module = dir.path().join("shapes.py");
    write_file(&module, SHAPES.as_bytes());

    let output = Command::new(env!("CARGO_BIN_EXE_docpy"))
        .args([module.to_str().unwrap(), "--md"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert!(stdout.starts_with("## shapes.py\n\nGeometry helpers.\n"));
    assert!(stdout.contains("### Classes"));
    assert!(stdout.contains("#### _class_ shapes.**Circle**(_Shape_)"));
    assert!(stdout.contains("A circle with a `radius_cm` field."));
    assert!(stdout.contains("##### shapes.Circle.**\\_\\_init\\_\\_**(_radius\\_cm_)"));
    assert!(stdout.contains("### Functions"));
    assert!(stdout.contains("#### shapes.**area\\_of**(_shape, unit=\"cm\"_)"));
    assert!(stdout.contains("Return the area\\_in\\_units."));
    assert!(!stdout.contains("\\_cache"));
    assert!(!stdout.contains("not\\_exported"));
}

#[test]
fn cli_all_flag_documents_undocumented() {
    let dir = tempdir().unwrap();
    let module = dir.path().join("bare.py");
    write_file(&module, b"def plain(x):\n    return x\n");

    let output = Command::new(env!("CARGO_BIN_EXE_docpy"))
        .args([module.to_str().unwrap(), "--md"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let output = Command::new(env!("CARGO_BIN_EXE_docpy"))
        .args([module.to_str().unwrap(), "--md", "--all"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("#### bare.**plain**(_x_)"));
}

#[test]
fn cli_package_writes_pages_and_skips_unreadable_modules() {
    let dir = tempdir().unwrap();
    let pkg = dir.path().join("geo");
    write_file(&pkg.join("__init__.py"), b"\"\"\"Geometry package.\"\"\"\n");
    write_file(&pkg.join("shapes.py"), SHAPES.as_bytes());
    write_file(&pkg.join("latin1.py"), &[b'#', b' ', 0xe9, b'\n']);
    write_file(
        &pkg.join("solid/cube.py"),
        b"def volume(side):\n    \"\"\"Volume of a cube.\"\"\"\n",
    );
    let out = dir.path().join("site");

    let output = Command::new(env!("CARGO_BIN_EXE_docpy"))
        .args([
            pkg.to_str().unwrap(),
            "--md",
            "--output-dir",
            out.to_str().unwrap(),
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("latin1.py"));

    let page = fs::read_to_string(out.join("geo.md")).unwrap();
    assert!(page.starts_with("# geo\n\nGeometry package.\n"));
    assert!(page.contains("## Packages\n\n* [solid](geo_solid.md)\n"));
    assert!(page.contains("## Modules\n\n* [shapes.py](#shapes.py)\n"));
    assert!(page.contains("## <a id=\"shapes.py\"></a>shapes.py"));

    let sub = fs::read_to_string(out.join("geo_solid.md")).unwrap();
    assert!(sub.contains("#### cube.**volume**(_side_)"));
}

#[test]
fn cli_package_html_respects_exclude() {
    let dir = tempdir().unwrap();
    let pkg = dir.path().join("geo");
    write_file(&pkg.join("shapes.py"), SHAPES.as_bytes());
    write_file(&pkg.join("tests/test_shapes.py"), b"\"\"\"Tests.\"\"\"\n");
    let out = dir.path().join("site");

    let output = Command::new(env!("CARGO_BIN_EXE_docpy"))
        .args([
            pkg.to_str().unwrap(),
            "--exclude",
            "tests",
            "-o",
            out.to_str().unwrap(),
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let page = fs::read_to_string(out.join("geo.html")).unwrap();
    assert!(page.starts_with("<!DOCTYPE html>"));
    assert!(page.contains("<title>geo Documentation</title>"));
    assert!(!page.contains("geo_tests"));
    assert!(!out.join("geo_tests.html").exists());
}

#[test]
fn cli_json_module_output() {
    let dir = tempdir().unwrap();
    let module = dir.path().join("shapes.py");
    write_file(&module, SHAPES.as_bytes());

    let output = Command::new(env!("CARGO_BIN_EXE_docpy"))
        .args([module.to_str().unwrap(), "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["module"], "shapes");
    let names: Vec<_> = v["declarations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["Circle", "area_of"]);
}

#[test]
fn cli_json_error_output_is_valid_json_even_with_quotes_in_path() {
    let dir = tempdir().unwrap();

    let bad_path = dir.path().join("does-not-exist-\"quoted\".py");

    let output = Command::new(env!("CARGO_BIN_EXE_docpy"))
        .args([bad_path.to_str().unwrap(), "--json"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));

    let stderr = String::from_utf8(output.stderr).unwrap();
    let v: serde_json::Value = serde_json::from_str(stderr.trim()).unwrap();
    assert_eq!(v["code"], 3);
}

#[test]
fn cli_completions() {
    let output = Command::new(env!("CARGO_BIN_EXE_docpy"))
        .args(["--completions", "bash"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout).unwrap().contains("docpy"));
}
