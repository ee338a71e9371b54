//! The `viewpress render` command.

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use viewpress::test_utils::ViewFixture;

fn viewpress() -> Command {
    Command::cargo_bin("viewpress").unwrap()
}

#[test]
fn test_render_to_stdout() -> Result<()> {
    let fixture = ViewFixture::new()?;
    fixture.write("index.html", "Hi <%= name %>")?;
    fixture.write("layout.html", "<%- body %>!")?;

    viewpress()
        .arg("render")
        .arg("index.html")
        .arg("--root")
        .arg(&fixture.root)
        .args(["--locals", r#"{"name": "Ann"}"#])
        .assert()
        .success()
        .stdout("Hi Ann!");
    Ok(())
}

#[test]
fn test_render_without_layout_and_with_headers() -> Result<()> {
    let fixture = ViewFixture::new()?;
    fixture.write("index.ejs", "Grüße <%= name %>")?;

    viewpress()
        .args(["render", "index", "--ext", ".ejs", "--no-layout", "--headers"])
        .arg("--root")
        .arg(&fixture.root)
        .args(["--locals", r#"{"name": "Ann"}"#])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("HTTP/1.1 200 OK"))
        .stdout(predicate::str::contains("content-type: text/html; charset=utf-8"))
        .stdout(predicate::str::contains("content-length: 11"))
        .stdout(predicate::str::ends_with("\n\nGrüße Ann"));
    Ok(())
}

#[test]
fn test_render_with_config_file() -> Result<()> {
    let fixture = ViewFixture::new()?;
    fixture.write("home.html", "{{ literal }} [?= who ?]")?;
    let config = fixture.write_config(
        "viewpress.toml",
        "root = \"views\"\nlayout = false\nopen = \"[?\"\nclose = \"?]\"\n",
    )?;

    viewpress()
        .args(["render", "home.html", "--config"])
        .arg(&config)
        .args(["--locals", r#"{"who": "world"}"#])
        .assert()
        .success()
        .stdout("{{ literal }} world");
    Ok(())
}

#[test]
fn test_missing_view_fails_with_report() -> Result<()> {
    let fixture = ViewFixture::new()?;

    viewpress()
        .args(["render", "missing.html", "--no-layout", "--root"])
        .arg(&fixture.root)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Cannot read view 'missing.html'"))
        .stderr(predicate::str::contains("does not exist"));
    Ok(())
}

#[test]
fn test_invalid_locals_json_fails() -> Result<()> {
    let fixture = ViewFixture::new()?;
    fixture.write("index.html", "Hi")?;

    viewpress()
        .args(["render", "index.html", "--locals", "not json", "--root"])
        .arg(&fixture.root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--locals must be a JSON object"));
    Ok(())
}

#[test]
fn test_layout_conflicts_with_no_layout() {
    viewpress()
        .args(["render", "index.html", "--layout", "a.html", "--no-layout"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}
