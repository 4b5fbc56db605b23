//! Render pipeline behaviour: output shape, dry-run, sidecar handling,
//! dependency completeness and fatal template errors.

use std::fs;
use std::path::{Path, PathBuf};

use filetime::{set_file_mtime, FileTime};
use quill_build::{pipeline, write_manifest, BuildError, RenderRequest, WriteResult};
use quill_core::{
    types::{format_date, format_datetime, local_from_epoch},
    ResolveError,
};
use quill_renderer::{loader::absolutize, RenderError};
use serde_json::{json, Value};
use tempfile::TempDir;

fn fixed(epoch: i64) -> impl Fn(&Path) -> Result<i64, ResolveError> {
    move |_: &Path| -> Result<i64, ResolveError> { Ok(epoch) }
}

fn site_with(name: &str, template: &str) -> (TempDir, PathBuf) {
    let site = TempDir::new().unwrap();
    let infile = site.path().join(name);
    fs::write(&infile, template).unwrap();
    (site, infile)
}

fn sidecar(site: &TempDir) -> Value {
    let text = fs::read_to_string(site.path().join(".metadata.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

// ---------------------------------------------------------------------------
// 1. Output text
// ---------------------------------------------------------------------------

#[test]
fn exactly_one_newline_is_appended() {
    let (_site, infile) = site_with("x.txt", "X");
    let outcome = pipeline::render(&RenderRequest::new(&infile), &fixed(1)).unwrap();
    assert_eq!(outcome.rendered, "X\n");
    assert_eq!(
        fs::read_to_string(infile.with_file_name("x-render.txt")).unwrap(),
        "X\n"
    );

    let (_site, infile) = site_with("y.txt", "X\n");
    let outcome = pipeline::render(&RenderRequest::new(&infile), &fixed(1)).unwrap();
    assert_eq!(outcome.rendered, "X\n\n");
}

#[test]
fn metadata_fields_are_rendered() {
    let (_site, infile) = site_with(
        "about.md",
        "{{ name }}|{{ date }}|{{ created }}|{{ modified }}",
    );
    set_file_mtime(&infile, FileTime::from_unix_time(1_500_000_000, 0)).unwrap();

    let outcome = pipeline::render(&RenderRequest::new(&infile), &fixed(1_400_000_000)).unwrap();
    let created = local_from_epoch(1_400_000_000).unwrap();
    let modified = local_from_epoch(1_500_000_000).unwrap();
    assert_eq!(
        outcome.rendered,
        format!(
            "about|{}|{}|{}\n",
            format_date(&created),
            format_datetime(&created),
            format_datetime(&modified)
        )
    );
}

#[test]
fn bindings_are_visible_and_override_metadata() {
    let (_site, infile) = site_with("p.txt", "{{ title }} / {{ name }}");
    let mut request = RenderRequest::new(&infile);
    request.bindings.insert("title".into(), json!("Hello"));
    request.bindings.insert("name".into(), json!("custom"));
    let outcome = pipeline::render(&request, &fixed(1)).unwrap();
    assert_eq!(outcome.rendered, "Hello / custom\n");
}

#[test]
fn output_directory_is_created() {
    let (site, infile) = site_with("p.txt", "body");
    let mut request = RenderRequest::new(&infile);
    request.outfile = site.path().join("build").join("deep").join("p.txt");
    let outcome = pipeline::render(&request, &fixed(1)).unwrap();
    assert_eq!(outcome.write, WriteResult::Written { path: request.outfile.clone() });
    assert_eq!(fs::read_to_string(&request.outfile).unwrap(), "body\n");
}

// ---------------------------------------------------------------------------
// 2. Dry run
// ---------------------------------------------------------------------------

#[test]
fn dry_run_skips_output_but_updates_sidecar() {
    let (site, infile) = site_with("page.html", "{% include \"part.html\" %}");
    fs::write(site.path().join("part.html"), "part").unwrap();

    let mut request = RenderRequest::new(&infile);
    request.dry_run = true;

    let outcome = pipeline::render(&request, &fixed(77)).unwrap();

    assert!(matches!(outcome.write, WriteResult::WouldWrite { .. }));
    assert_eq!(outcome.rendered, "part\n");
    assert!(!request.outfile.exists());
    assert_eq!(outcome.dependencies.len(), 2);
    assert_eq!(sidecar(&site)["page.html"]["created"], json!(77));
}

#[test]
fn dry_run_creates_no_output_directory() {
    let (site, infile) = site_with("page.html", "body");
    let mut request = RenderRequest::new(&infile);
    request.outfile = site.path().join("build").join("page.html");
    request.dry_run = true;

    let outcome = pipeline::render(&request, &fixed(5)).unwrap();
    assert_eq!(outcome.write.path(), request.outfile.as_path());
    assert!(!site.path().join("build").exists());
}

// ---------------------------------------------------------------------------
// 3. Sidecar
// ---------------------------------------------------------------------------

#[test]
fn cached_render_leaves_sidecar_untouched() {
    let (site, infile) = site_with("a.txt", "A");
    let before = r#"{"a.txt": {"created": 1000}, "b.txt": {"created": 2000, "title": "Bee"}}"#;
    fs::write(site.path().join(".metadata.json"), before).unwrap();

    let resolver = |_: &Path| -> Result<i64, ResolveError> {
        panic!("resolver must not run for a cached entry")
    };
    pipeline::render(&RenderRequest::new(&infile), &resolver).unwrap();

    assert_eq!(
        fs::read_to_string(site.path().join(".metadata.json")).unwrap(),
        before
    );
}

#[test]
fn backfill_keeps_other_entries() {
    let (site, infile) = site_with("a.txt", "A");
    fs::write(
        site.path().join(".metadata.json"),
        r#"{"b.txt": {"created": 2000, "title": "Bee"}}"#,
    )
    .unwrap();

    pipeline::render(&RenderRequest::new(&infile), &fixed(3000)).unwrap();
    let doc = sidecar(&site);
    assert_eq!(doc["a.txt"], json!({"created": 3000}));
    assert_eq!(doc["b.txt"], json!({"created": 2000, "title": "Bee"}));
}

#[test]
fn malformed_sidecar_aborts_before_rendering() {
    let (site, infile) = site_with("a.txt", "A");
    fs::write(site.path().join(".metadata.json"), "{not json").unwrap();

    let request = RenderRequest::new(&infile);
    let err = pipeline::render(&request, &fixed(1)).unwrap_err();
    assert!(matches!(err, BuildError::Metadata(_)), "got: {err}");
    assert!(!request.outfile.exists());
}

#[test]
fn resolver_failure_aborts() {
    let (_site, infile) = site_with("a.txt", "A");
    let resolver = |p: &Path| -> Result<i64, ResolveError> {
        Err(ResolveError::Malformed {
            path: p.to_path_buf(),
            output: String::new(),
        })
    };
    let request = RenderRequest::new(&infile);
    assert!(pipeline::render(&request, &resolver).is_err());
    assert!(!request.outfile.exists());
}

// ---------------------------------------------------------------------------
// 4. Dependencies
// ---------------------------------------------------------------------------

#[test]
fn dependencies_cover_template_partial_and_read_file() {
    let (site, infile) = site_with(
        "main.html",
        "{% include \"partial.html\" %}{{ read_file(name=\"data.txt\") }}",
    );
    fs::create_dir_all(site.path().join("templates")).unwrap();
    fs::write(site.path().join("templates").join("partial.html"), "P").unwrap();
    fs::write(site.path().join("data.txt"), "D").unwrap();

    let outcome = pipeline::render(&RenderRequest::new(&infile), &fixed(1)).unwrap();
    let deps = &outcome.dependencies;
    assert!(deps.contains(&absolutize(&infile)));
    assert!(deps.contains(&absolutize(&site.path().join("templates").join("partial.html"))));
    assert!(deps.contains(&absolutize(&site.path().join("data.txt"))));

    let manifest = site.path().join("main.d");
    write_manifest(&manifest, "main-render.html", deps).unwrap();
    let text = fs::read_to_string(&manifest).unwrap();
    assert!(text.starts_with("main-render.html: \\\n"));
    assert_eq!(text.lines().count(), 1 + deps.len());
}

#[test]
fn repeated_reads_are_listed_once() {
    let (site, infile) = site_with(
        "main.txt",
        "{{ read_file(name=\"d.txt\") }}{{ read_file(name=\"d.txt\") }}",
    );
    fs::write(site.path().join("d.txt"), "d").unwrap();
    let outcome = pipeline::render(&RenderRequest::new(&infile), &fixed(1)).unwrap();
    assert_eq!(outcome.rendered, "dd\n");
    assert_eq!(outcome.dependencies.len(), 2);
}

// ---------------------------------------------------------------------------
// 5. Fatal template errors
// ---------------------------------------------------------------------------

#[test]
fn syntax_error_is_fatal_and_writes_no_output() {
    let (_site, infile) = site_with("bad.html", "before\n{{ unterminated");
    let request = RenderRequest::new(&infile);
    let err = pipeline::render(&request, &fixed(1)).unwrap_err();
    match &err {
        BuildError::Render(RenderError::Syntax { line, .. }) => assert_eq!(*line, Some(2)),
        other => panic!("expected syntax error, got {other}"),
    }
    assert!(err.to_string().contains("bad.html@2"));
    assert!(!request.outfile.exists());
}

#[test]
fn render_error_reports_kind_and_writes_no_output() {
    let (_site, infile) = site_with("bad.html", "{{ 1 | no_such_filter }}");
    let request = RenderRequest::new(&infile);
    let err = pipeline::render(&request, &fixed(1)).unwrap_err();
    assert!(
        matches!(err, BuildError::Render(RenderError::Template { .. })),
        "got: {err}"
    );
    assert!(err.to_string().contains("no_such_filter"));
    assert!(!request.outfile.exists());
}

#[test]
fn missing_input_is_reported() {
    let site = TempDir::new().unwrap();
    let request = RenderRequest::new(site.path().join("ghost.html"));
    assert!(pipeline::render(&request, &fixed(1)).is_err());
}
