//! Integration tests for the assembly pipeline.
//!
//! The full-binary test drives `websmith build` against a temporary project
//! with stub `thrift` and `bower` executables on PATH, so it runs hermetic
//! and fast on any Unix host.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use websmith::common::read_project_manifest;
use websmith::layout::RuntimeLayout;
use websmith::thrift_gen::wrap_generated_artifacts;
use websmith::vendor::{execute, resolve_vendor_specs};

const MANIFEST: &str = r#"
[project]
name = "data-browser"
runtime-dir = "runtime"

[thrift]
service = "taxon"
spec-file = "specs/taxon.thrift"
types-artifact = "taxon_types.js"
client-artifact = "TaxonService.js"
runtime-library = "bower_components/thrift/lib/js/src/thrift.js"

[[vendor]]
name = "jquery"
cwd = "dist"

[[vendor]]
name = "text"
dir = "requirejs-text"
"#;

const GENERATED_TYPES: &str = "\
if (typeof taxon === 'undefined') {\n  taxon = {};\n}\n\
taxon.Thing = function(args) {\n  if (args != null) {\n    this.id = args.id;\n  }\n};\n";

const GENERATED_CLIENT: &str = "\
//\n// Autogenerated by Thrift Compiler\n//\n\
taxon.TaxonServiceClient = function(protocol) {\n\
  if (protocol == null) {\n    throw new Error('protocol required');\n  }\n};\n";

const RUNTIME_LIBRARY: &str = "var Thrift = {\n  Version: '0.9.2'\n};\n";

/// Lay out a minimal project: manifest, sample config, sources, and the
/// installed bower packages the vendor specs refer to.
fn write_project(root: &Path) {
    fs::write(root.join("websmith.toml"), MANIFEST).unwrap();

    fs::create_dir_all(root.join("src/config")).unwrap();
    fs::write(root.join("src/config/sample.yml"), "services: {}\n").unwrap();

    fs::create_dir_all(root.join("src/js/widgets")).unwrap();
    fs::write(root.join("src/js/app.js"), "// app entry\n").unwrap();
    fs::write(root.join("src/js/widgets/panel.js"), "// panel widget\n").unwrap();

    fs::create_dir_all(root.join("src/htdocs")).unwrap();
    fs::write(root.join("src/htdocs/index.html"), "<html></html>\n").unwrap();

    fs::create_dir_all(root.join("bower_components/jquery/dist")).unwrap();
    fs::write(
        root.join("bower_components/jquery/dist/jquery.js"),
        "/* jquery */\n",
    )
    .unwrap();
    fs::create_dir_all(root.join("bower_components/requirejs-text")).unwrap();
    fs::write(
        root.join("bower_components/requirejs-text/text.js"),
        "/* text plugin */\n",
    )
    .unwrap();
    fs::create_dir_all(root.join("bower_components/thrift/lib/js/src")).unwrap();
    fs::write(
        root.join("bower_components/thrift/lib/js/src/thrift.js"),
        RUNTIME_LIBRARY,
    )
    .unwrap();

    fs::create_dir_all(root.join("specs")).unwrap();
    fs::write(root.join("specs/taxon.thrift"), "service TaxonService {}\n").unwrap();
}

#[test]
fn test_vendor_copy_into_build_tree() {
    let project = TempDir::new().unwrap();
    write_project(project.path());

    let manifest = read_project_manifest(project.path()).unwrap();
    let layout = RuntimeLayout::new(project.path(), &manifest.project.runtime_dir);

    let instructions = resolve_vendor_specs(&manifest.vendor, &layout.build_dir()).unwrap();
    for instruction in &instructions {
        execute(instruction, project.path()).unwrap();
    }

    assert!(
        layout
            .build_path("bower_components/jquery/jquery.js")
            .is_file(),
        "jquery should land under its package name, flattened out of dist/"
    );
    assert!(
        layout
            .build_path("bower_components/requirejs-text/text.js")
            .is_file(),
        "text should land under its directory alias"
    );
}

#[test]
fn test_wrap_generated_artifacts_into_build_tree() {
    let project = TempDir::new().unwrap();
    write_project(project.path());

    let manifest = read_project_manifest(project.path()).unwrap();
    let layout = RuntimeLayout::new(project.path(), &manifest.project.runtime_dir);

    // Stand in for the generator: put artifacts where it would leave them.
    fs::create_dir_all(layout.generated_dir()).unwrap();
    fs::write(
        layout.generated_dir().join("taxon_types.js"),
        GENERATED_TYPES,
    )
    .unwrap();
    fs::write(
        layout.generated_dir().join("TaxonService.js"),
        GENERATED_CLIENT,
    )
    .unwrap();

    wrap_generated_artifacts(&manifest, &layout).unwrap();

    let types = fs::read_to_string(layout.build_path("js/thrift/taxon_types.js")).unwrap();
    assert!(types.starts_with("/*global define */"));
    assert!(types.contains("define([\"thrift\"], function (Thrift) {"));
    assert!(types.contains("var taxon = {};"));
    assert!(types.contains("if (args !== null)"));
    assert!(types.ends_with("return taxon;\n});"));

    let client = fs::read_to_string(layout.build_path("js/thrift/TaxonService.js")).unwrap();
    assert!(client.contains("define([\"thrift\", \"taxon_types\"], function (Thrift, taxon) {"));
    assert!(client.contains("if (protocol === null)"));
    assert!(client.ends_with("return taxon;\n});"));

    let library = fs::read_to_string(layout.build_path("js/thrift/thrift.js")).unwrap();
    assert!(library.contains("define([\"jquery\"], function (jQuery) {"));
    assert!(library.ends_with("return Thrift;\n});"));
}

#[test]
fn test_wrap_fails_cleanly_when_generator_output_missing() {
    let project = TempDir::new().unwrap();
    write_project(project.path());

    let manifest = read_project_manifest(project.path()).unwrap();
    let layout = RuntimeLayout::new(project.path(), &manifest.project.runtime_dir);

    // No staged artifacts at all: the first wrap must fail and nothing may
    // appear in the build tree.
    let result = wrap_generated_artifacts(&manifest, &layout);
    assert!(result.is_err());
    assert!(!layout.build_path("js/thrift/taxon_types.js").exists());
    assert!(!layout.build_path("js/thrift/thrift.js").exists());
}

#[cfg(unix)]
mod full_binary {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::process::Command;

    /// A `thrift` stand-in that writes canned artifacts into `<-o dir>/gen-js`,
    /// and a `bower` stand-in that succeeds without doing anything.
    fn write_stub_tools(bin_dir: &Path) {
        fs::create_dir_all(bin_dir).unwrap();

        let thrift_stub = format!(
            "#!/bin/sh\nmkdir -p \"$4/gen-js\"\ncat > \"$4/gen-js/taxon_types.js\" <<'EOF'\n{GENERATED_TYPES}EOF\ncat > \"$4/gen-js/TaxonService.js\" <<'EOF'\n{GENERATED_CLIENT}EOF\n",
            GENERATED_TYPES = super::GENERATED_TYPES,
            GENERATED_CLIENT = super::GENERATED_CLIENT,
        );
        let thrift_path = bin_dir.join("thrift");
        fs::write(&thrift_path, thrift_stub).unwrap();
        fs::set_permissions(&thrift_path, fs::Permissions::from_mode(0o755)).unwrap();

        let bower_path = bin_dir.join("bower");
        fs::write(&bower_path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&bower_path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn run_build(project: &Path, bin_dir: &Path) -> std::process::Output {
        let path = format!(
            "{}:{}",
            bin_dir.display(),
            std::env::var("PATH").unwrap_or_default()
        );
        Command::new(env!("CARGO_BIN_EXE_websmith"))
            .arg("build")
            .arg(project)
            .env("PATH", path)
            .output()
            .expect("Failed to run websmith build")
    }

    #[test]
    fn test_build_assembles_full_tree() {
        let project = TempDir::new().unwrap();
        write_project(project.path());
        let bin_dir = project.path().join("stub-bin");
        write_stub_tools(&bin_dir);

        let output = run_build(project.path(), &bin_dir);
        assert!(
            output.status.success(),
            "build failed:\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );

        let build = project.path().join("runtime/build");
        assert!(build.join("js/app.js").is_file());
        assert!(build.join("js/widgets/panel.js").is_file());
        assert!(build.join("htdocs/index.html").is_file());
        assert!(build.join("config/config.yml").is_file());
        assert!(build.join("bower_components/jquery/jquery.js").is_file());
        assert!(build.join("bower_components/requirejs-text/text.js").is_file());

        let types = fs::read_to_string(build.join("js/thrift/taxon_types.js")).unwrap();
        assert!(types.contains("var taxon = {};"));
        assert!(types.ends_with("return taxon;\n});"));
        assert!(build.join("js/thrift/TaxonService.js").is_file());
        assert!(build.join("js/thrift/thrift.js").is_file());

        // Packaging output mirrors the build tree's script assets.
        assert!(
            project
                .path()
                .join("dist/bower/pkg/js/thrift/taxon_types.js")
                .is_file()
        );
        assert!(project.path().join("dist/bower/pkg/js/app.js").is_file());
    }

    #[test]
    fn test_rebuild_preserves_edited_runtime_config() {
        let project = TempDir::new().unwrap();
        write_project(project.path());
        let bin_dir = project.path().join("stub-bin");
        write_stub_tools(&bin_dir);

        let first = run_build(project.path(), &bin_dir);
        assert!(first.status.success());

        // Operator edits the persisted config between runs.
        let store = project.path().join("runtime/config/local.yml");
        fs::write(&store, "services: {url: custom}\n").unwrap();

        let second = run_build(project.path(), &bin_dir);
        assert!(second.status.success());

        assert_eq!(
            fs::read_to_string(&store).unwrap(),
            "services: {url: custom}\n",
            "the config store must never be overwritten after the first run"
        );
        assert_eq!(
            fs::read_to_string(project.path().join("runtime/build/config/config.yml")).unwrap(),
            "services: {url: custom}\n",
            "the active config must be refreshed from the edited store"
        );
    }

    #[test]
    fn test_build_fails_when_vendor_package_missing() {
        let project = TempDir::new().unwrap();
        write_project(project.path());
        let bin_dir = project.path().join("stub-bin");
        write_stub_tools(&bin_dir);

        fs::remove_dir_all(project.path().join("bower_components/requirejs-text")).unwrap();

        let output = run_build(project.path(), &bin_dir);
        assert!(
            !output.status.success(),
            "a missing vendor package must fail the run rather than produce an empty copy"
        );
    }
}
