use std::{
    fs,
    path::{Path, PathBuf},
};

use tempfile::tempdir;

use blockwright_cli::{Args, run};

/// Collects all .toml scenes from a directory
fn collect_scenes(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("toml")
            })
            .collect(),
        Err(_) => Vec::new(),
    };

    files.sort();
    files
}

fn demos_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(Path::parent)
        .expect("workspace root")
        .join("demos")
}

fn args_for(input: &Path, output: &Path) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output: output.to_string_lossy().to_string(),
        config: None,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let scenes = collect_scenes(&demos_dir());
    assert!(!scenes.is_empty(), "No scenes found in demos/");

    let mut failed = Vec::new();
    for scene in &scenes {
        let stem = scene.file_stem().expect("file name").to_string_lossy();
        let output = temp_dir.path().join(format!("{stem}.svg"));

        match run(&args_for(scene, &output)) {
            Ok(()) => {
                let svg = fs::read_to_string(&output).expect("output written");
                assert!(svg.contains("blocklySvg"), "{} is not an SVG", output.display());
            }
            Err(err) => failed.push((scene.clone(), err)),
        }
    }

    if !failed.is_empty() {
        eprintln!("\nDemo scenes that failed:");
        for (path, err) in &failed {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} demo scene(s) failed unexpectedly", failed.len());
    }
}

#[test]
fn e2e_smoke_test_error_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let scenes = collect_scenes(&demos_dir().join("errors"));
    assert!(!scenes.is_empty(), "No scenes found in demos/errors/");

    let mut unexpectedly_succeeded = Vec::new();
    for scene in &scenes {
        let stem = scene.file_stem().expect("file name").to_string_lossy();
        let output = temp_dir.path().join(format!("error_{stem}.svg"));

        if run(&args_for(scene, &output)).is_ok() {
            unexpectedly_succeeded.push(scene.clone());
        }
    }

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError scenes that unexpectedly succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error scene(s) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }
}

#[test]
fn e2e_explicit_config_is_applied() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let config = temp_dir.path().join("config.toml");
    fs::write(&config, "[style]\nbackground_color = \"#fafafa\"\n").expect("write config");
    let output = temp_dir.path().join("styled.svg");

    let mut args = args_for(&demos_dir().join("statement_stack.toml"), &output);
    args.config = Some(config.to_string_lossy().to_string());
    run(&args).expect("render with config");

    let svg = fs::read_to_string(&output).expect("output written");
    assert!(svg.contains("fill=\"#fafafa\""));
}
