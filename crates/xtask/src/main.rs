use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Crates the domain layer must never depend on.
const DOMAIN_FORBIDDEN: &[&str] = &[
    "tokio",
    "tokio-util",
    "async-trait",
    "tracing",
    "tracing-subscriber",
    "rand",
    "dotenvy",
    "gamelab-engine",
    "gamelab-rps",
];

/// Internal crates each workspace crate may depend on.
const LAYERS: &[(&str, &[&str])] = &[
    ("gamelab-domain", &[]),
    ("gamelab-engine", &["gamelab-domain"]),
    ("gamelab-rps", &["gamelab-domain", "gamelab-engine"]),
];

#[derive(Debug, Deserialize)]
struct Metadata {
    packages: Vec<Package>,
    workspace_root: PathBuf,
}

#[derive(Debug, Deserialize)]
struct Package {
    name: String,
    manifest_path: PathBuf,
    dependencies: Vec<Dependency>,
}

#[derive(Debug, Deserialize)]
struct Dependency {
    name: String,
    kind: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("arch-check") => arch_check(),
        Some(cmd) => anyhow::bail!("Unknown xtask command: {cmd}"),
        None => anyhow::bail!("Usage: cargo xtask <command>\n\nCommands:\n  arch-check"),
    }
}

fn arch_check() -> anyhow::Result<()> {
    let output = std::process::Command::new("cargo")
        .args(["metadata", "--format-version", "1", "--no-deps"])
        .output()
        .context("running cargo metadata")?;

    if !output.status.success() {
        anyhow::bail!("cargo metadata failed")
    }

    let metadata: Metadata =
        serde_json::from_slice(&output.stdout).context("parsing cargo metadata output")?;

    let mut violations = Vec::new();
    violations.extend(check_layers(&metadata.packages));
    violations.extend(check_domain_dependencies(&metadata.packages));

    let domain_src = metadata
        .packages
        .iter()
        .find(|p| p.name == "gamelab-domain")
        .and_then(|p| p.manifest_path.parent())
        .map(|dir| dir.join("src"))
        .context("gamelab-domain is not a workspace member")?;
    violations.extend(check_domain_sources(&domain_src)?);

    if violations.is_empty() {
        println!(
            "arch-check passed ({} packages in {})",
            metadata.packages.len(),
            metadata.workspace_root.display()
        );
        return Ok(());
    }

    for violation in &violations {
        eprintln!("  - {violation}");
    }
    anyhow::bail!("arch-check failed with {} violation(s)", violations.len())
}

fn check_layers(packages: &[Package]) -> Vec<String> {
    let mut violations = Vec::new();
    for package in packages {
        let Some((_, allowed)) = LAYERS.iter().find(|(name, _)| *name == package.name) else {
            continue;
        };
        for dep in &package.dependencies {
            let internal = LAYERS.iter().any(|(name, _)| *name == dep.name);
            if internal && !allowed.contains(&dep.name.as_str()) {
                violations.push(format!("{} must not depend on {}", package.name, dep.name));
            }
        }
    }
    violations
}

fn check_domain_dependencies(packages: &[Package]) -> Vec<String> {
    let Some(domain) = packages.iter().find(|p| p.name == "gamelab-domain") else {
        return Vec::new();
    };
    domain
        .dependencies
        .iter()
        // dev-dependencies only reach the test build
        .filter(|dep| dep.kind.as_deref() != Some("dev"))
        .filter(|dep| DOMAIN_FORBIDDEN.contains(&dep.name.as_str()))
        .map(|dep| format!("gamelab-domain depends on runtime crate {}", dep.name))
        .collect()
}

fn check_domain_sources(dir: &Path) -> anyhow::Result<Vec<String>> {
    let pattern = regex_lite::Regex::new(r"\b(tokio|tracing|async_trait|rand|std::(fs|net|thread|time::Instant))\b")
        .context("compiling source pattern")?;
    let mut violations = Vec::new();

    for path in rust_files(dir)? {
        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        for (index, line) in source.lines().enumerate() {
            let code = line.split("//").next().unwrap_or_default();
            if let Some(found) = pattern.find(code) {
                violations.push(format!(
                    "{}:{} uses {} in the domain layer",
                    path.display(),
                    index + 1,
                    found.as_str()
                ));
            }
        }
    }
    Ok(violations)
}

fn rust_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            files.extend(rust_files(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
