//! Renders the identifier enum that application code schedules against.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bgwork_core::JobIdentifier;
use tracing::info;

/// Validate raw identifiers and return them sorted and deduplicated.
pub fn parse_identifiers<I, S>(raw: I) -> Result<Vec<JobIdentifier>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let ids = raw
        .into_iter()
        .map(|s| JobIdentifier::parse(s.as_ref()))
        .collect::<bgwork_core::Result<BTreeSet<_>>>()?;
    if ids.is_empty() {
        bail!("at least one job identifier is required");
    }
    Ok(ids.into_iter().collect())
}

/// `<output_dir>/<package path>/<snake_case(type_name)>.rs`
pub fn module_path(output_dir: &Path, package_name: &str, type_name: &str) -> Result<PathBuf> {
    let mut path = output_dir.to_path_buf();
    for segment in package_name.split("::") {
        if !is_rust_ident(segment) {
            bail!("invalid package segment {segment:?} in {package_name:?}");
        }
        path.push(segment);
    }
    path.push(format!("{}.rs", to_snake_case(type_name)));
    Ok(path)
}

/// Source of the enum naming every identifier.
pub fn render(type_name: &str, ids: &[JobIdentifier]) -> Result<String> {
    if !is_rust_ident(type_name) || !type_name.starts_with(|c: char| c.is_ascii_uppercase()) {
        bail!("type name {type_name:?} is not an UpperCamelCase Rust identifier");
    }

    let mut variants: Vec<(String, &JobIdentifier)> = Vec::with_capacity(ids.len());
    for id in ids {
        let variant = variant_name(id.as_str());
        if let Some((_, other)) = variants.iter().find(|(v, _)| *v == variant) {
            bail!("identifiers {other} and {id} both map to variant {variant}");
        }
        variants.push((variant, id));
    }

    let mut out = String::new();
    writeln!(out, "// @generated by bgwork-gen. Do not edit.")?;
    writeln!(out)?;
    writeln!(out, "/// Background job identifiers registered by this application.")?;
    writeln!(out, "#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]")?;
    writeln!(out, "pub enum {type_name} {{")?;
    for (variant, _) in &variants {
        writeln!(out, "    {variant},")?;
    }
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(out, "impl {type_name} {{")?;
    let all = variants
        .iter()
        .map(|(v, _)| format!("Self::{v}"))
        .collect::<Vec<_>>()
        .join(", ");
    writeln!(out, "    pub const ALL: [Self; {}] = [{all}];", variants.len())?;
    writeln!(out)?;
    writeln!(out, "    pub const fn as_str(self) -> &'static str {{")?;
    writeln!(out, "        match self {{")?;
    for (variant, id) in &variants {
        writeln!(out, "            Self::{variant} => {:?},", id.as_str())?;
    }
    writeln!(out, "        }}")?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(out, "impl std::fmt::Display for {type_name} {{")?;
    writeln!(
        out,
        "    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {{"
    )?;
    writeln!(out, "        f.write_str(self.as_str())")?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;
    Ok(out)
}

/// Render and write the module, creating parent directories as needed.
pub fn write_module(
    output_dir: &Path,
    package_name: &str,
    type_name: &str,
    ids: &[JobIdentifier],
) -> Result<PathBuf> {
    let path = module_path(output_dir, package_name, type_name)?;
    let source = render(type_name, ids)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, source).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), count = ids.len(), "identifier module written");
    Ok(path)
}

/// `DATA_SYNC` -> `DataSync`. Anything not alphanumeric separates words.
fn variant_name(id: &str) -> String {
    let mut name: String = id
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        name.insert_str(0, "Job");
    }
    name
}

/// `BackgroundJobIdentifiers` -> `background_job_identifiers`.
fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

fn is_rust_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    s != "_" && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
