//! Packing-hint manifest (`.pakflags`).
//!
//! Each line assigns [`PackHints`] to a target:
//!
//! ```text
//! 0x00000101 0x0000 /
//! 0x00000001 0x0000 /sound/
//! 0x00000101 0x0008 /materials/logo.vtf
//! ```
//!
//! `/` is the root, a trailing `/` marks a directory (covering everything
//! below it) and anything else names a single file. When several lines
//! match a path the last one wins.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;

use tracing::error;

use crate::ExtractionError;
use crate::Result;
use crate::formats::ArchiveEntry;
use crate::formats::PackHints;

/// What a manifest line applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HintTarget {
    /// Every entry.
    Root,
    /// Every entry below the directory (no leading or trailing slash).
    Directory(String),
    /// Exactly one entry.
    File(String),
}

impl HintTarget {
    /// Returns `true` if this target covers the entry at `path`.
    #[must_use]
    pub fn covers(&self, path: &str) -> bool {
        match self {
            Self::Root => true,
            Self::Directory(dir) => path
                .strip_prefix(dir.as_str())
                .is_some_and(|rest| rest.starts_with('/')),
            Self::File(file) => file == path,
        }
    }
}

impl fmt::Display for HintTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("/"),
            Self::Directory(dir) => write!(f, "/{dir}/"),
            Self::File(file) => write!(f, "/{file}"),
        }
    }
}

/// One manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintLine {
    /// Hints assigned by this line.
    pub hints: PackHints,
    /// Entries the line applies to.
    pub target: HintTarget,
}

/// Ordered packing-hint lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackHintsManifest {
    lines: Vec<HintLine>,
}

impl PackHintsManifest {
    /// Generates a compact manifest that relies on directory inheritance.
    ///
    /// Every directory takes the most common hints among all files below it
    /// (ties go to the smaller hints). A line is written for the root, for
    /// each directory whose choice differs from its parent's and for each
    /// file that differs from its directory.
    #[must_use]
    pub fn generate(entries: &[ArchiveEntry]) -> Self {
        let mut root = DirNode::default();
        for entry in entries {
            root.insert(&entry.path, entry.hints);
        }
        let mut manifest = Self::default();
        if !entries.is_empty() {
            root.emit("", None, &mut manifest.lines);
        }
        manifest
    }

    /// Generates one line per entry, in listing order, with no inheritance.
    #[must_use]
    pub fn generate_explicit(entries: &[ArchiveEntry]) -> Self {
        Self {
            lines: entries
                .iter()
                .map(|e| HintLine {
                    hints: e.hints,
                    target: HintTarget::File(e.path.clone()),
                })
                .collect(),
        }
    }

    /// Parses manifest text.
    ///
    /// Fields are separated by single spaces; the path is everything after
    /// the second space, kept verbatim.
    ///
    /// # Errors
    ///
    /// Returns a description of the first malformed line.
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        let mut lines = Vec::new();
        for (number, raw) in text.lines().enumerate() {
            // The path runs to the end of the line, trailing spaces included.
            let line = raw.trim_start();
            if line.trim_end().is_empty() || line.starts_with('#') {
                continue;
            }
            let bad = |what: &str| format!("line {}: {what}: {raw:?}", number + 1);
            let mut fields = line.splitn(3, ' ');
            let load = fields
                .next()
                .and_then(|f| f.strip_prefix("0x"))
                .and_then(|f| u32::from_str_radix(f, 16).ok())
                .ok_or_else(|| bad("bad load flags"))?;
            let texture = fields
                .next()
                .and_then(|f| f.strip_prefix("0x"))
                .and_then(|f| u16::from_str_radix(f, 16).ok())
                .ok_or_else(|| bad("bad texture flags"))?;
            let path = fields.next().ok_or_else(|| bad("missing path"))?;
            let target = if path == "/" {
                HintTarget::Root
            } else if let Some(dir) = path.strip_prefix('/').and_then(|p| p.strip_suffix('/')) {
                HintTarget::Directory(dir.to_string())
            } else if let Some(file) = path.strip_prefix('/') {
                HintTarget::File(file.to_string())
            } else {
                return Err(bad("path must start with /"));
            };
            lines.push(HintLine {
                hints: PackHints::new(load, texture),
                target,
            });
        }
        Ok(Self { lines })
    }

    /// The lines in file order.
    #[must_use]
    pub fn lines(&self) -> &[HintLine] {
        &self.lines
    }

    /// Hints the manifest assigns to `path`, if any line covers it.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<PackHints> {
        self.lines
            .iter()
            .rev()
            .find(|line| line.target.covers(path))
            .map(|line| line.hints)
    }

    /// Checks that the rendered manifest reproduces every entry's hints.
    ///
    /// The manifest is rendered to text and reparsed first, so formatting
    /// bugs are caught along with resolution bugs.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::ManifestMismatch`] carrying the manifest
    /// text. A failure here is a bug in the generator, not bad input.
    pub fn validate(&self, entries: &[ArchiveEntry]) -> Result<()> {
        let text = self.to_string();
        let mismatch = |reason: String| {
            error!(%reason, manifest = %text, "generated packing hints failed validation");
            ExtractionError::ManifestMismatch {
                reason,
                manifest: text.clone(),
            }
        };

        let parsed = Self::parse(&text).map_err(mismatch)?;
        for entry in entries {
            let resolved = parsed.resolve(&entry.path);
            if resolved != Some(entry.hints) {
                let got = resolved.map_or_else(|| "nothing".to_string(), |h| h.to_string());
                return Err(mismatch(format!(
                    "{} resolved to {got}, expected {}",
                    entry.path, entry.hints
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for PackHintsManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# <load flags> <texture flags> <path>")?;
        writeln!(f, "# the last matching line wins; /dir/ covers everything below it")?;
        for line in &self.lines {
            writeln!(f, "{} {}", line.hints, line.target)?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct DirNode<'a> {
    counts: HashMap<PackHints, usize>,
    files: BTreeMap<&'a str, (&'a str, PackHints)>,
    dirs: BTreeMap<&'a str, DirNode<'a>>,
}

impl<'a> DirNode<'a> {
    fn insert(&mut self, path: &'a str, hints: PackHints) {
        let mut node = self;
        let mut rest = path;
        loop {
            *node.counts.entry(hints).or_default() += 1;
            match rest.split_once('/') {
                Some((dir, tail)) => {
                    node = node.dirs.entry(dir).or_default();
                    rest = tail;
                }
                None => {
                    node.files.insert(rest, (path, hints));
                    return;
                }
            }
        }
    }

    fn most_common(&self) -> PackHints {
        self.counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(hints, _)| *hints)
            .unwrap_or_default()
    }

    fn emit(&self, dir: &str, inherited: Option<PackHints>, out: &mut Vec<HintLine>) {
        let best = self.most_common();
        if inherited != Some(best) {
            out.push(HintLine {
                hints: best,
                target: if dir.is_empty() {
                    HintTarget::Root
                } else {
                    HintTarget::Directory(dir.to_string())
                },
            });
        }
        for (path, hints) in self.files.values() {
            if *hints != best {
                out.push(HintLine {
                    hints: *hints,
                    target: HintTarget::File((*path).to_string()),
                });
            }
        }
        for (name, child) in &self.dirs {
            let path = if dir.is_empty() {
                (*name).to_string()
            } else {
                format!("{dir}/{name}")
            };
            child.emit(&path, Some(best), out);
        }
    }
}
