//! End-to-end flatten run: export tree → one folder of notes + mirrored assets.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use vaultflat_markdown::TransformOptions;
use vaultflat_shared::{
    Document, FlattenOptions, FlattenSummary, Result, SkippedFile, VaultflatError,
};

use crate::resolver::FilenameResolver;

/// Markdown file extension, compared case-insensitively.
const MD_EXT: &str = ".md";

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after a Markdown file is written.
    fn markdown_converted(&self, relative_path: &Path, count: usize);
    /// Called after an asset is copied.
    fn asset_copied(&self, relative_path: &Path, count: usize);
    /// Called when a file is skipped.
    fn file_skipped(&self, path: &Path, reason: &str);
    /// Called when the run completes.
    fn done(&self, summary: &FlattenSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn markdown_converted(&self, _relative_path: &Path, _count: usize) {}
    fn asset_copied(&self, _relative_path: &Path, _count: usize) {}
    fn file_skipped(&self, _path: &Path, _reason: &str) {}
    fn done(&self, _summary: &FlattenSummary) {}
}

/// Flatten `export_root` into `output_dir`.
///
/// 1. Validate inputs and create the output (and assets) directory
/// 2. Seed the filename resolver with what is already in the output directory
/// 3. Walk the export tree in file-name order
/// 4. Markdown: strip frontmatter → rewrite links → breadcrumb → write under a unique name
/// 5. Everything else: copy to `<output>/<assets_dir>/<relative path>`
///
/// Per-file read, write, and copy failures are logged, recorded in the summary, and
/// skipped. Only setup failures return `Err`.
#[instrument(skip_all, fields(export_root = %export_root.display(), output_dir = %output_dir.display()))]
pub fn flatten(
    export_root: &Path,
    output_dir: &Path,
    options: &FlattenOptions,
    progress: &dyn ProgressReporter,
) -> Result<FlattenSummary> {
    options.validate()?;

    progress.phase("Preparing output");
    let mut run = FlattenRun::prepare(export_root, output_dir, options)?;

    info!(
        copy_assets = options.copy_assets,
        breadcrumbs = options.breadcrumbs,
        "starting flatten"
    );

    progress.phase("Converting");
    run.walk(progress);

    let summary = run.summary;
    info!(
        markdown = summary.markdown_converted,
        assets = summary.assets_copied,
        skipped = summary.skipped(),
        "flatten complete"
    );
    progress.done(&summary);

    Ok(summary)
}

/// State for one run. Nothing outlives it.
struct FlattenRun {
    export_root: PathBuf,
    output_dir: PathBuf,
    assets_root: Option<PathBuf>,
    transform: TransformOptions,
    resolver: FilenameResolver,
    summary: FlattenSummary,
}

impl FlattenRun {
    fn prepare(export_root: &Path, output_dir: &Path, options: &FlattenOptions) -> Result<Self> {
        let meta = std::fs::metadata(export_root).map_err(|e| {
            VaultflatError::validation(format!(
                "cannot access export root {}: {e}",
                export_root.display()
            ))
        })?;
        if !meta.is_dir() {
            return Err(VaultflatError::validation(format!(
                "export root {} is not a directory",
                export_root.display()
            )));
        }

        std::fs::create_dir_all(output_dir).map_err(|e| VaultflatError::io(output_dir, e))?;

        let export_root = export_root
            .canonicalize()
            .map_err(|e| VaultflatError::io(export_root, e))?;
        let output_dir = output_dir
            .canonicalize()
            .map_err(|e| VaultflatError::io(output_dir, e))?;

        let assets_root = if options.copy_assets {
            let root = output_dir.join(options.assets_dir.trim());
            std::fs::create_dir_all(&root).map_err(|e| VaultflatError::io(&root, e))?;
            Some(root)
        } else {
            None
        };

        let resolver = FilenameResolver::from_dir(&output_dir)?;

        Ok(Self {
            export_root,
            output_dir,
            summary: FlattenSummary {
                assets_root: assets_root.clone(),
                ..FlattenSummary::default()
            },
            assets_root,
            transform: TransformOptions::from(options),
            resolver,
        })
    }

    fn walk(&mut self, progress: &dyn ProgressReporter) {
        let output_dir = self.output_dir.clone();
        let walker = WalkDir::new(&self.export_root)
            .sort_by_file_name()
            .into_iter()
            // never re-ingest our own output when it lives inside the export
            .filter_entry(move |entry| entry.path() != output_dir.as_path());

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.export_root.clone());
                    self.skip(VaultflatError::read(path, err.into()), progress);
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            let relative = path
                .strip_prefix(&self.export_root)
                .unwrap_or(path)
                .to_path_buf();

            if is_markdown(path) {
                match self.convert_markdown(path, &relative) {
                    Ok(dest) => {
                        self.summary.markdown_converted += 1;
                        debug!(
                            src = %relative.display(),
                            dest = %dest.display(),
                            "converted"
                        );
                        progress.markdown_converted(&relative, self.summary.markdown_converted);
                    }
                    Err(err) => self.skip(err, progress),
                }
            } else if let Some(assets_root) = self.assets_root.clone() {
                match copy_asset(path, &relative, &assets_root) {
                    Ok(()) => {
                        self.summary.assets_copied += 1;
                        progress.asset_copied(&relative, self.summary.assets_copied);
                    }
                    Err(err) => self.skip(err, progress),
                }
            }
        }
    }

    #[instrument(level = "debug", skip_all, fields(path = %relative.display()))]
    fn convert_markdown(&mut self, path: &Path, relative: &Path) -> Result<PathBuf> {
        let content = std::fs::read_to_string(path).map_err(|e| VaultflatError::read(path, e))?;
        let doc = Document::new(content, path, relative);

        let text = vaultflat_markdown::transform(&doc, &self.transform);
        self.write_unique(&doc.file_name(), &text)
    }

    /// Write `text` under a fresh name. Never overwrites; never leaves a partial file.
    fn write_unique(&mut self, desired: &str, text: &str) -> Result<PathBuf> {
        loop {
            let name = self.resolver.resolve(desired);
            let dest = self.output_dir.join(&name);

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&dest) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    // appeared after the resolver was seeded; that name is claimed now
                    debug!(dest = %dest.display(), "destination appeared, retrying");
                    continue;
                }
                Err(e) => return Err(VaultflatError::write(&dest, e)),
            };

            let written = file.write_all(text.as_bytes());
            drop(file);
            finish_or_remove(&dest, written)?;
            return Ok(dest);
        }
    }

    fn skip(&mut self, err: VaultflatError, progress: &dyn ProgressReporter) {
        warn!(error = %err, "skipping file");
        if let Some(skipped) = SkippedFile::from_error(&err) {
            progress.file_skipped(&skipped.path, &skipped.reason);
        }
        self.summary.record_failure(&err);
    }
}

/// On a failed write, delete the half-written `dest` and report the write error.
fn finish_or_remove(dest: &Path, written: std::io::Result<()>) -> Result<()> {
    written.map_err(|e| {
        if let Err(cleanup) = std::fs::remove_file(dest) {
            warn!(dest = %dest.display(), error = %cleanup, "could not remove partial file");
        }
        VaultflatError::write(dest, e)
    })
}

/// Copy an asset to `<assets_root>/<relative>`, creating parent folders.
fn copy_asset(src: &Path, relative: &Path, assets_root: &Path) -> Result<()> {
    let dest = assets_root.join(relative);
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| VaultflatError::copy(src, &dest, e))?;
    }
    std::fs::copy(src, &dest).map_err(|e| VaultflatError::copy(src, &dest, e))?;
    Ok(())
}

fn is_markdown(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase().ends_with(MD_EXT))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use vaultflat_shared::FailureKind;

    fn fixture_path(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures")
            .join(name)
    }

    fn write(root: &Path, rel: &str, content: impl AsRef<[u8]>) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn read(root: &Path, rel: &str) -> String {
        fs::read_to_string(root.join(rel))
            .unwrap_or_else(|e| panic!("failed to read {rel}: {e}"))
    }

    fn run(export: &Path, out: &Path, options: &FlattenOptions) -> FlattenSummary {
        flatten(export, out, options, &SilentProgress).expect("flatten")
    }

    #[test]
    fn nested_note_is_fully_transformed() {
        let export = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write(
            export.path(),
            "Projects/Plan.md",
            "---\ntitle: x\n---\n[See](Other%20Page.md)",
        );

        let summary = run(export.path(), out.path(), &FlattenOptions::default());

        assert_eq!(summary.markdown_converted, 1);
        assert_eq!(
            read(out.path(), "Plan.md"),
            "**Parent:** [[Projects]]\n\n[[Other Page|See]]"
        );
    }

    #[test]
    fn identical_basenames_get_distinct_names() {
        let export = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write(export.path(), "A/Plan.md", "first");
        write(export.path(), "B/Plan.md", "second");

        let summary = run(export.path(), out.path(), &FlattenOptions::default());

        assert_eq!(summary.markdown_converted, 2);
        assert_eq!(read(out.path(), "Plan.md"), "**Parent:** [[A]]\n\nfirst");
        assert_eq!(read(out.path(), "Plan-1.md"), "**Parent:** [[B]]\n\nsecond");
    }

    #[test]
    fn assets_mirror_relative_paths() {
        let export = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write(export.path(), "A/img/pic.png", [0x89, b'P', b'N', b'G']);
        write(export.path(), "B/img/pic.png", [1, 2, 3]);
        write(export.path(), "data.csv", "a,b\n");

        let summary = run(export.path(), out.path(), &FlattenOptions::default());

        assert_eq!(summary.assets_copied, 3);
        let assets = out.path().join("assets");
        assert_eq!(fs::read(assets.join("A/img/pic.png")).unwrap(), [0x89, b'P', b'N', b'G']);
        assert_eq!(fs::read(assets.join("B/img/pic.png")).unwrap(), [1, 2, 3]);
        assert!(assets.join("data.csv").is_file());
    }

    #[test]
    fn custom_assets_dir() {
        let export = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write(export.path(), "pic.png", "x");

        let options = FlattenOptions {
            assets_dir: "attachments".into(),
            ..FlattenOptions::default()
        };
        let summary = run(export.path(), out.path(), &options);

        assert!(out.path().join("attachments/pic.png").is_file());
        assert!(summary.assets_root.unwrap().ends_with("attachments"));
    }

    #[test]
    fn no_assets_skips_copying() {
        let export = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write(export.path(), "Note.md", "hi");
        write(export.path(), "pic.png", "x");

        let options = FlattenOptions {
            copy_assets: false,
            ..FlattenOptions::default()
        };
        let summary = run(export.path(), out.path(), &options);

        assert_eq!(summary.markdown_converted, 1);
        assert_eq!(summary.assets_copied, 0);
        assert!(summary.assets_root.is_none());
        assert!(!out.path().join("assets").exists());
    }

    #[test]
    fn markdown_extension_is_case_insensitive() {
        let export = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write(export.path(), "LOUD.MD", "---\na: 1\n---\nbody");

        let summary = run(export.path(), out.path(), &FlattenOptions::default());

        assert_eq!(summary.markdown_converted, 1);
        assert_eq!(read(out.path(), "LOUD.MD"), "body");
    }

    #[test]
    fn rerun_never_overwrites() {
        let export = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write(export.path(), "Note.md", "v1");
        run(export.path(), out.path(), &FlattenOptions::default());

        write(export.path(), "Note.md", "v2");
        run(export.path(), out.path(), &FlattenOptions::default());

        assert_eq!(read(out.path(), "Note.md"), "v1");
        assert_eq!(read(out.path(), "Note-1.md"), "v2");
    }

    #[test]
    fn unreadable_markdown_is_skipped_and_run_continues() {
        let export = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write(export.path(), "A.md", [0xff, 0xfe, 0x00, b'x']);
        write(export.path(), "B.md", "fine");

        let summary = run(export.path(), out.path(), &FlattenOptions::default());

        assert_eq!(summary.markdown_converted, 1);
        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.failures[0].kind, FailureKind::ReadFailure);
        assert!(summary.failures[0].path.ends_with("A.md"));
        assert!(!out.path().join("A.md").exists());
        assert_eq!(read(out.path(), "B.md"), "fine");
    }

    #[test]
    fn write_and_copy_failures_are_skipped() {
        let export = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        // 255 bytes fits; the `-1` variant for the second copy does not
        let long = format!("{}.md", "n".repeat(252));
        write(export.path(), &format!("A/{long}"), "first");
        write(export.path(), &format!("B/{long}"), "second");
        write(export.path(), "pic.png", [0x89, b'P', b'N', b'G']);
        write(export.path(), "z.md", "last");
        fs::create_dir_all(out.path().join("assets/pic.png")).unwrap();

        let summary = run(export.path(), out.path(), &FlattenOptions::default());

        assert_eq!(summary.markdown_converted, 2);
        assert_eq!(summary.assets_copied, 0);
        let kinds: Vec<_> = summary.failures.iter().map(|f| f.kind).collect();
        assert_eq!(kinds, [FailureKind::WriteFailure, FailureKind::CopyFailure]);
        assert!(summary.failures[0].path.ends_with(format!("{}-1.md", "n".repeat(252))));
        assert!(summary.failures[1].path.ends_with("pic.png"));

        assert_eq!(read(out.path(), &long), "first");
        assert_eq!(read(out.path(), "z.md"), "last");
        assert!(out.path().join("assets/pic.png").is_dir());
    }

    #[test]
    fn failed_write_removes_partial_file() {
        let out = tempfile::tempdir().unwrap();
        let dest = out.path().join("Note.md");
        fs::write(&dest, "half").unwrap();

        let err = finish_or_remove(&dest, Err(std::io::Error::other("disk full"))).unwrap_err();

        assert_eq!(err.failure_kind(), Some(FailureKind::WriteFailure));
        assert!(!dest.exists());
        assert!(finish_or_remove(&out.path().join("Other.md"), Ok(())).is_ok());
    }

    #[test]
    fn output_inside_export_is_not_reingested() {
        let export = tempfile::tempdir().unwrap();
        write(export.path(), "Note.md", "hello");
        let out = export.path().join("vault");

        let summary = run(export.path(), &out, &FlattenOptions::default());
        assert_eq!(summary.markdown_converted, 1);
        assert_eq!(summary.assets_copied, 0);

        // second run sees the same single source file
        let summary = run(export.path(), &out, &FlattenOptions::default());
        assert_eq!(summary.markdown_converted, 1);
        assert!(out.join("Note-1.md").is_file());
        assert!(!out.join("Note-2.md").exists());
    }

    #[test]
    fn missing_export_root_is_fatal() {
        let out = tempfile::tempdir().unwrap();
        let err = flatten(
            &out.path().join("nope"),
            out.path(),
            &FlattenOptions::default(),
            &SilentProgress,
        )
        .expect_err("missing root");
        assert!(matches!(err, VaultflatError::Validation { .. }));
    }

    #[test]
    fn export_root_must_be_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "file.md", "x");
        let err = flatten(
            &dir.path().join("file.md"),
            &dir.path().join("out"),
            &FlattenOptions::default(),
            &SilentProgress,
        )
        .expect_err("file root");
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn uncreatable_output_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "export/Note.md", "x");
        write(dir.path(), "blocker", "a file, not a dir");

        let err = flatten(
            &dir.path().join("export"),
            &dir.path().join("blocker/out"),
            &FlattenOptions::default(),
            &SilentProgress,
        )
        .expect_err("output under a file");
        assert!(matches!(err, VaultflatError::Io { .. }));
    }

    #[test]
    fn invalid_assets_dir_is_rejected() {
        let export = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let options = FlattenOptions {
            assets_dir: "../outside".into(),
            ..FlattenOptions::default()
        };
        let err = flatten(export.path(), out.path(), &options, &SilentProgress)
            .expect_err("bad assets dir");
        assert!(matches!(err, VaultflatError::Config { .. }));
    }

    #[test]
    fn fixture_export_flattens() {
        let out = tempfile::tempdir().unwrap();
        let summary = run(&fixture_path("export"), out.path(), &FlattenOptions::default());

        assert_eq!(summary.markdown_converted, 4);
        assert_eq!(summary.assets_copied, 1);
        assert!(summary.failures.is_empty());

        let home = read(out.path(), "Home.md");
        assert!(!home.contains("**Parent:**"));
        assert!(home.contains("[[Plan|Project plan]]"));
        assert!(home.contains("[Website](https://example.com)"));

        // Archive/ sorts before Projects/
        let archived = read(out.path(), "Plan.md");
        assert!(archived.starts_with("**Parent:** [[Archive]]\n\n"));

        let plan = read(out.path(), "Plan-1.md");
        assert!(plan.starts_with("**Parent:** [[Projects]]\n\n"));
        assert!(!plan.contains("title:"));
        assert!(plan.contains("[[Other Page|See]]"));
        assert!(plan.contains("![diagram](images/diagram.png)"));

        let other = read(out.path(), "Other Page.md");
        assert!(other.contains("[[Plan]]"));

        assert!(out.path().join("assets/Projects/images/diagram.png").is_file());
    }
}
