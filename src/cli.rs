use anyhow::{Result, bail};
use clap::Parser;
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::commands::organize::{self, OrganizeOptions};
use crate::media::paths::{PathOverrides, resolve_paths};

const LEGACY_IMAGES_FLAG: &str = "-images-dir";

#[derive(Debug, Parser)]
#[command(
    name = "organize-media",
    version,
    about = "Move downloaded images and videos into week folders, named by content hash, skipping duplicates"
)]
pub struct Cli {
    /// Directory scanned for media files (not recursive)
    #[arg(long, value_name = "PATH")]
    pub source_dir: Option<PathBuf>,

    /// Destination root for jpg, jpeg, png, webp and gif files
    #[arg(long, value_name = "PATH")]
    pub images_dir: Option<PathBuf>,

    /// Destination root for mkv, webm and mp4 files
    #[arg(long, value_name = "PATH")]
    pub videos_dir: Option<PathBuf>,

    /// Hash and plan moves without touching the filesystem
    #[arg(long)]
    pub dry_run: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Rewrite the historical single-dash `-images-dir` spelling to
/// `--images-dir`. Arguments after `--` are left alone.
pub fn normalize_legacy_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut out = Vec::new();
    let mut passthrough = false;
    for (idx, arg) in args.into_iter().enumerate() {
        if idx == 0 || passthrough {
            out.push(arg);
            continue;
        }
        let rewritten = match arg.to_str() {
            Some("--") => {
                passthrough = true;
                None
            }
            Some(LEGACY_IMAGES_FLAG) => Some(OsString::from("--images-dir")),
            Some(s) => s
                .strip_prefix(LEGACY_IMAGES_FLAG)
                .and_then(|rest| rest.strip_prefix('='))
                .map(|value| OsString::from(format!("--images-dir={value}"))),
            None => None,
        };
        out.push(rewritten.unwrap_or(arg));
    }
    out
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for detail in &report.details {
        println!("{detail}");
    }
    for issue in &report.issues {
        println!("issue: {issue}");
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse_from(normalize_legacy_flags(env::args_os()));

    let paths = resolve_paths(&PathOverrides {
        source_dir: cli.source_dir,
        images_dir: cli.images_dir,
        videos_dir: cli.videos_dir,
    })?;

    let report = organize::run(&OrganizeOptions {
        paths,
        dry_run: cli.dry_run,
    })?;
    print_report(&report, cli.json)?;

    if !report.ok {
        bail!("{} failed: {}", report.command, report.issues.join("; "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn args(raw: &[&str]) -> Vec<OsString> {
        raw.iter().map(OsString::from).collect()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn legacy_single_dash_images_flag_is_accepted() {
        let cli = Cli::try_parse_from(normalize_legacy_flags(args(&[
            "organize-media",
            "-images-dir",
            "/pics",
            "--videos-dir",
            "/vids",
        ])))
        .expect("parse");
        assert_eq!(cli.images_dir, Some(PathBuf::from("/pics")));
        assert_eq!(cli.videos_dir, Some(PathBuf::from("/vids")));
        assert_eq!(cli.source_dir, None);
    }

    #[test]
    fn legacy_flag_with_equals_is_accepted() {
        let cli = Cli::try_parse_from(normalize_legacy_flags(args(&[
            "organize-media",
            "-images-dir=/pics",
        ])))
        .expect("parse");
        assert_eq!(cli.images_dir, Some(PathBuf::from("/pics")));
    }

    #[test]
    fn normalization_leaves_values_and_passthrough_alone() {
        let got = normalize_legacy_flags(args(&[
            "-images-dir",
            "--source-dir",
            "-images-dir",
            "--",
            "-images-dir",
        ]));
        assert_eq!(
            got,
            args(&["-images-dir", "--source-dir", "--images-dir", "--", "-images-dir"])
        );
    }

    #[test]
    fn unknown_flags_are_rejected() {
        let err = Cli::try_parse_from(args(&["organize-media", "--target", "/x"]))
            .expect_err("unknown flag");
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn no_arguments_uses_defaults() {
        let cli = Cli::try_parse_from(args(&["organize-media"])).expect("parse");
        assert!(cli.source_dir.is_none());
        assert!(!cli.dry_run);
        assert!(!cli.json);
    }
}
