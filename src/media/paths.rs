use crate::error::OrganizerError;
use crate::media::categories::MediaCategory;
use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};

/// Directories resolved once at startup and passed down to each pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizerPaths {
    pub source_dir: PathBuf,
    pub images_dir: PathBuf,
    pub videos_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl OrganizerPaths {
    pub fn dest_for(&self, category: MediaCategory) -> &Path {
        match category {
            MediaCategory::Images => &self.images_dir,
            MediaCategory::Videos => &self.videos_dir,
        }
    }
}

/// Values given explicitly on the command line; these win over everything.
#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub source_dir: Option<PathBuf>,
    pub images_dir: Option<PathBuf>,
    pub videos_dir: Option<PathBuf>,
}

fn pick(
    flag: Option<&PathBuf>,
    env_value: Option<String>,
    fallback: impl FnOnce() -> Result<PathBuf>,
) -> Result<PathBuf> {
    if let Some(flag) = flag {
        return Ok(flag.clone());
    }
    match env_value {
        Some(v) if !v.trim().is_empty() => Ok(PathBuf::from(v.trim())),
        _ => fallback(),
    }
}

fn under_home(home: Option<&Path>, rel: &str, what: &'static str) -> Result<PathBuf> {
    match home {
        Some(home) => Ok(home.join(rel)),
        None => Err(OrganizerError::HomeDirUnavailable(what).into()),
    }
}

pub fn resolve_paths_with(
    overrides: &PathOverrides,
    home: Option<&Path>,
    downloads: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<OrganizerPaths> {
    let source_dir = pick(
        overrides.source_dir.as_ref(),
        lookup("MEDIA_SOURCE_DIR"),
        || match downloads {
            Some(dir) => Ok(dir.to_path_buf()),
            None => under_home(home, "Downloads", "source dir"),
        },
    )?;
    let images_dir = pick(
        overrides.images_dir.as_ref(),
        lookup("MEDIA_IMAGES_DIR"),
        || under_home(home, "Documents/Personal/Hobbies/Memes", "images dir"),
    )?;
    let videos_dir = pick(
        overrides.videos_dir.as_ref(),
        lookup("MEDIA_VIDEOS_DIR"),
        || under_home(home, "Videos/Memes", "videos dir"),
    )?;
    let logs_dir = pick(None, lookup("MEDIA_ORGANIZER_LOGS_DIR"), || {
        under_home(home, ".media_organizer/logs", "logs dir")
    })?;

    Ok(OrganizerPaths {
        source_dir,
        images_dir,
        videos_dir,
        logs_dir,
    })
}

pub fn resolve_paths(overrides: &PathOverrides) -> Result<OrganizerPaths> {
    let home = dirs::home_dir();
    let downloads = dirs::download_dir();
    resolve_paths_with(overrides, home.as_deref(), downloads.as_deref(), |var| {
        env::var(var).ok()
    })
}
