use std::fmt;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mkv", "webm", "mp4"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCategory {
    Images,
    Videos,
}

impl MediaCategory {
    /// Passes run in this order on every invocation.
    pub const ALL: [MediaCategory; 2] = [MediaCategory::Images, MediaCategory::Videos];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Images => "images",
            Self::Videos => "videos",
        }
    }

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Images => IMAGE_EXTENSIONS,
            Self::Videos => VIDEO_EXTENSIONS,
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
