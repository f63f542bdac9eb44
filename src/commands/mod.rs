pub mod organize;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }

    pub fn merge(&mut self, mut other: CommandReport) {
        self.ok &= other.ok;
        self.details.append(&mut other.details);
        self.issues.append(&mut other.issues);
    }
}

#[cfg(test)]
mod tests {
    use super::CommandReport;

    #[test]
    fn merge_carries_issues_and_failure() {
        let mut images = CommandReport::new("organize");
        images.detail("Moved 1 files");

        let mut videos = CommandReport::new("organize-videos");
        videos.issue("videos pass failed");

        images.merge(videos);
        assert!(!images.ok);
        assert_eq!(images.details, vec!["Moved 1 files".to_string()]);
        assert_eq!(images.issues, vec!["videos pass failed".to_string()]);
    }
}
