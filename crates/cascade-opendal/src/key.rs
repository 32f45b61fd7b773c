//! Artifact key layout and filename sanitisation.

use std::fmt;

use uuid::Uuid;

/// Fallback name for filenames that sanitise down to nothing.
const FALLBACK_FILENAME: &str = "file";

/// Sanitises an untrusted upload filename.
///
/// Path components are stripped, separators and anything outside
/// `[A-Za-z0-9._-]` become underscores, and leading dots are removed so a
/// key segment can never traverse or hide. An empty result falls back to
/// `"file"`.
pub fn sanitize_filename(filename: &str) -> String {
    let basename = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let cleaned: String = basename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        FALLBACK_FILENAME.to_owned()
    } else {
        cleaned.to_owned()
    }
}

/// The object-store key of a pipeline run artifact.
///
/// Rendered as `{pipeline_id}/{pipeline_run_id}/{artifact_id}-{name}`. The
/// artifact id makes the key unique across the store even when two uploads
/// share a filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactKey {
    /// Pipeline of the producing run.
    pub pipeline_id: Uuid,
    /// Run that produced the artifact.
    pub pipeline_run_id: Uuid,
    /// Artifact identifier.
    pub artifact_id: Uuid,
    /// Sanitised artifact filename.
    pub name: String,
}

impl ArtifactKey {
    /// Creates a key, sanitising the filename.
    pub fn new(
        pipeline_id: Uuid,
        pipeline_run_id: Uuid,
        artifact_id: Uuid,
        filename: &str,
    ) -> Self {
        Self {
            pipeline_id,
            pipeline_run_id,
            artifact_id,
            name: sanitize_filename(filename),
        }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}-{}",
            self.pipeline_id, self.pipeline_run_id, self.artifact_id, self.name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_filenames_pass_through() {
        assert_eq!(sanitize_filename("report.csv"), "report.csv");
        assert_eq!(sanitize_filename("model_v2-final.bin"), "model_v2-final.bin");
    }

    #[test]
    fn path_components_are_stripped() {
        assert_eq!(sanitize_filename("/etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("../../escape.txt"), "escape.txt");
        assert_eq!(sanitize_filename("dir\\sub\\name.txt"), "name.txt");
    }

    #[test]
    fn leading_dots_are_removed() {
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename("..."), "file");
    }

    #[test]
    fn odd_characters_become_underscores() {
        assert_eq!(sanitize_filename("my file (1).txt"), "my_file__1_.txt");
        assert_eq!(sanitize_filename("naïve.txt"), "na_ve.txt");
    }

    #[test]
    fn empty_input_falls_back() {
        assert_eq!(sanitize_filename(""), "file");
        assert_eq!(sanitize_filename("///"), "file");
    }

    #[test]
    fn key_layout_is_stable() {
        let pipeline_id = Uuid::from_u128(1);
        let run_id = Uuid::from_u128(2);
        let artifact_id = Uuid::from_u128(3);
        let key = ArtifactKey::new(pipeline_id, run_id, artifact_id, "out put.txt");

        assert_eq!(
            key.to_string(),
            format!("{pipeline_id}/{run_id}/{artifact_id}-out_put.txt")
        );
    }
}
