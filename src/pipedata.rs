//! Uniform read view over an in-RAM string or a spooled file.
//!
//! See `spec.md` §3 ("PipeData") and §4.4.

use crate::fs::FileSystem;

/// A pipeline stage's output: either held inline or spilled to the
/// spool file once it grows past the configured threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipeData {
    Inline(String),
    Spooled(String),
}

impl PipeData {
    /// An empty inline buffer — the seed value for the first stage.
    pub fn empty() -> Self {
        PipeData::Inline(String::new())
    }

    /// Materialize the full text, reading the spool file if needed.
    pub async fn as_text(&self, fs: &dyn FileSystem) -> String {
        match self {
            PipeData::Inline(s) => s.clone(),
            PipeData::Spooled(path) => fs.read_file(path).await.unwrap_or_default(),
        }
    }

    /// Line-oriented view of the text (used by `SPLITL` and by commands
    /// that want to iterate input line by line).
    pub async fn lines(&self, fs: &dyn FileSystem) -> Vec<String> {
        splitlines(&self.as_text(fs).await)
    }

    /// Wrap a freshly produced stage output, spooling it to `spool_path`
    /// when its length is at or above `spool_threshold`.
    ///
    /// `spec.md` §4.4: only one spooled stage is live at a time, because
    /// the VM fully materializes stage *k*'s text into stage *k+1*'s
    /// input before stage *k+1* writes its own output to the spool path.
    pub async fn spool(
        output: String,
        fs: &dyn FileSystem,
        spool_path: &str,
        spool_threshold: usize,
    ) -> Self {
        if output.len() >= spool_threshold {
            // Ignore write failures; a read-back miss degrades to empty
            // text rather than aborting the pipeline.
            let _ = fs.write_file(spool_path, &output).await;
            PipeData::Spooled(spool_path.to_string())
        } else {
            PipeData::Inline(output)
        }
    }
}

/// Split text into lines the way Python's `str.splitlines()` does:
/// no trailing empty element for a final newline, no element at all
/// for an empty string.
pub fn splitlines(s: &str) -> Vec<String> {
    if s.is_empty() {
        return Vec::new();
    }
    s.lines().map(|l| l.to_string()).collect()
}
