use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    File(PathBuf),
    Literal,
}

/// Program text together with where it came from, kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub source: Source,
    pub content: String,
}

impl Input {
    pub fn literal(content: &str) -> Input {
        Input {
            source: Source::Literal,
            content: content.to_string(),
        }
    }

    pub fn name(&self) -> String {
        match &self.source {
            Source::File(path) => path.display().to_string(),
            Source::Literal => "<input>".to_string(),
        }
    }
}

pub fn read_file(path: &Path) -> io::Result<Input> {
    let content = fs::read_to_string(path)?;
    Ok(Input {
        source: Source::File(path.to_path_buf()),
        content,
    })
}
