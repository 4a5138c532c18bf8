use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Bytes read for a preview
pub const PREVIEW_LIMIT: usize = 10_000;

const TRUNCATION_NOTICE: &str = "\n\n... [File truncated for preview]";

#[derive(Debug, Clone)]
pub struct Preview {
    pub path: PathBuf,
    pub text: String,
    pub truncated: bool,
}

/// Read the head of a file as text, replacing undecodable bytes
pub fn preview<P: AsRef<Path>>(path: P) -> io::Result<Preview> {
    let path = path.as_ref();
    let mut buffer = Vec::with_capacity(PREVIEW_LIMIT);
    File::open(path)?
        .take(PREVIEW_LIMIT as u64)
        .read_to_end(&mut buffer)?;

    let truncated = buffer.len() == PREVIEW_LIMIT;
    let mut text = String::from_utf8_lossy(&buffer).into_owned();
    if truncated {
        text.push_str(TRUNCATION_NOTICE);
    }

    Ok(Preview {
        path: path.to_path_buf(),
        text,
        truncated,
    })
}
