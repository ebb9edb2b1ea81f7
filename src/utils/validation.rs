use anyhow::{Result, anyhow};

/// Longest file name accepted, in bytes
pub const MAX_FILENAME_LEN: usize = 255;

/// Destination used when the client leaves the directory blank
pub const ROOT_DIRECTORY: &str = "/";

#[derive(Debug)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Reduces a client-supplied file name to its last path component.
/// Browsers on Windows may send the full path, so both separators are honoured.
pub fn sanitize_filename(filename: &str) -> Result<String> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();

    if name != filename.trim() {
        tracing::warn!("Stripped directory components from upload name: {}", filename);
    }

    if name.is_empty() || name == "." || name == ".." {
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename cannot be empty".to_string(),
        }));
    }

    if name.chars().any(|c| c.is_control()) {
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename contains control characters".to_string(),
        }));
    }

    // Limit length safely for UTF-8
    let sanitized = if name.len() > MAX_FILENAME_LEN {
        let mut end = MAX_FILENAME_LEN;
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        &name[..end]
    } else {
        name
    };

    Ok(sanitized.to_string())
}

/// Blank destination directories mean the bucket root.
pub fn normalize_directory(directory: &str) -> String {
    let trimmed = directory.trim();
    if trimmed.is_empty() {
        ROOT_DIRECTORY.to_string()
    } else {
        trimmed.to_string()
    }
}
