use thiserror::Error;

const MAX_FILENAME_BYTES: usize = 255;

#[derive(Debug, Error, PartialEq)]
pub enum FilenameError {
    #[error("Filename is empty")]
    Empty,

    #[error("Filename '{0}' is reserved")]
    Reserved(String),

    #[error("Hidden filenames are not allowed: {0}")]
    Hidden(String),

    #[error("Filename contains control characters")]
    ControlCharacter,

    #[error("Filename is longer than {MAX_FILENAME_BYTES} bytes")]
    TooLong,
}

/// Reduces a client-supplied filename to a bare name that is safe to join
/// onto the upload directory. Directory components are dropped on both `/`
/// and `\` so `../../etc/passwd` and `C:\temp\a.txt` become `passwd` and
/// `a.txt`.
pub fn sanitize_filename(raw: &str) -> Result<String, FilenameError> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();

    if base.is_empty() {
        return Err(FilenameError::Empty);
    }
    if base == "." || base == ".." {
        return Err(FilenameError::Reserved(base.to_string()));
    }
    if base.starts_with('.') {
        return Err(FilenameError::Hidden(base.to_string()));
    }
    if base.chars().any(char::is_control) {
        return Err(FilenameError::ControlCharacter);
    }
    if base.len() > MAX_FILENAME_BYTES {
        return Err(FilenameError::TooLong);
    }

    Ok(base.to_string())
}

/// True when `name` can be used verbatim as a stored filename.
pub fn is_plain_filename(name: &str) -> bool {
    sanitize_filename(name).is_ok_and(|sanitized| sanitized == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_plain_names_verbatim() {
        assert_eq!(sanitize_filename("report.pdf").unwrap(), "report.pdf");
        assert_eq!(
            sanitize_filename("quarterly report (final).xlsx").unwrap(),
            "quarterly report (final).xlsx"
        );
        assert_eq!(sanitize_filename("文件.txt").unwrap(), "文件.txt");
    }

    #[test]
    fn strips_directory_components() {
        assert_eq!(sanitize_filename("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_filename("/var/tmp/a.zip").unwrap(), "a.zip");
        assert_eq!(sanitize_filename("C:\\Users\\me\\a.txt").unwrap(), "a.txt");
    }

    #[test]
    fn rejects_unusable_names() {
        assert_eq!(sanitize_filename(""), Err(FilenameError::Empty));
        assert_eq!(sanitize_filename("uploads/"), Err(FilenameError::Empty));
        assert_eq!(
            sanitize_filename("a/.."),
            Err(FilenameError::Reserved("..".to_string()))
        );
        assert_eq!(
            sanitize_filename(".bashrc"),
            Err(FilenameError::Hidden(".bashrc".to_string()))
        );
        assert_eq!(
            sanitize_filename("bad\u{0}name.txt"),
            Err(FilenameError::ControlCharacter)
        );
        assert_eq!(
            sanitize_filename(&"a".repeat(256)),
            Err(FilenameError::TooLong)
        );
    }

    #[test]
    fn plain_filename_check() {
        assert!(is_plain_filename("report.pdf"));
        assert!(!is_plain_filename("../report.pdf"));
        assert!(!is_plain_filename(".."));
        assert!(!is_plain_filename(".hidden"));
    }
}
