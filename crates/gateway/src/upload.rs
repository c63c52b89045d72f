/// Reduce a client-supplied filename to a safe basename.
///
/// Path separators become spaces, characters outside `[A-Za-z0-9_.-]` are
/// dropped, whitespace runs collapse to `_`, and leading/trailing `.` and `_`
/// are stripped. May return an empty string.
pub fn sanitize_filename(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = replaced.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// Lowercased extension after the last dot, if any.
pub fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("leaf.png"), "leaf.png");
        assert_eq!(sanitize_filename("My Crop Photo.JPG"), "My_Crop_Photo.JPG");
        assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\field.jpeg"), "C_Users_me_field.jpeg");
        assert_eq!(sanitize_filename("soja_é.png"), "soja_.png");
    }

    #[test]
    fn test_sanitize_can_empty_out() {
        assert_eq!(sanitize_filename(""), "");
        assert_eq!(sanitize_filename("../.."), "");
        assert_eq!(sanitize_filename("ééé"), "");
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("leaf.PNG").as_deref(), Some("png"));
        assert_eq!(extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension("noext"), None);
        assert_eq!(extension("trailing."), None);
        assert_eq!(extension(".png"), None);
    }
}
