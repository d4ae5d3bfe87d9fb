use relative_path::{RelativePath, RelativePathBuf};

/// A USFM book file inside a translation resource, e.g. `en_ult/43-JHN.usfm`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFile {
    relative_path: RelativePathBuf,
    book_id: String,
    display_name: String,
}

impl BookFile {
    /// Create a new BookFile from a path relative to the resource directory
    pub fn new(relative_path: RelativePathBuf) -> Self {
        let file_name = relative_path.file_name().unwrap_or(relative_path.as_str());
        let book_id = book_id(file_name);
        let display_name = book_name(file_name);

        Self {
            relative_path,
            book_id,
            display_name,
        }
    }

    /// Create from a relative path string
    pub fn from_relative_str(path: &str) -> Self {
        Self::new(RelativePathBuf::from(path))
    }

    /// Get the relative path
    pub fn relative_path(&self) -> &RelativePath {
        &self.relative_path
    }

    /// File name without directories, e.g. `43-JHN.usfm`
    pub fn file_name(&self) -> &str {
        self.relative_path
            .file_name()
            .unwrap_or(self.relative_path.as_str())
    }

    /// Upper-cased book code used to find annotation tables, e.g. `JHN`
    pub fn book_id(&self) -> &str {
        &self.book_id
    }

    /// Name shown in book lists (file name without number prefix or extension)
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The same book inside another translation's book directory.
    pub fn in_directory(&self, directory: &str) -> Self {
        Self::new(RelativePath::new(directory).join(self.file_name()))
    }
}

impl From<RelativePathBuf> for BookFile {
    fn from(path: RelativePathBuf) -> Self {
        Self::new(path)
    }
}

impl From<&str> for BookFile {
    fn from(path: &str) -> Self {
        Self::from_relative_str(path)
    }
}

/// Book code from a file name: the part after the first `-`, without the
/// extension (`43-JHN.usfm` gives `JHN`).
pub fn book_id(file_name: &str) -> String {
    let file_name = file_name.rsplit('/').next().unwrap_or(file_name);
    let stem = file_name.strip_suffix(".usfm").unwrap_or(file_name);
    let code = match stem.split_once('-') {
        Some((_, rest)) => rest.split('-').next().unwrap_or(rest),
        None => stem,
    };
    code.to_uppercase()
}

/// Display name: directory, extension and numeric prefix removed.
pub fn book_name(file_name: &str) -> String {
    let file_name = file_name.rsplit('/').next().unwrap_or(file_name);
    let stem = file_name.strip_suffix(".usfm").unwrap_or(file_name);
    match stem.split_once('-') {
        Some((number, rest)) if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) => {
            rest.to_string()
        }
        _ => stem.to_string(),
    }
}
