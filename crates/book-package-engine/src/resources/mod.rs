//! Local resource store.
//!
//! Each synced resource lives in `<data_dir>/resources/<owner>/<repo>/`,
//! holding the extracted release archive and a `version.txt` stamp. Help
//! resources (notes, word links, questions, articles) keep their files
//! under a folder named after the repository.

pub mod links;

use crate::annotations::{
    self, AnnotationError, TranslationNote, TranslationQuestion, WordLink,
};
use crate::decode::{self, DecodeError};
use crate::models::{Book, BookFile};
use relative_path::{Component, RelativePath, RelativePathBuf};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use crate::models::book_file::{book_id, book_name};
pub use links::{resolve_article_link, scripture_link};

/// Title shown when an academy article has no `title.md`.
pub const DEFAULT_ACADEMY_TITLE: &str = "Translation Academy";

const VERSION_FILE: &str = "version.txt";

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid resource link: {0}")]
    InvalidLink(String),
    #[error(transparent)]
    Annotation(#[from] AnnotationError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// A repository on the resource host, e.g. `unfoldingWord/en_ult`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    pub owner: String,
    pub repo: String,
}

impl ResourceId {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for ResourceId {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(Self::new(owner, repo))
            }
            _ => Err(ResourceError::InvalidLink(s.to_string())),
        }
    }
}

/// A help article read from a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// Path inside the resource's content folder, used to resolve links.
    pub path: RelativePathBuf,
    pub content: String,
}

/// Reads synced resources from the data directory.
#[derive(Debug, Clone)]
pub struct ResourceStore {
    root: PathBuf,
}

impl ResourceStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            root: data_dir.join("resources"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resource_dir(&self, id: &ResourceId) -> PathBuf {
        self.root.join(&id.owner).join(&id.repo)
    }

    pub fn version_file(&self, id: &ResourceId) -> PathBuf {
        self.resource_dir(id).join(VERSION_FILE)
    }

    /// Where the release archive is downloaded, next to the resource directory.
    pub fn archive_path(&self, id: &ResourceId) -> PathBuf {
        self.root.join(&id.owner).join(format!("{}.zip", id.repo))
    }

    /// The release tag recorded by the last successful sync.
    pub fn installed_version(&self, id: &ResourceId) -> Result<Option<String>, ResourceError> {
        let path = self.version_file(id);
        if !path.exists() {
            return Ok(None);
        }
        let version = fs::read_to_string(&path)?;
        let version = version.trim();
        Ok((!version.is_empty()).then(|| version.to_string()))
    }

    pub fn write_version(&self, id: &ResourceId, version: &str) -> Result<(), ResourceError> {
        let path = self.version_file(id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, version).map_err(ResourceError::Io)
    }

    /// Read a file addressed relative to the resource directory.
    pub fn read_file(&self, id: &ResourceId, relative_path: &RelativePath) -> Result<String, ResourceError> {
        let absolute_path = relative_path.to_path(self.resource_dir(id));
        if !absolute_path.exists() {
            return Err(ResourceError::NotFound(absolute_path));
        }
        fs::read_to_string(&absolute_path).map_err(ResourceError::Io)
    }

    /// USFM books of a translation, sorted by file name.
    ///
    /// Release archives extract into a single top-level folder; when the
    /// resource directory holds exactly one such entry, book paths are
    /// given relative to the resource directory through that folder.
    pub fn list_books(&self, id: &ResourceId) -> Result<Vec<BookFile>, ResourceError> {
        let dir = self.resource_dir(id);
        if !dir.is_dir() {
            return Err(ResourceError::NotFound(dir));
        }

        let entries = entry_names(&dir)?;
        let content_entries: Vec<&String> = entries
            .iter()
            .filter(|name| !name.ends_with(".txt") && !name.ends_with(".json") && !name.starts_with('.'))
            .collect();

        let mut files: Vec<String> = entries.clone();
        if let [folder] = content_entries.as_slice() {
            let folder_path = dir.join(folder.as_str());
            if folder_path.is_dir() {
                let nested = entry_names(&folder_path)?;
                if !nested.is_empty() {
                    files = nested.into_iter().map(|name| format!("{folder}/{name}")).collect();
                }
            }
        }

        let mut books: Vec<String> = files.into_iter().filter(|f| f.ends_with(".usfm")).collect();
        books.sort();
        Ok(books.into_iter().map(|f| BookFile::from(f.as_str())).collect())
    }

    pub fn read_book(&self, id: &ResourceId, book: &RelativePath) -> Result<String, ResourceError> {
        self.read_file(id, book)
    }

    /// Read and decode a book.
    pub fn load_book(&self, id: &ResourceId, book: &RelativePath) -> Result<Book, ResourceError> {
        let raw = self.read_book(id, book)?;
        Ok(decode::decode_book(&raw)?)
    }

    pub fn translation_notes(&self, id: &ResourceId, book_id: &str) -> Result<Vec<TranslationNote>, ResourceError> {
        match self.read_table(id, "tn", book_id)? {
            Some(tsv) => Ok(annotations::parse_translation_notes(&tsv)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn word_links(&self, id: &ResourceId, book_id: &str) -> Result<Vec<WordLink>, ResourceError> {
        match self.read_table(id, "twl", book_id)? {
            Some(tsv) => Ok(annotations::parse_word_links(&tsv)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn translation_questions(
        &self,
        id: &ResourceId,
        book_id: &str,
    ) -> Result<Vec<TranslationQuestion>, ResourceError> {
        match self.read_table(id, "tq", book_id)? {
            Some(tsv) => Ok(annotations::parse_translation_questions(&tsv)?),
            None => Ok(Vec::new()),
        }
    }

    /// A missing table is not an error; the book simply has no rows.
    fn read_table(&self, id: &ResourceId, prefix: &str, book_id: &str) -> Result<Option<String>, ResourceError> {
        let file_name = format!("{prefix}_{}.tsv", book_id.to_uppercase());
        let path = self.content_path(id, RelativePath::new(&file_name));
        match self.read_file(id, &path) {
            Ok(tsv) => Ok(Some(tsv)),
            Err(ResourceError::NotFound(missing)) => {
                log::warn!("No {prefix} table for {book_id}: {}", missing.display());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Article behind a word link such as `rc://*/tw/dict/bible/kt/god`.
    pub fn translation_word(&self, id: &ResourceId, tw_link: &str) -> Result<Article, ResourceError> {
        let path = links::word_article_path(tw_link)
            .ok_or_else(|| ResourceError::InvalidLink(tw_link.to_string()))?;
        self.help_article(id, &path)
    }

    /// Article behind a note's `SupportReference`.
    pub fn academy_article(&self, id: &ResourceId, support_reference: &str) -> Result<Article, ResourceError> {
        let path = links::academy_article_path(support_reference)
            .ok_or_else(|| ResourceError::InvalidLink(support_reference.to_string()))?;
        self.help_article(id, &path)
    }

    /// Any article of a help resource, addressed inside its content folder.
    pub fn help_article(&self, id: &ResourceId, path: &RelativePath) -> Result<Article, ResourceError> {
        if path.components().any(|c| c == Component::ParentDir) {
            return Err(ResourceError::InvalidLink(path.to_string()));
        }
        let content = self.read_file(id, &self.content_path(id, path))?;
        Ok(Article {
            path: path.to_relative_path_buf(),
            content,
        })
    }

    /// Title of an academy article, from the `title.md` beside it.
    pub fn academy_title(&self, id: &ResourceId, article: &RelativePath) -> String {
        let title_path = match article.parent() {
            Some(dir) => dir.join("title.md"),
            None => RelativePathBuf::from("title.md"),
        };
        match self.read_file(id, &self.content_path(id, &title_path)) {
            Ok(title) if !title.trim().is_empty() => title.trim().to_string(),
            Ok(_) => DEFAULT_ACADEMY_TITLE.to_string(),
            Err(e) => {
                log::debug!("No academy title for {article}: {e}");
                DEFAULT_ACADEMY_TITLE.to_string()
            }
        }
    }

    fn content_path(&self, id: &ResourceId, path: &RelativePath) -> RelativePathBuf {
        RelativePath::new(&id.repo).join(path)
    }
}

fn entry_names(dir: &Path) -> Result<Vec<String>, ResourceError> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_test_data_dir, create_test_file};
    use pretty_assertions::assert_eq;

    fn ult() -> ResourceId {
        ResourceId::new("unfoldingWord", "en_ult")
    }

    fn notes() -> ResourceId {
        ResourceId::new("unfoldingWord", "en_tn")
    }

    #[test]
    fn test_resource_paths() {
        let store = ResourceStore::new(Path::new("/data"));

        assert_eq!(store.resource_dir(&ult()), PathBuf::from("/data/resources/unfoldingWord/en_ult"));
        assert_eq!(
            store.version_file(&ult()),
            PathBuf::from("/data/resources/unfoldingWord/en_ult/version.txt")
        );
        assert_eq!(store.archive_path(&ult()), PathBuf::from("/data/resources/unfoldingWord/en_ult.zip"));
    }

    #[test]
    fn test_resource_id_parsing() {
        let id: ResourceId = "Worldview/en_bsb".parse().unwrap();
        assert_eq!(id, ResourceId::new("Worldview", "en_bsb"));
        assert_eq!(id.to_string(), "Worldview/en_bsb");

        assert!("en_bsb".parse::<ResourceId>().is_err());
        assert!("a/b/c".parse::<ResourceId>().is_err());
    }

    #[test]
    fn test_installed_version() {
        let data_dir = create_test_data_dir();
        let store = ResourceStore::new(data_dir.path());

        assert_eq!(store.installed_version(&ult()).unwrap(), None);

        store.write_version(&ult(), "v86\n").unwrap();
        assert_eq!(store.installed_version(&ult()).unwrap(), Some("v86".to_string()));
    }

    #[test]
    fn test_list_books_through_archive_folder() {
        let data_dir = create_test_data_dir();
        let store = ResourceStore::new(data_dir.path());
        create_test_file(&data_dir, "resources/unfoldingWord/en_ult/version.txt", "v1");
        create_test_file(&data_dir, "resources/unfoldingWord/en_ult/en_ult/43-JHN.usfm", "");
        create_test_file(&data_dir, "resources/unfoldingWord/en_ult/en_ult/01-GEN.usfm", "");
        create_test_file(&data_dir, "resources/unfoldingWord/en_ult/en_ult/manifest.yaml", "");

        let books = store.list_books(&ult()).unwrap();
        let paths: Vec<&str> = books.iter().map(|b| b.relative_path().as_str()).collect();
        assert_eq!(paths, vec!["en_ult/01-GEN.usfm", "en_ult/43-JHN.usfm"]);
        assert_eq!(books[1].book_id(), "JHN");
    }

    #[test]
    fn test_list_books_flat_directory() {
        let data_dir = create_test_data_dir();
        let store = ResourceStore::new(data_dir.path());
        create_test_file(&data_dir, "resources/unfoldingWord/en_ult/02-EXO.usfm", "");
        create_test_file(&data_dir, "resources/unfoldingWord/en_ult/01-GEN.usfm", "");

        let books = store.list_books(&ult()).unwrap();
        let paths: Vec<&str> = books.iter().map(|b| b.relative_path().as_str()).collect();
        assert_eq!(paths, vec!["01-GEN.usfm", "02-EXO.usfm"]);
    }

    #[test]
    fn test_list_books_missing_resource() {
        let data_dir = create_test_data_dir();
        let store = ResourceStore::new(data_dir.path());

        let result = store.list_books(&ult());
        assert!(matches!(result, Err(ResourceError::NotFound(_))));
    }

    #[test]
    fn test_load_book() {
        let data_dir = create_test_data_dir();
        let store = ResourceStore::new(data_dir.path());
        create_test_file(
            &data_dir,
            "resources/unfoldingWord/en_ult/en_ult/43-JHN.usfm",
            "\\id JHN\n\\h John\n\\c 1\n\\v 1 In the beginning\n",
        );

        let book = store.load_book(&ult(), RelativePath::new("en_ult/43-JHN.usfm")).unwrap();
        assert_eq!(book.id, "JHN");
        assert_eq!(book.title, "John");
        assert_eq!(book.chapters[0].verses[0].text, "In the beginning ");
    }

    #[test]
    fn test_load_malformed_book() {
        let data_dir = create_test_data_dir();
        let store = ResourceStore::new(data_dir.path());
        create_test_file(&data_dir, "resources/unfoldingWord/en_ult/bad.usfm", "\\c 1\n\\v 1 \\zaln-e\\*\n");

        let result = store.load_book(&ult(), RelativePath::new("bad.usfm"));
        assert!(matches!(result, Err(ResourceError::Decode(_))));
    }

    #[test]
    fn test_translation_notes_table() {
        let data_dir = create_test_data_dir();
        let store = ResourceStore::new(data_dir.path());
        create_test_file(
            &data_dir,
            "resources/unfoldingWord/en_tn/en_tn/tn_JHN.tsv",
            "Reference\tID\tTags\tSupportReference\tQuote\tOccurrence\tNote\n3:16\tab12\t\t\tοὕτως\t1\tThis is a note\n",
        );

        let notes = store.translation_notes(&notes(), "jhn").unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].verse, "16");
    }

    #[test]
    fn test_missing_table_is_empty() {
        let data_dir = create_test_data_dir();
        let store = ResourceStore::new(data_dir.path());

        assert!(store.translation_notes(&notes(), "JHN").unwrap().is_empty());
        assert!(
            store
                .word_links(&ResourceId::new("unfoldingWord", "en_twl"), "JHN")
                .unwrap()
                .is_empty()
        );
        assert!(
            store
                .translation_questions(&ResourceId::new("unfoldingWord", "en_tq"), "JHN")
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_translation_word_article() {
        let data_dir = create_test_data_dir();
        let store = ResourceStore::new(data_dir.path());
        let tw = ResourceId::new("unfoldingWord", "en_tw");
        create_test_file(&data_dir, "resources/unfoldingWord/en_tw/en_tw/bible/kt/god.md", "# God\n");

        let article = store.translation_word(&tw, "rc://*/tw/dict/bible/kt/god").unwrap();
        assert_eq!(article.path.as_str(), "bible/kt/god.md");
        assert_eq!(article.content, "# God\n");

        let invalid = store.translation_word(&tw, "not a link");
        assert!(matches!(invalid, Err(ResourceError::InvalidLink(_))));
    }

    #[test]
    fn test_links_cannot_leave_content_folder() {
        let data_dir = create_test_data_dir();
        let store = ResourceStore::new(data_dir.path());
        let tw = ResourceId::new("unfoldingWord", "en_tw");
        create_test_file(&data_dir, "resources/unfoldingWord/en_tw/en_tw/bible/kt/god.md", "# God\n");
        create_test_file(&data_dir, "secret.md", "private\n");
        create_test_file(&data_dir, "resources/unfoldingWord/en_tw/version.md", "v1\n");

        let escaped = store.translation_word(&tw, "rc://*/tw/dict/../../../../secret");
        assert!(matches!(escaped, Err(ResourceError::InvalidLink(_))));

        let sibling = store.translation_word(&tw, "rc://*/tw/dict/../version");
        assert!(matches!(sibling, Err(ResourceError::InvalidLink(_))));

        let academy = store.academy_article(&tw, "rc://*/ta/man/../../../../secret");
        assert!(matches!(academy, Err(ResourceError::InvalidLink(_))));

        let direct = store.help_article(&tw, RelativePath::new("../../../secret.md"));
        assert!(matches!(direct, Err(ResourceError::InvalidLink(_))));
    }

    #[test]
    fn test_academy_article_and_title() {
        let data_dir = create_test_data_dir();
        let store = ResourceStore::new(data_dir.path());
        let ta = ResourceId::new("unfoldingWord", "en_ta");
        create_test_file(
            &data_dir,
            "resources/unfoldingWord/en_ta/en_ta/translate/figs-metaphor/01.md",
            "A metaphor is...",
        );
        create_test_file(
            &data_dir,
            "resources/unfoldingWord/en_ta/en_ta/translate/figs-metaphor/title.md",
            "Metaphor\n",
        );
        create_test_file(
            &data_dir,
            "resources/unfoldingWord/en_ta/en_ta/translate/figs-simile/01.md",
            "A simile is...",
        );

        let article = store
            .academy_article(&ta, "rc://*/ta/man/translate/figs-metaphor")
            .unwrap();
        assert_eq!(article.path.as_str(), "translate/figs-metaphor/01.md");
        assert_eq!(article.content, "A metaphor is...");
        assert_eq!(store.academy_title(&ta, &article.path), "Metaphor");

        let linked = resolve_article_link(&article.path, "../figs-simile/01.md").unwrap();
        let simile = store.help_article(&ta, &linked).unwrap();
        assert_eq!(simile.content, "A simile is...");
        assert_eq!(store.academy_title(&ta, &simile.path), DEFAULT_ACADEMY_TITLE);
    }
}
