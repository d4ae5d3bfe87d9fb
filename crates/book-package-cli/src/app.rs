//! Reader state. Everything here is independent of the terminal so it can
//! be driven from tests.

use book_package_config::{Config, TranslationConfig};
use book_package_engine::annotations::{self, Annotation};
use book_package_engine::resources::links;
use book_package_engine::{
    Article, Book, BookFile, Chapter, ResourceError, ResourceId, ResourceStore, TranslationNote,
    TranslationQuestion, Verse, WordLink, WordMarks, helps, mark_words, reconstruct_in_chapter,
};
use ratatui::widgets::ListState;

pub const DEFAULT_BOOK: &str = "43-JHN";
pub const DEFAULT_CHAPTER: &str = "3";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Notes,
    Words,
    Questions,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Notes, Tab::Words, Tab::Questions];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Notes => "Notes",
            Tab::Words => "Words",
            Tab::Questions => "Questions",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Tab::Notes => Tab::Words,
            Tab::Words => Tab::Questions,
            Tab::Questions => Tab::Notes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Books,
    Helps,
}

/// One row of the helps pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpItem {
    pub reference: String,
    /// Receptor words the row is about.
    pub phrase: String,
    pub body: String,
    /// Article the row points at, if any.
    pub link: Option<String>,
}

/// A help article as shown in the article view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticlePage {
    pub resource: ResourceId,
    pub title: String,
    pub article: Article,
    pub lines: Vec<String>,
    pub links: Vec<String>,
}

impl ArticlePage {
    fn new(resource: ResourceId, title: String, article: Article) -> Self {
        let lines = helps::to_plain_text(&article.content)
            .lines()
            .map(str::to_string)
            .collect();
        let links = helps::links(&article.content);
        Self {
            resource,
            title,
            article,
            lines,
            links,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArticleView {
    pub page: ArticlePage,
    pub selected_link: Option<usize>,
    history: Vec<ArticlePage>,
}

impl ArticleView {
    fn new(page: ArticlePage) -> Self {
        let selected_link = (!page.links.is_empty()).then_some(0);
        Self {
            page,
            selected_link,
            history: Vec::new(),
        }
    }

    fn push(&mut self, page: ArticlePage) {
        let previous = std::mem::replace(&mut self.page, page);
        self.history.push(previous);
        self.selected_link = (!self.page.links.is_empty()).then_some(0);
    }

    /// Go back one page; false when there is nothing to go back to.
    fn pop(&mut self) -> bool {
        match self.history.pop() {
            Some(page) => {
                self.page = page;
                self.selected_link = (!self.page.links.is_empty()).then_some(0);
                true
            }
            None => false,
        }
    }

    pub fn depth(&self) -> usize {
        self.history.len()
    }

    pub fn next_link(&mut self) {
        self.selected_link = step(self.selected_link, self.page.links.len(), true);
    }

    pub fn previous_link(&mut self) {
        self.selected_link = step(self.selected_link, self.page.links.len(), false);
    }
}

pub struct App {
    config: Config,
    store: ResourceStore,
    translation: usize,
    pub books: Vec<BookFile>,
    pub book_list_state: ListState,
    current_book: Option<usize>,
    pub book: Option<Book>,
    pub book_error: Option<String>,
    chapter_index: usize,
    notes: Vec<TranslationNote>,
    word_links: Vec<WordLink>,
    questions: Vec<TranslationQuestion>,
    pub tab: Tab,
    pub help_state: ListState,
    pub verse_filter: Option<String>,
    pub focus: Focus,
    pub article: Option<ArticleView>,
    pub status: Option<String>,
}

impl App {
    pub fn new(config: Config, book: Option<&str>, chapter: Option<&str>) -> anyhow::Result<Self> {
        if config.translations.is_empty() {
            anyhow::bail!("No translations configured");
        }

        let store = ResourceStore::new(&config.data_dir);
        let mut app = Self {
            config,
            store,
            translation: 0,
            books: Vec::new(),
            book_list_state: ListState::default(),
            current_book: None,
            book: None,
            book_error: None,
            chapter_index: 0,
            notes: Vec::new(),
            word_links: Vec::new(),
            questions: Vec::new(),
            tab: Tab::Notes,
            help_state: ListState::default(),
            verse_filter: None,
            focus: Focus::Helps,
            article: None,
            status: None,
        };

        app.load_books();
        let wanted = book.unwrap_or(DEFAULT_BOOK);
        let index = app
            .books
            .iter()
            .position(|b| book_matches(b, wanted))
            .or((!app.books.is_empty()).then_some(0));
        if let Some(index) = index {
            app.open_book_at(index, Some(chapter.unwrap_or(DEFAULT_CHAPTER)));
        }
        Ok(app)
    }

    pub fn translation(&self) -> &TranslationConfig {
        &self.config.translations[self.translation]
    }

    fn translation_id(&self) -> ResourceId {
        let translation = self.translation();
        ResourceId::new(&translation.owner, &translation.repo)
    }

    fn help_id(&self, tab: Tab) -> ResourceId {
        let helps = &self.config.helps;
        let resource = match tab {
            Tab::Notes => &helps.notes,
            Tab::Words => &helps.word_links,
            Tab::Questions => &helps.questions,
        };
        ResourceId::new(&resource.owner, &resource.repo)
    }

    fn load_books(&mut self) {
        let id = self.translation_id();
        self.books = match self.store.list_books(&id) {
            Ok(books) => books,
            Err(e) => {
                log::warn!("No books for {id}: {e}");
                self.status = Some(format!("{}: {e} (run `sync` first)", self.translation().name));
                Vec::new()
            }
        };
        self.current_book = None;
        self.book_list_state
            .select((!self.books.is_empty()).then_some(0));
    }

    /// Open the book at `index` in the book list, at `chapter` when it exists.
    pub fn open_book_at(&mut self, index: usize, chapter: Option<&str>) {
        let Some(file) = self.books.get(index).cloned() else {
            return;
        };
        self.current_book = Some(index);
        self.book_list_state.select(Some(index));
        self.article = None;
        self.verse_filter = None;

        match self.store.load_book(&self.translation_id(), file.relative_path()) {
            Ok(book) => {
                self.chapter_index = chapter
                    .and_then(|c| book.chapter_index(c))
                    .unwrap_or(0);
                self.book = Some(book);
                self.book_error = None;
            }
            Err(e) => {
                log::warn!("Could not decode {}: {e}", file.relative_path());
                self.book = None;
                self.chapter_index = 0;
                self.book_error = Some(format!("Could not read {}: {e}", file.display_name()));
            }
        }

        self.load_tables(file.book_id());
        self.reset_help_selection();
    }

    fn load_tables(&mut self, book_id: &str) {
        self.notes = self
            .load_table(Tab::Notes, |store, id| store.translation_notes(id, book_id));
        self.word_links = self
            .load_table(Tab::Words, |store, id| store.word_links(id, book_id));
        self.questions = self.load_table(Tab::Questions, |store, id| {
            store.translation_questions(id, book_id)
        });
    }

    fn load_table<T>(
        &mut self,
        tab: Tab,
        read: impl FnOnce(&ResourceStore, &ResourceId) -> Result<Vec<T>, ResourceError>,
    ) -> Vec<T> {
        let id = self.help_id(tab);
        match read(&self.store, &id) {
            Ok(rows) => rows,
            Err(e) => {
                log::warn!("Could not load {id}: {e}");
                self.status = Some(format!("{}: {e}", tab.title()));
                Vec::new()
            }
        }
    }

    pub fn current_book_file(&self) -> Option<&BookFile> {
        self.current_book.and_then(|i| self.books.get(i))
    }

    pub fn current_chapter(&self) -> Option<&Chapter> {
        self.book.as_ref()?.chapters.get(self.chapter_index)
    }

    /// Verses of the current chapter that pass the verse filter.
    pub fn visible_verses(&self) -> Vec<&Verse> {
        let Some(chapter) = self.current_chapter() else {
            return Vec::new();
        };
        chapter
            .verses
            .iter()
            .filter(|v| self.verse_filter.as_ref().is_none_or(|f| *f == v.verse))
            .collect()
    }

    pub fn next_book(&mut self) {
        let i = step(self.book_list_state.selected(), self.books.len(), true);
        self.book_list_state.select(i);
    }

    pub fn previous_book(&mut self) {
        let i = step(self.book_list_state.selected(), self.books.len(), false);
        self.book_list_state.select(i);
    }

    pub fn open_selected_book(&mut self) {
        if let Some(index) = self.book_list_state.selected() {
            self.open_book_at(index, None);
        }
    }

    pub fn next_chapter(&mut self) {
        let count = self.book.as_ref().map_or(0, |b| b.chapters.len());
        if self.chapter_index + 1 < count {
            self.set_chapter_index(self.chapter_index + 1);
        }
    }

    pub fn previous_chapter(&mut self) {
        if self.chapter_index > 0 {
            self.set_chapter_index(self.chapter_index - 1);
        }
    }

    fn set_chapter_index(&mut self, index: usize) {
        self.chapter_index = index;
        self.verse_filter = None;
        self.reset_help_selection();
    }

    /// Step the verse filter forward: all verses, then each verse in turn.
    pub fn next_verse_filter(&mut self) {
        self.step_verse_filter(true);
    }

    pub fn previous_verse_filter(&mut self) {
        self.step_verse_filter(false);
    }

    pub fn clear_verse_filter(&mut self) {
        self.verse_filter = None;
        self.reset_help_selection();
    }

    fn step_verse_filter(&mut self, forward: bool) {
        let numbers: Vec<String> = self
            .current_chapter()
            .map(|c| c.verses.iter().map(|v| v.verse.clone()).collect())
            .unwrap_or_default();
        if numbers.is_empty() {
            return;
        }

        let position = self
            .verse_filter
            .as_ref()
            .and_then(|f| numbers.iter().position(|n| n == f));
        self.verse_filter = match (position, forward) {
            (None, true) => numbers.first().cloned(),
            (None, false) => numbers.last().cloned(),
            (Some(i), true) => numbers.get(i + 1).cloned(),
            (Some(0), false) => None,
            (Some(i), false) => numbers.get(i - 1).cloned(),
        };
        self.reset_help_selection();
    }

    /// Switch to the next translation, staying on the same book and chapter.
    pub fn toggle_translation(&mut self) {
        let chapter = self.current_chapter().map(|c| c.chapter.clone());
        let current = self.current_book_file().cloned();

        self.translation = (self.translation + 1) % self.config.translations.len();
        self.status = None;
        self.load_books();

        let Some(current) = current else {
            self.book = None;
            return;
        };
        let same_path = current.in_directory(&self.translation().books_dir);
        let index = self
            .books
            .iter()
            .position(|b| *b == same_path)
            .or_else(|| self.books.iter().position(|b| b.book_id() == current.book_id()));
        match index {
            Some(index) => self.open_book_at(index, chapter.as_deref()),
            None => {
                self.book = None;
                self.book_error = Some(format!(
                    "{} has no {}",
                    self.translation().name,
                    current.display_name()
                ));
            }
        }
    }

    pub fn next_tab(&mut self) {
        self.tab = self.tab.next();
        self.reset_help_selection();
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Books => Focus::Helps,
            Focus::Helps => Focus::Books,
        };
    }

    /// Rows of `rows` in the current chapter and verse filter.
    fn chapter_rows<'a, A: Annotation>(&self, rows: &'a [A]) -> Vec<&'a A> {
        let Some(chapter) = self.current_chapter() else {
            return Vec::new();
        };
        match &self.verse_filter {
            Some(verse) => annotations::in_verse(rows, &chapter.chapter, verse),
            None => annotations::in_chapter(rows, &chapter.chapter),
        }
    }

    pub fn help_items(&self) -> Vec<HelpItem> {
        let chapter = self.current_chapter();
        match self.tab {
            Tab::Notes => self
                .chapter_rows(&self.notes)
                .into_iter()
                .map(|note| HelpItem {
                    reference: reference(note),
                    phrase: reconstruct_in_chapter(note, chapter),
                    body: helps::to_plain_text(&note.note),
                    link: non_empty(&note.support_reference),
                })
                .collect(),
            Tab::Words => self
                .chapter_rows(&self.word_links)
                .into_iter()
                .map(|link| HelpItem {
                    reference: reference(link),
                    phrase: reconstruct_in_chapter(link, chapter),
                    body: link.tw_link.clone(),
                    link: non_empty(&link.tw_link),
                })
                .collect(),
            Tab::Questions => self
                .chapter_rows(&self.questions)
                .into_iter()
                .map(|question| HelpItem {
                    reference: reference(question),
                    phrase: reconstruct_in_chapter(question, chapter),
                    body: format!("{}\n{}", question.question, question.response),
                    link: None,
                })
                .collect(),
        }
    }

    pub fn next_help(&mut self) {
        let i = step(self.help_state.selected(), self.help_items().len(), true);
        self.help_state.select(i);
    }

    pub fn previous_help(&mut self) {
        let i = step(self.help_state.selected(), self.help_items().len(), false);
        self.help_state.select(i);
    }

    fn reset_help_selection(&mut self) {
        let has_items = !self.help_items().is_empty();
        self.help_state.select(has_items.then_some(0));
    }

    /// Underline and highlight flags for each word of `verse`.
    pub fn verse_marks(&self, verse: &Verse) -> Vec<WordMarks> {
        let selected = self.help_state.selected();
        match self.tab {
            Tab::Notes => marks_for(verse, &self.chapter_rows(&self.notes), selected),
            Tab::Words => marks_for(verse, &self.chapter_rows(&self.word_links), selected),
            Tab::Questions => marks_for(verse, &self.chapter_rows(&self.questions), selected),
        }
    }

    /// Open the article behind the selected help row.
    pub fn open_selected_help(&mut self) {
        let Some(item) = self
            .help_state
            .selected()
            .and_then(|i| self.help_items().into_iter().nth(i))
        else {
            return;
        };
        let Some(link) = item.link else {
            self.status = Some(format!("{} has no article", item.reference));
            return;
        };
        match self.resolve_page(&link, None) {
            Ok(page) => self.article = Some(ArticleView::new(page)),
            Err(e) => self.status = Some(format!("Could not open {link}: {e}")),
        }
    }

    /// Follow the selected link of the open article.
    pub fn follow_selected_link(&mut self) {
        let Some(view) = &self.article else {
            return;
        };
        let Some(href) = view.selected_link.and_then(|i| view.page.links.get(i)).cloned() else {
            return;
        };

        if let Some((chapter, verse)) = links::scripture_link(&href) {
            self.go_to_verse(&chapter, &verse);
            return;
        }

        match self.resolve_page(&href, Some(&view.page)) {
            Ok(page) => {
                if let Some(view) = &mut self.article {
                    view.push(page);
                }
            }
            Err(e) => self.status = Some(format!("Could not open {href}: {e}")),
        }
    }

    /// Back to the previous article, closing the view at the first one.
    pub fn article_back(&mut self) {
        if let Some(view) = &mut self.article
            && !view.pop()
        {
            self.article = None;
        }
    }

    pub fn go_to_verse(&mut self, chapter: &str, verse: &str) {
        let Some(index) = self.book.as_ref().and_then(|b| b.chapter_index(chapter)) else {
            self.status = Some(format!("Chapter {chapter} not found"));
            return;
        };
        self.article = None;
        self.set_chapter_index(index);
        if self
            .current_chapter()
            .is_some_and(|c| c.verse(verse).is_some())
        {
            self.verse_filter = Some(verse.to_string());
            self.reset_help_selection();
        }
    }

    fn resolve_page(&self, href: &str, current: Option<&ArticlePage>) -> Result<ArticlePage, ResourceError> {
        let helps = &self.config.helps;
        if href.starts_with("rc://") {
            if href.contains("/ta/man/") {
                let id = ResourceId::new(&helps.academy.owner, &helps.academy.repo);
                let article = self.store.academy_article(&id, href)?;
                let title = self.store.academy_title(&id, &article.path);
                return Ok(ArticlePage::new(id, title, article));
            }
            if href.contains("/dict/") {
                let id = ResourceId::new(&helps.words.owner, &helps.words.repo);
                let article = self.store.translation_word(&id, href)?;
                let title = heading(&article);
                return Ok(ArticlePage::new(id, title, article));
            }
            return Err(ResourceError::InvalidLink(href.to_string()));
        }

        let current = current.ok_or_else(|| ResourceError::InvalidLink(href.to_string()))?;
        let path = links::resolve_article_link(&current.article.path, href)
            .ok_or_else(|| ResourceError::InvalidLink(href.to_string()))?;
        let article = self.store.help_article(&current.resource, &path)?;
        let title = if current.resource.repo == helps.academy.repo {
            self.store.academy_title(&current.resource, &article.path)
        } else {
            heading(&article)
        };
        Ok(ArticlePage::new(current.resource.clone(), title, article))
    }
}

fn marks_for<A: Annotation>(verse: &Verse, rows: &[&A], selected: Option<usize>) -> Vec<WordMarks> {
    let selected = selected.and_then(|i| rows.get(i));
    mark_words(verse, rows, selected)
}

fn reference<A: Annotation>(row: &A) -> String {
    format!("{}:{}", row.chapter(), row.verse())
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// First line of the article with heading markers removed.
fn heading(article: &Article) -> String {
    article
        .content
        .lines()
        .map(|line| line.trim_start_matches('#').trim())
        .find(|line| !line.is_empty())
        .unwrap_or(article.path.as_str())
        .to_string()
}

/// `wanted` names a book by file stem (`43-JHN`), code (`JHN`) or display name.
fn book_matches(book: &BookFile, wanted: &str) -> bool {
    let stem = book.file_name().strip_suffix(".usfm").unwrap_or(book.file_name());
    stem.eq_ignore_ascii_case(wanted)
        || book.book_id().eq_ignore_ascii_case(wanted)
        || book.display_name().eq_ignore_ascii_case(wanted)
}

/// Move a list selection by one, wrapping at either end.
fn step(selected: Option<usize>, len: usize, forward: bool) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match (selected, forward) {
        (Some(i), true) => (i + 1) % len,
        (Some(0), false) => len - 1,
        (Some(i), false) => i - 1,
        (None, _) => 0,
    })
}
