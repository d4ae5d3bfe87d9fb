pub mod book_file;
pub mod scripture;

pub use book_file::BookFile;
pub use scripture::{AlignmentInfo, Book, Chapter, Verse, Word};
