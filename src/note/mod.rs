//! Note segmentation: sections, paragraphs and rendering of clinical notes.

pub mod container;
pub mod error;
pub mod extractors;
pub mod factory;
pub mod format;
pub mod gap;
pub mod mask;
pub mod paragraph;
pub mod section;
pub mod span;

pub use container::{Note, DEFAULT_SECTION_NAME};
pub use error::NoteError;
pub use extractors::SectionExtractor;
pub use factory::NoteFactory;
pub use gap::fill_gaps;
pub use mask::MaskAnnotator;
pub use paragraph::{
    paragraph_factory, ChunkingParagraphFactory, Paragraph, ParagraphFactory, WhitespaceParagraphFactory,
};
pub use section::Section;
pub use span::LexicalSpan;
