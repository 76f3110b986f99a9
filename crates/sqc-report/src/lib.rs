pub mod summary;

pub use summary::{
    DictionaryEntry, StudySummary, build_study_summary, comment_frequencies,
    missing_dictionary_variables,
};
