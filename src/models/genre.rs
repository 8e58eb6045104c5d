use std::collections::BTreeMap;

use super::GenreId;

/// Genre code to display name mapping
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenreTable {
    names: BTreeMap<GenreId, String>,
}

const TMDB_GENRES: &[(GenreId, &str)] = &[
    (28, "Action"),
    (12, "Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (14, "Fantasy"),
    (36, "History"),
    (27, "Horror"),
    (10402, "Music"),
    (9648, "Mystery"),
    (10749, "Romance"),
    (878, "Science Fiction"),
    (10770, "TV Movie"),
    (53, "Thriller"),
    (10752, "War"),
    (37, "Western"),
];

impl GenreTable {
    pub fn new(entries: impl IntoIterator<Item = (GenreId, String)>) -> Self {
        Self {
            names: entries.into_iter().collect(),
        }
    }

    /// The TMDB movie genre list
    pub fn tmdb() -> Self {
        Self::new(
            TMDB_GENRES
                .iter()
                .map(|(id, name)| (*id, (*name).to_string())),
        )
    }

    pub fn name(&self, id: GenreId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Display name, or "Unknown" for codes missing from the table
    pub fn display_name(&self, id: GenreId) -> &str {
        self.name(id).unwrap_or("Unknown")
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
