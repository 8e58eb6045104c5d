use std::collections::HashSet;

use super::MovieId;

/// Entry of the curated list used during the baseline phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineMovie {
    pub id: MovieId,
    pub title: String,
}

impl BaselineMovie {
    pub fn new(id: MovieId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

/// Fixed list of well-known movies compared before personalized
/// recommendations take over. Ids are unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineList {
    movies: Vec<BaselineMovie>,
}

const CURATED: &[(MovieId, &str)] = &[
    (238, "The Godfather"),
    (155, "The Dark Knight"),
    (120, "The Lord of the Rings: The Fellowship of the Ring"),
    (121, "The Lord of the Rings: The Two Towers"),
    (122, "The Lord of the Rings: The Return of the King"),
    (27205, "Inception"),
    (157336, "Interstellar"),
    (98, "Gladiator"),
    (37165, "The Departed"),
    (244786, "Whiplash"),
    (1124, "The Prestige"),
    (68718, "Django Unchained"),
    (438631, "Dune: Part Two"),
    (10681, "WALL·E"),
    (77, "Memento"),
    (299536, "Avengers: Infinity War"),
    (324857, "Spider-Man: Into the Spider-Verse"),
    (569094, "Spider-Man: Across the Spider-Verse"),
    (16869, "Inglourious Basterds"),
    (49026, "The Dark Knight Rises"),
    (354912, "Coco"),
    (299534, "Avengers: Endgame"),
    (475557, "Joker"),
    (641, "Requiem for a Dream"),
    (10193, "Toy Story 3"),
    (301528, "Toy Story 4"),
    (38, "Eternal Sunshine of the Spotless Mind"),
    (14160, "Up"),
    (872585, "Oppenheimer"),
    (107, "Snatch"),
    (530915, "1917"),
    (106646, "The Wolf of Wall Street"),
    (556574, "Hamilton"),
    (490132, "Green Book"),
    (272, "Batman Begins"),
    (11324, "Shutter Island"),
    (601434, "The Father"),
    (7491, "There Will Be Blood"),
    (361743, "Top Gun: Maverick"),
    (359724, "Ford v Ferrari"),
    (6977, "No Country for Old Men"),
    (453, "A Beautiful Mind"),
    (24, "Kill Bill: Vol. 1"),
    (146233, "Prisoners"),
    (12, "Finding Nemo"),
    (508439, "Klaus"),
    (752, "V for Vendetta"),
    (150540, "Inside Out"),
    (359940, "Three Billboards Outside Ebbing, Missouri"),
    (640, "Catch Me If You Can"),
    (59440, "Warrior"),
    (12444, "Harry Potter and the Deathly Hallows: Part 2"),
    (2649, "Gran Torino"),
    (70, "Million Dollar Baby"),
    (76341, "Mad Max: Fury Road"),
    (634649, "Spider-Man: No Way Home"),
    (76203, "12 Years a Slave"),
    (120467, "The Grand Budapest Hotel"),
    (324786, "Hacksaw Ridge"),
    (210577, "Gone Girl"),
    (2062, "Ratatouille"),
    (585, "Monsters, Inc."),
    (10191, "How to Train Your Dragon"),
    (263115, "Logan"),
    (227306, "Spotlight"),
    (22, "Pirates of the Caribbean: The Curse of the Black Pearl"),
    (264644, "Room"),
    (4800, "Hotel Rwanda"),
    (80, "Before Sunset"),
    (9806, "The Incredibles"),
    (28178, "Hachi: A Dog's Tale"),
    (96721, "Rush"),
    (5915, "Into the Wild"),
    (50014, "The Help"),
    (9522, "Wedding Crashers"),
    (289, "Casablanca"),
    (872, "Singin' in the Rain"),
    (496243, "Parasite"),
    (637, "Life Is Beautiful"),
    (603, "The Matrix"),
    (550, "Fight Club"),
    (769, "Goodfellas"),
    (680, "Pulp Fiction"),
    (278, "The Shawshank Redemption"),
    (13, "Forrest Gump"),
    (857, "Saving Private Ryan"),
    (597, "Titanic"),
    (497, "The Green Mile"),
    (14, "American Beauty"),
    (745, "The Sixth Sense"),
    (807, "L.A. Confidential"),
    (4995, "Boogie Nights"),
    (627, "Trainspotting"),
    (629, "The Usual Suspects"),
    (500, "Reservoir Dogs"),
    (621, "Heat"),
    (197, "Braveheart"),
    (105, "Back to the Future"),
    (78, "Blade Runner"),
    (679, "Aliens"),
    (562, "Die Hard"),
];

impl BaselineList {
    /// Builds a list, keeping the first occurrence of each id
    pub fn new(movies: impl IntoIterator<Item = BaselineMovie>) -> Self {
        let mut seen = HashSet::new();
        let movies = movies
            .into_iter()
            .filter(|movie| seen.insert(movie.id))
            .collect();
        Self { movies }
    }

    /// The curated list of popular, well-regarded films
    pub fn curated() -> Self {
        Self::new(
            CURATED
                .iter()
                .map(|(id, title)| BaselineMovie::new(*id, *title)),
        )
    }

    pub fn movies(&self) -> &[BaselineMovie] {
        &self.movies
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.movies.iter().any(|movie| movie.id == id)
    }
}
