//! Parent- and survivor-selection strategies operating over anything implementing [`Candidate`].

mod candidate;
mod elite;
mod roulette;
mod select;
mod tournament;
mod truncation;

pub use candidate::Candidate;
pub use elite::EliteSelector;
pub use roulette::RouletteSelector;
pub use select::Select;
pub use tournament::TournamentSelector;
pub use truncation::TruncationSelector;
