pub mod competition;
pub mod ownership;
pub mod practice;
pub mod record;

pub use competition::NewCompetition;
pub use ownership::Ownership;
pub use practice::NewPractice;
pub use record::NewRecord;
