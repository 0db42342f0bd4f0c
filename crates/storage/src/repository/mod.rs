pub mod competition;
pub mod practice;
pub mod record;

pub use competition::CompetitionRepository;
pub use practice::PracticeRepository;
pub use record::RecordRepository;
