pub mod seaorm;

pub use seaorm::SeaOrmEntryRepository;
