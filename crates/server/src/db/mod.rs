pub mod games;
pub mod pool;

pub use games::PgGameStore;
