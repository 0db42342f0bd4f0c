mod postgres;
mod postgrest;

pub use postgres::PostgresSink;
pub use postgrest::PostgrestSink;
