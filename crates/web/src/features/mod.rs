pub mod imports;
pub mod templates;
