mod pool_type;
mod style;

pub use pool_type::PoolType;
pub use style::{STYLES, Stroke, Style};
