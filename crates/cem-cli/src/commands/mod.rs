pub mod costs;
pub mod expand;
pub mod sweep;
pub mod util;
pub mod validate;
