mod levels;

pub use levels::{LodInfo, LodTable};
