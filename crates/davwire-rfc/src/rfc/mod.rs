pub mod dav;
pub mod range;
