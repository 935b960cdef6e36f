pub mod diff;
pub mod guest;
