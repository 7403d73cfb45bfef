pub mod sanitizer;
pub mod sentence;
