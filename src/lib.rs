pub mod ast;
pub mod executor;
pub mod token;
pub mod value;
