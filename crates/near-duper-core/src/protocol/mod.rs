pub mod batch;
pub mod scanner;
