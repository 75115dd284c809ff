pub mod migrate;
pub mod predicate;
pub mod serve;
pub mod token;
