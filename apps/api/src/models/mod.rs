pub mod draft;
pub mod idea;
pub mod prompt;
pub mod topic;
pub mod user;
