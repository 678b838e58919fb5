pub mod annotate;
pub mod link;
pub mod search;
