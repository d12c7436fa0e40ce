pub mod annotate;
pub mod info;
pub mod library;
pub mod merge;
pub mod resolve;
pub mod split;
