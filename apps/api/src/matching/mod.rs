//! Matching engine: reference corpus, similarity search, occupation inference,
//! skill extraction and the résumé analyzer that ties them together.

pub mod analyzer;
pub mod candidates;
pub mod corpus;
pub mod handlers;
pub mod models;
pub mod occupation;
pub mod profile;
pub mod similarity;
pub mod skills;

#[cfg(test)]
pub mod test_support;
