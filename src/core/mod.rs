pub mod corpus;
pub mod entities;
