//! Integration tests: full screening runs with in-memory collaborators.

mod mock_provider;
mod pipeline;
