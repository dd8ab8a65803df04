//! Integration Tests Module
//!
//! End-to-end tests for the AspirePath client: analysis retrieval, review
//! retrieval and the contact/knowledge-base services.

// Scripted transport and fixtures
mod support;

// Analysis flow: retries, de-duplication, cancellation
mod analysis_flow_test;


// Contact and knowledge base over real HTTP
mod contact_test;
