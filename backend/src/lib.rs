//! Résumé upload backend
//!
//! Receives a résumé over `POST /api/upload`, stores it in object storage and emails
//! a recruiter a link to it with the file attached.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

/// Transactional email delivery
pub mod mailer;

/// S3-compatible object storage
pub mod object_storage;

/// HTTP routes
pub mod routes;

/// HTTP server setup
pub mod server;

/// Configuration, errors and extractors
pub mod types;

/// Store-then-notify upload workflow
pub mod upload;
