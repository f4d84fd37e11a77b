//! Address & Contact Resolution Library
//!
//! This library provides the core of the booking service's address and
//! contact resolution: geocoding with an offline fallback, and client
//! deduplication over historical service orders.
//!
//! # Modules
//!
//! - `address`: Address normalization (comparison and provider forms).
//! - `aggregation`: Folding transaction records into client profiles.
//! - `auth`: Staff access control for client search.
//! - `config`: Configuration management.
//! - `contact`: Phone normalization.
//! - `db`: Database connection and pool management.
//! - `errors`: Error handling types.
//! - `gazetteer`: Offline locality table.
//! - `geocoding`: Geocoding resolver with confidence scoring.
//! - `geocoding_client`: Geocoding provider client.
//! - `handlers`: HTTP request handlers.
//! - `matching`: Ranking client profiles against a query.
//! - `models`: Core data models.
//! - `similarity`: Word-overlap string similarity.
//! - `store`: Read-only transaction store access.

pub mod address;
pub mod aggregation;
pub mod auth;
pub mod config;
pub mod contact;
pub mod db;
pub mod errors;
pub mod gazetteer;
pub mod geocoding;
pub mod geocoding_client;
pub mod handlers;
pub mod matching;
pub mod models;
pub mod similarity;
pub mod store;
