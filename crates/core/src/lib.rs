//! Core business logic for ContentForge.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `phone` - Kenyan MSISDN normalisation and validation
//! - `payments` - M-Pesa and Pesapal result classification, settlement planning
//! - `billing` - Plan catalogue, prices, and payment references
//! - `content` - Generation prompts, response parsing, transcript shaping
//! - `auth` - Password hashing and user roles

pub mod auth;
pub mod billing;
pub mod content;
pub mod payments;
pub mod phone;
