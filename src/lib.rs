//! taskdeck - command-line client for a hosted to-do service
//!
//! Users sign up, confirm and sign in against a hosted identity provider,
//! then manage personal tasks through an authenticated REST API. The crate
//! splits into the identity client ([`auth`]), the observable session state
//! ([`session`]), the task API client ([`tasks`]), the navigation guard
//! ([`guard`]) and the form controllers ([`controllers`]) the CLI drives.

pub mod auth;
pub mod config;
pub mod controllers;
pub mod guard;
pub mod models;
pub mod session;
pub mod tasks;
