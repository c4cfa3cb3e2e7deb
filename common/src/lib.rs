// Allow some clippy lints for legacy code - to be fixed gradually
#![allow(clippy::module_inception)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::upper_case_acronyms)]

pub mod api;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod network;
pub mod schema;
pub mod serializer;
pub mod tick;
pub mod time;
pub mod transaction;
