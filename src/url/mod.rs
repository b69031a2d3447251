//! URL handling module for Dex-Harvest
//!
//! Every catalog link is canonicalized before it enters the work set, so two
//! spellings of the same page never produce two records.

mod canonical;

pub use canonical::{canonicalize_url, is_tracking_param};
