//! Regional news quiz.
//!
//! Pulls a set of RSS/Atom feeds, keeps the London and South-East stories on
//! a chosen topic and turns them into a short multiple-choice quiz.
//!
//! Data flows strictly forward: [`feed`] fetches, merges and caches items,
//! [`relevance`] filters them, [`quiz`] builds and scores questions and
//! [`ui`] presents them. [`pipeline`] wires the first three together.

pub mod config;
pub mod feed;
pub mod pipeline;
pub mod quiz;
pub mod relevance;
pub mod storage;
pub mod ui;
pub mod util;
