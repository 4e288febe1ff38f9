//! The library code for `quillpress`, the content pipeline behind a personal
//! blog. It turns the post and page collections produced by an upstream
//! content compiler into everything the static site generator and feed
//! readers consume. The architecture is a one-way pipeline:
//!
//! 1. Loading and validating the collections ([`crate::repository`])
//! 2. Deriving views: tag/category/archive indices ([`crate::tag`],
//!    [`crate::filter`]) and the recent, updated and popular listings
//!    ([`crate::ranking`])
//! 3. Enumerating static routes ([`crate::route`])
//! 4. Serializing feeds and sitemaps ([`crate::feed`], [`crate::sitemap`])
//!
//! Steps 2 and 3 read from a single [`crate::context::BuildContext`] built
//! once per run; [`crate::build::build_site`] drives the whole thing.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod context;
pub mod feed;
pub mod filter;
pub mod popularity;
pub mod post;
pub mod ranking;
pub mod repository;
pub mod route;
pub mod sitemap;
pub mod tag;
pub mod url;
pub mod xml;
