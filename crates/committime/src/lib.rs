pub mod build;
pub mod cache;
pub mod cluster;
pub mod collector;
pub mod exposition;
pub mod git_binary;
pub mod metric;
pub mod nested;
pub mod provider;
pub mod readiness;
pub mod repo_url;
pub mod rest;
pub mod util;
