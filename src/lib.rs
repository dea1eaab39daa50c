//! Minimalist single-threaded chess engine: a side-relative 10x12 mailbox
//! board, a piece-square-table evaluation maintained incrementally, and an
//! iterative-deepening zero-window search speaking UCI on stdin/stdout.
//!
//! The interesting entry points are [`chess::position::Position`] for the
//! rules, [`search::Searcher`] for the brain and [`engine::Engine`] for the
//! wire protocol around both.

#![warn(missing_docs, variant_size_differences)]
// Rustc lints.
#![warn(
    absolute_paths_not_starting_with_crate,
    keyword_idents,
    macro_use_extern_crate,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_import_braces,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]
// Rustdoc lints.
#![warn(
    rustdoc::missing_crate_level_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::invalid_codeblock_attributes,
    rustdoc::invalid_html_tags,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::bare_urls
)]
// Clippy lints.
#![warn(
    clippy::correctness,
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::pedantic
)]

pub mod chess;
pub mod engine;
pub mod evaluation;
pub mod search;

shadow_rs::shadow!(build);

/// Full version of the engine reported in the `uci` handshake, including the
/// commit it was built from when available.
#[must_use]
pub fn engine_version() -> String {
    if build::SHORT_COMMIT.is_empty() {
        build::PKG_VERSION.to_string()
    } else {
        format!("{} ({})", build::PKG_VERSION, build::SHORT_COMMIT)
    }
}
