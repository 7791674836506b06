//! Domain models for feature-atlas.
//!
//! # Core Concepts
//!
//! ## Feature model
//!
//! - [`FeatureNode`]: A named, possibly nested unit of functionality, identified by its
//!   lexical path qualifier (LPQ) and traced to source [`Location`]s.
//! - [`Location`]: A file a feature touches, with the [`Block`]s of lines it owns there.
//! - [`TanglingLink`]: An undirected coupling between two features whose code interleaves.
//! - [`FeatureDocument`]: The raw `{features, tanglingLinks}` document a host sends.
//!
//! ## Feature history
//!
//! - [`FeatureSnapshot`]: Feature × commit incidences, replaced wholesale on every fetch.
//! - [`DeletedFeatureRecord`]: Features that no longer exist, with their last commit.
//!
//! ## Views
//!
//! - [`ChartView`]: Which projection is active.
//! - [`GraphMode`]: Force-directed or circular tangling layout.

mod feature;
mod history;
mod view;

pub use feature::*;
pub use history::*;
pub use view::*;
