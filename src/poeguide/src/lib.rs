//! Data toolchain for a Korean Path of Exile leveling guide site.
//!
//! The site is driven by hand-maintained JS data files; this crate
//! keeps the generated parts of those files in sync with the poedb
//! wiki. The pipelines are:
//!
//! - scrape the Quest page and regenerate the managed sections of
//!   `js/gems.js` ([`page`], [`reconcile`], [`sections`]),
//! - ingest the campaign-guide spreadsheet export into `js/guide.js`
//!   ([`guide`]),
//! - scrape per-gem tooltip details into `js/gem_details.js`
//!   ([`details`]),
//! - download and normalize gem icon assets ([`icons`]),
//! - diff `js/gems.js` against a scraped snapshot ([`validate`]).
//!
//! Everything is synchronous and sequential; the fetcher sleeps a fixed
//! delay between requests.

pub mod details;
pub mod error;
pub mod fetch;
pub mod guide;
pub mod icons;
pub mod model;
pub mod page;
pub mod reconcile;
pub mod sections;
pub mod tables;
pub mod validate;

pub use error::{Error, Result};
pub use fetch::Fetcher;
pub use model::{Gem, GemColor, GemDetail, GemKind, GuideEntry, ItemOnlyRow, RewardRow, Snapshot};
pub use reconcile::{eng_to_gemid, gemid_to_eng, GemRegistry};
