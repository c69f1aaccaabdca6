//! Error types for the poeguide library.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A required anchor element was absent from the wiki page. The page
    /// layout is assumed stable, so this aborts the whole run.
    #[error("anchor #{0} not found on page")]
    AnchorMissing(String),

    #[error("no table found under #{0}")]
    TableMissing(String),

    #[error("section `{0}` not found in gems.js")]
    SectionMissing(String),

    #[error("section `{0}` has unbalanced brackets")]
    SectionUnbalanced(String),

    #[error("gems.js sections appear out of order (expected gems, questRewards, vendorRewards)")]
    SectionOrder,

    #[error("gem_details.js is not in the expected `const GEM_DETAILS = {{...}};` form")]
    DetailStoreShape,

    #[error("no tooltip content on gem page")]
    DetailEmpty,

    #[error("no gem icon found on page")]
    IconMissing,

    #[error("http request failed: {0}")]
    Http(Box<ureq::Error>),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        // ureq::Error is large; keep the enum small.
        Error::Http(Box::new(err))
    }
}
