pub mod analysis;
pub mod analysis_fetch;
pub mod bucket;
pub mod feed;
pub mod normalize;
pub mod prepare;
