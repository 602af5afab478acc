//! Remote design catalog: API client and client-side browsing

pub mod browse;
pub mod client;

pub use browse::{categories, paginate, total_pages, DesignFilter, LIBRARY_PAGE_SIZE};
pub use client::{
    find_design, load_designs, BatchResponse, CatalogApi, DesignSummary, HttpCatalog, ListQuery,
    ListResponse, MAX_BATCH,
};
