//! Order data pipeline.
//!
//! Raw envelopes from an [`OrderSource`](crate::orders_api::OrderSource) are
//! normalized into strict records, filtered and paged for display, expanded
//! one row at a time with lazily fetched details, and exported as CSV.
//!
//! [`OrderBoard`] ties these together for one console session.

pub mod board;
pub mod details;
pub mod expansion;
pub mod export;
pub mod normalize;
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;

pub use board::{ExpansionView, OrderBoard, PageView};
pub use details::{DetailCache, DetailOutcome, DetailState};
pub use expansion::{ExpandTicket, ExpansionState, RowExpansion, Toggle};
pub use export::{
    CSV_EXTENSION, DOWNLOAD_EXTENSION, EXPORT_HEADERS, export_file_name, serialize_orders,
};
pub use view::{
    ADMIN_TABLE_PAGE_SIZE, ORDER_TABLE_PAGE_SIZE, OrderFilter, Pagination, filter_orders,
    filter_orders_in,
};
