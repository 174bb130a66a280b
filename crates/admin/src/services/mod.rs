//! Business logic services for admin.
//!
//! # Services
//!
//! - `paginator` - Cursor-based product list pagination
//! - `variant_update` - Validated price/inventory/metafield update of one variant
//! - `sync` - Debounced search and edit-form state driving the other two
//! - `dashboard` - Store-wide product statistics
//! - `webhooks` - Product-deletion webhook payloads, signatures and logs

pub mod dashboard;
pub mod paginator;
pub mod sync;
pub mod variant_update;
pub mod webhooks;

pub use dashboard::{DashboardStats, load_stats};
pub use paginator::{
    DEFAULT_PAGE_SIZE, ListError, ListRequest, PageAction, PageRequest, PaginatorState,
    ProductPaginator,
};
pub use sync::{DEFAULT_DEBOUNCE, Debouncer, EditForm, SearchState, SyncController, SyncError, Ticket};
pub use variant_update::{MetafieldEdits, UpdateError, UpdateRequest, UpdateStep, VariantUpdater};
pub use webhooks::{WebhookError, WebhookLog};
