//! Client-side synchronisation between view state and the Admin API.
//!
//! Everything here runs on one task. [`SyncController`] owns the product list
//! view, the debounced search box, the sort selector and the variant edit
//! form, and turns changes to them into Admin API calls. At most one call is
//! outstanding at a time because every operation takes `&mut self`.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use shopdesk_core::{ProductGid, SortConfig};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{error, info, instrument};

use super::paginator::{PageRequest, ProductPaginator};
use super::variant_update::{UpdateError, UpdateRequest, VariantUpdater, fields};
use crate::shopify::{AdminClient, AdminShopifyError, ProductSnapshot, Variant};

/// Quiescence window for search input.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

// =============================================================================
// Debouncer
// =============================================================================

/// Handle for one scheduled debounce timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    deadline: Instant,
}

impl Ticket {
    #[must_use]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }
}

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    generation: u64,
    deadline: Instant,
}

/// Promotes a value to "committed" once it has been stable for a window.
///
/// Each input supersedes the previous one and restarts the window. A timer
/// for a superseded input is recognised by its [`Ticket`] and does nothing.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window: Duration,
    committed: T,
    pending: Option<Pending<T>>,
    generation: u64,
}

impl<T: Clone + PartialEq> Debouncer<T> {
    #[must_use]
    pub const fn new(initial: T, window: Duration) -> Self {
        Self {
            window,
            committed: initial,
            pending: None,
            generation: 0,
        }
    }

    /// Record new input at `now`.
    pub fn input(&mut self, value: T, now: Instant) -> Ticket {
        self.generation += 1;
        let deadline = now + self.window;
        self.pending = Some(Pending {
            value,
            generation: self.generation,
            deadline,
        });
        Ticket {
            generation: self.generation,
            deadline,
        }
    }

    /// Timer callback for `ticket`.
    ///
    /// Commits the pending value if `ticket` belongs to the latest input.
    /// Returns the newly committed value when it differs from the previous
    /// one.
    pub fn fire(&mut self, ticket: Ticket) -> Option<T> {
        match &self.pending {
            Some(pending) if pending.generation == ticket.generation => self.commit(),
            _ => None,
        }
    }

    /// Commit the pending value if its window has elapsed by `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some(pending) if pending.deadline <= now => self.commit(),
            _ => None,
        }
    }

    /// When the pending value will be committed.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    #[must_use]
    pub const fn committed(&self) -> &T {
        &self.committed
    }

    /// Most recent input, committed or not.
    #[must_use]
    pub fn latest(&self) -> &T {
        self.pending.as_ref().map_or(&self.committed, |p| &p.value)
    }

    fn commit(&mut self) -> Option<T> {
        let pending = self.pending.take()?;
        if pending.value == self.committed {
            return None;
        }
        self.committed = pending.value;
        Some(self.committed.clone())
    }
}

/// Search box state: what the user typed and what has been committed.
#[derive(Debug, Clone)]
pub struct SearchState {
    debouncer: Debouncer<String>,
}

impl SearchState {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(String::new(), window),
        }
    }

    /// Text currently in the search box.
    #[must_use]
    pub fn raw_term(&self) -> &str {
        self.debouncer.latest()
    }

    /// Term used for server requests.
    #[must_use]
    pub fn debounced_term(&self) -> &str {
        self.debouncer.committed()
    }

    pub fn input(&mut self, raw: &str, now: Instant) -> Ticket {
        self.debouncer.input(raw.to_string(), now)
    }

    pub fn fire(&mut self, ticket: Ticket) -> Option<String> {
        self.debouncer.fire(ticket)
    }

    pub fn poll(&mut self, now: Instant) -> Option<String> {
        self.debouncer.poll(now)
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }
}

// =============================================================================
// Edit form
// =============================================================================

/// In-progress edit of one variant at one location.
///
/// Values are kept as typed; they are validated only on submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditForm {
    pub variant_id: String,
    pub inventory_item_id: String,
    pub location_id: String,
    pub price: String,
    pub inventory: String,
    /// Quantity at the location when the form was opened.
    pub expected_quantity: String,
    pub metafields: BTreeMap<String, String>,
}

impl EditForm {
    /// Pre-fill from a variant and its inventory at `location_id`.
    ///
    /// Falls back to the variant's cached quantity when the location has no
    /// "available" level.
    #[must_use]
    pub fn from_variant(
        variant: &Variant,
        location_id: &str,
        metafields: &BTreeMap<String, String>,
    ) -> Self {
        let quantity = variant
            .available_at(location_id)
            .unwrap_or(variant.inventory_quantity);
        Self {
            variant_id: variant.id.clone(),
            inventory_item_id: variant.inventory_item.id.clone(),
            location_id: location_id.to_string(),
            price: variant.price.clone(),
            inventory: quantity.to_string(),
            expected_quantity: quantity.to_string(),
            metafields: metafields.clone(),
        }
    }

    /// The form as submitted field values.
    #[must_use]
    pub fn to_fields(&self) -> HashMap<String, String> {
        let mut form: HashMap<String, String> = [
            (fields::VARIANT_ID, &self.variant_id),
            (fields::INVENTORY_ITEM_ID, &self.inventory_item_id),
            (fields::PRICE, &self.price),
            (fields::INVENTORY, &self.inventory),
            (fields::EXPECTED_QUANTITY, &self.expected_quantity),
            (fields::LOCATION, &self.location_id),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect();

        for (key, value) in &self.metafields {
            form.insert(format!("{}{key}", fields::METAFIELD_PREFIX), value.clone());
        }
        form
    }
}

// =============================================================================
// Controller
// =============================================================================

/// Errors from controller actions.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("A request is already in progress")]
    Busy,

    #[error("No product is open")]
    NoProduct,

    #[error("Product not found: {0}")]
    ProductNotFound(ProductGid),

    #[error("Variant not found: {0}")]
    VariantNotFound(String),

    #[error("No edit in progress")]
    NoEdit,

    #[error(transparent)]
    Update(#[from] UpdateError),

    #[error(transparent)]
    Shopify(#[from] AdminShopifyError),
}

/// Drives the product list and the variant editor against the Admin API.
pub struct SyncController {
    client: AdminClient,
    updater: VariantUpdater,
    paginator: ProductPaginator,
    search: SearchState,
    sort: SortConfig,
    submitted: Option<(String, SortConfig)>,
    submitting: bool,
    product: Option<ProductSnapshot>,
    edit: Option<EditForm>,
    notice: Option<String>,
}

impl SyncController {
    #[must_use]
    pub fn new(client: AdminClient, page_size: i64, debounce: Duration) -> Self {
        Self {
            updater: VariantUpdater::new(client.clone()),
            client,
            paginator: ProductPaginator::new(page_size),
            search: SearchState::new(debounce),
            sort: SortConfig::default(),
            submitted: None,
            submitting: false,
            product: None,
            edit: None,
            notice: None,
        }
    }

    #[must_use]
    pub const fn paginator(&self) -> &ProductPaginator {
        &self.paginator
    }

    #[must_use]
    pub const fn search(&self) -> &SearchState {
        &self.search
    }

    /// Selected sort order (may not have been submitted yet).
    #[must_use]
    pub const fn sort(&self) -> SortConfig {
        self.sort
    }

    /// Busy indicator.
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// The open product, as last fetched.
    #[must_use]
    pub const fn product(&self) -> Option<&ProductSnapshot> {
        self.product.as_ref()
    }

    #[must_use]
    pub const fn edit(&self) -> Option<&EditForm> {
        self.edit.as_ref()
    }

    pub const fn edit_mut(&mut self) -> Option<&mut EditForm> {
        self.edit.as_mut()
    }

    /// Last edit failure, kept until the next submit.
    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    // -------------------------------------------------------------------------
    // List
    // -------------------------------------------------------------------------

    /// Load the first page with the current search term and sort order.
    pub async fn load_initial(&mut self) {
        let term = self.search.debounced_term().to_string();
        let request = self.paginator.search_and_sort(&term, self.sort);
        self.submitted = Some((term, self.sort));
        self.run(request).await;
    }

    /// Record a keystroke in the search box.
    pub fn type_search(&mut self, raw: &str, now: Instant) -> Ticket {
        self.search.input(raw, now)
    }

    /// Change the sort selection. Takes effect on the next [`Self::sync`].
    pub const fn select_sort(&mut self, sort: SortConfig) {
        self.sort = sort;
    }

    /// Commit a settled search term and submit any change in term or sort.
    ///
    /// Issues at most one request, carrying both the term and the sort. While
    /// search input is still settling nothing is sent; the sort goes out with
    /// the term. Returns whether a request was issued.
    pub async fn sync(&mut self, now: Instant) -> bool {
        self.search.poll(now);
        self.submit_if_changed().await
    }

    /// Timer callback for a search keystroke.
    ///
    /// A ticket superseded by later typing does nothing.
    pub async fn fire(&mut self, ticket: Ticket) -> bool {
        self.search.fire(ticket);
        self.submit_if_changed().await
    }

    /// Wait for the search box to settle, then [`Self::sync`].
    pub async fn settle(&mut self) -> bool {
        if let Some(deadline) = self.search.deadline() {
            tokio::time::sleep_until(deadline).await;
        }
        self.sync(Instant::now()).await
    }

    /// Fetch the next page. Returns `false` without a request when there is
    /// none.
    pub async fn load_more(&mut self) -> bool {
        match self.paginator.load_more() {
            Some(request) => {
                self.run(request).await;
                true
            }
            None => false,
        }
    }

    /// Fetch the previous page. Returns `false` without a request when there
    /// is none.
    pub async fn load_previous(&mut self) -> bool {
        match self.paginator.load_previous() {
            Some(request) => {
                self.run(request).await;
                true
            }
            None => false,
        }
    }

    async fn submit_if_changed(&mut self) -> bool {
        if self.search.deadline().is_some() {
            return false;
        }
        let term = self.search.debounced_term().to_string();
        let current = (term, self.sort);
        if self.submitted.as_ref() == Some(&current) {
            return false;
        }
        let request = self.paginator.search_and_sort(&current.0, current.1);
        self.submitted = Some(current);
        self.run(request).await;
        true
    }

    #[instrument(skip(self, request), fields(seq = request.seq, action = %request.request.action))]
    async fn run(&mut self, request: PageRequest) {
        self.submitting = true;
        let result = self.client.list_products(request.variables.clone()).await;
        self.submitting = false;

        match result {
            Ok(page) => {
                self.paginator.on_response(request.seq, page);
            }
            Err(e) => {
                error!(error = %e, "Failed to load products");
                self.paginator.on_failure(request.seq, e.to_string());
            }
        }
    }

    // -------------------------------------------------------------------------
    // Detail and edit
    // -------------------------------------------------------------------------

    /// Fetch a product and make it the open product.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::ProductNotFound` or the Admin API error.
    pub async fn open_product(&mut self, id: ProductGid) -> Result<&ProductSnapshot, SyncError> {
        self.submitting = true;
        let result = self.client.get_product(id).await;
        self.submitting = false;

        let snapshot = result?.ok_or(SyncError::ProductNotFound(id))?;
        Ok(self.product.insert(snapshot))
    }

    /// Start editing a variant of the open product at a location.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NoProduct` or `SyncError::VariantNotFound`.
    pub fn begin_edit(&mut self, variant_id: &str, location_id: &str) -> Result<&mut EditForm, SyncError> {
        let snapshot = self.product.as_ref().ok_or(SyncError::NoProduct)?;
        let variant = snapshot
            .product
            .variant(variant_id)
            .ok_or_else(|| SyncError::VariantNotFound(variant_id.to_string()))?;
        let form = EditForm::from_variant(variant, location_id, &snapshot.metafields);
        self.notice = None;
        Ok(self.edit.insert(form))
    }

    /// Discard the edit in progress.
    pub fn cancel_edit(&mut self) {
        self.edit = None;
        self.notice = None;
    }

    /// Submit the edit in progress as one update.
    ///
    /// On success the edit is cleared and the open product re-fetched. On
    /// failure the edit is kept for a retry and the message is stored as the
    /// notice. After a partial write the product is re-fetched too, and the
    /// edit's expected quantity moves to the live level so a resubmit
    /// compares against what the user now sees.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Update` for validation and write failures, or
    /// `SyncError::Shopify` if the re-fetch after a successful update fails.
    pub async fn submit_edit(&mut self) -> Result<(), SyncError> {
        if self.submitting {
            return Err(SyncError::Busy);
        }
        let product_id = self.open_product_id()?;
        let form = self.edit.as_ref().ok_or(SyncError::NoEdit)?;

        let request = match UpdateRequest::from_form(&form.to_fields()) {
            Ok(request) => request,
            Err(e) => {
                self.notice = Some(e.to_string());
                return Err(e.into());
            }
        };

        self.submitting = true;
        let result = self.updater.update(product_id, request).await;
        self.submitting = false;

        match result {
            Ok(()) => {
                info!(product_id = %product_id, "Edit submitted");
                self.edit = None;
                self.notice = None;
                self.revalidate().await
            }
            Err(e) => {
                self.notice = Some(e.to_string());
                // A partial write changed upstream state; show it.
                if e.is_partial() {
                    match self.revalidate().await {
                        Ok(()) => self.rebase_expected_quantity(),
                        Err(refetch) => {
                            error!(error = %refetch, "Re-fetch after partial update failed");
                        }
                    }
                }
                Err(e.into())
            }
        }
    }

    /// Point the edit's expected quantity at the open product's live level,
    /// keeping everything the user typed.
    fn rebase_expected_quantity(&mut self) {
        let (Some(edit), Some(snapshot)) = (self.edit.as_mut(), self.product.as_ref()) else {
            return;
        };
        if let Some(quantity) = snapshot
            .product
            .variant(&edit.variant_id)
            .and_then(|v| v.available_at(&edit.location_id))
        {
            edit.expected_quantity = quantity.to_string();
        }
    }

    /// Re-fetch the open product.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NoProduct` if nothing is open, or the fetch error.
    pub async fn revalidate(&mut self) -> Result<(), SyncError> {
        let id = self.open_product_id()?;
        self.open_product(id).await.map(|_| ())
    }

    fn open_product_id(&self) -> Result<ProductGid, SyncError> {
        let snapshot = self.product.as_ref().ok_or(SyncError::NoProduct)?;
        ProductGid::parse(&snapshot.product.id).map_err(|_| SyncError::NoProduct)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use shopdesk_core::{SortDirection, SortKey};

    use super::*;
    use crate::shopify::admin::gateway::testing::ScriptedGateway;

    const WINDOW: Duration = Duration::from_millis(500);

    fn empty_page() -> serde_json::Value {
        json!({"products": {
            "edges": [],
            "pageInfo": {"hasNextPage": false, "hasPreviousPage": false}
        }})
    }

    #[test]
    fn test_debouncer_commits_after_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(String::new(), WINDOW);
        debouncer.input("s".to_string(), start);

        assert_eq!(debouncer.poll(start + Duration::from_millis(499)), None);
        assert_eq!(
            debouncer.poll(start + WINDOW),
            Some("s".to_string())
        );
        assert_eq!(debouncer.committed(), "s");
        assert_eq!(debouncer.deadline(), None);
    }

    #[test]
    fn test_debouncer_restarts_window_on_input() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(String::new(), WINDOW);
        debouncer.input("s".to_string(), start);
        debouncer.input("sh".to_string(), start + Duration::from_millis(300));

        assert_eq!(debouncer.poll(start + WINDOW), None);
        assert_eq!(debouncer.latest(), "sh");
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(800)),
            Some("sh".to_string())
        );
    }

    #[test]
    fn test_stale_ticket_is_noop() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(String::new(), WINDOW);
        let stale = debouncer.input("s".to_string(), start);
        let current = debouncer.input("shirt".to_string(), start + Duration::from_millis(100));

        assert_eq!(debouncer.fire(stale), None);
        assert_eq!(debouncer.committed(), "");
        assert_eq!(debouncer.fire(current), Some("shirt".to_string()));
        assert_eq!(debouncer.fire(current), None);
    }

    #[test]
    fn test_unchanged_value_does_not_commit() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new("hat".to_string(), WINDOW);
        let ticket = debouncer.input("hat".to_string(), start);
        assert_eq!(debouncer.fire(ticket), None);
        assert_eq!(debouncer.deadline(), None);
    }

    #[test]
    fn test_search_state_terms() {
        let start = Instant::now();
        let mut search = SearchState::new(WINDOW);
        search.input("mug", start);
        assert_eq!(search.raw_term(), "mug");
        assert_eq!(search.debounced_term(), "");
        search.poll(start + WINDOW);
        assert_eq!(search.debounced_term(), "mug");
    }

    #[test]
    fn test_edit_form_fields() {
        let variant: Variant = serde_json::from_value(json!({
            "id": "gid://shopify/ProductVariant/11",
            "title": "Default",
            "price": "10.00",
            "inventoryQuantity": 2,
            "sku": null,
            "weight": null,
            "selectedOptions": [],
            "inventoryItem": {
                "id": "gid://shopify/InventoryItem/21",
                "inventoryLevels": [{
                    "id": "gid://shopify/InventoryLevel/1",
                    "location": {"id": "gid://shopify/Location/41", "name": "Main"},
                    "quantities": [{"name": "available", "quantity": 7}]
                }]
            },
            "media": [],
            "createdAt": null,
            "updatedAt": null
        }))
        .unwrap();
        let metafields = BTreeMap::from([("material".to_string(), "wool".to_string())]);

        let form = EditForm::from_variant(&variant, "gid://shopify/Location/41", &metafields);
        assert_eq!(form.expected_quantity, "7");

        let fields = form.to_fields();
        assert_eq!(fields["variantItemId"], "gid://shopify/InventoryItem/21");
        assert_eq!(fields["inventoryQuantity"], "7");
        assert_eq!(fields["metafield_material"], "wool");

        let other = EditForm::from_variant(&variant, "gid://shopify/Location/99", &BTreeMap::new());
        assert_eq!(other.inventory, "2");
    }

    #[tokio::test]
    async fn test_sort_and_search_combine_into_one_request() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_data(empty_page()).push_data(empty_page());
        let mut controller = SyncController::new(AdminClient::new(gateway.clone()), 5, WINDOW);
        controller.load_initial().await;

        let start = Instant::now();
        controller.type_search("shirt", start);
        controller.select_sort(SortConfig::new(SortKey::CreatedAt, SortDirection::Desc));

        assert!(!controller.sync(start + Duration::from_millis(100)).await);
        assert!(controller.sync(start + WINDOW).await);
        assert!(!controller.sync(start + WINDOW * 2).await);

        let requests = gateway.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[1].variables,
            json!({"first": 5, "query": "title:*shirt*", "sortKey": "CREATED_AT", "reverse": true})
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_waits_for_quiescence() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_data(empty_page());
        let mut controller = SyncController::new(AdminClient::new(gateway.clone()), 5, WINDOW);
        controller.submitted = Some((String::new(), SortConfig::default()));

        for raw in ["s", "sh", "shi", "shir", "shirt"] {
            controller.type_search(raw, Instant::now());
            tokio::time::advance(Duration::from_millis(100)).await;
        }
        assert!(controller.settle().await);

        let requests = gateway.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].variables["query"], "title:*shirt*");
    }

    #[tokio::test]
    async fn test_load_more_without_cursor_sends_nothing() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_data(empty_page());
        let mut controller = SyncController::new(AdminClient::new(gateway.clone()), 5, WINDOW);
        controller.load_initial().await;

        assert!(!controller.load_more().await);
        assert!(!controller.load_previous().await);
        assert_eq!(gateway.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_list_keeps_products() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_data(json!({"products": {
            "edges": [{"node": {"id": "gid://shopify/Product/1", "title": "Mug", "createdAt": "2024-01-01T00:00:00Z", "featuredImage": null}}],
            "pageInfo": {"hasNextPage": false, "hasPreviousPage": false}
        }}));
        gateway.push_error(AdminShopifyError::Transport {
            status: 503,
            reason: "Service Unavailable".to_string(),
        });
        let mut controller = SyncController::new(AdminClient::new(gateway), 5, WINDOW);
        controller.load_initial().await;

        let start = Instant::now();
        let ticket = controller.type_search("cup", start);
        assert!(controller.fire(ticket).await);

        assert_eq!(controller.paginator().products().len(), 1);
        assert_eq!(
            controller.paginator().error(),
            Some("API request failed with status 503: Service Unavailable")
        );
        assert!(!controller.is_submitting());
    }
}
