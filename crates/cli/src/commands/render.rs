//! Plain-text rendering of products for the terminal.

use shopdesk_admin::services::{PaginatorState, SyncController};
use shopdesk_admin::shopify::{ProductPage, ProductSnapshot, ProductSummary};
use shopdesk_core::format_usd;

/// One product list page with its navigation cursors.
#[must_use]
pub fn page(page: &ProductPage) -> String {
    let mut out = rows(&page.products);
    if let Some(cursor) = page.page_info.previous_cursor() {
        out.push_str(&format!("\nprevious: --before {cursor}"));
    }
    if let Some(cursor) = page.page_info.next_cursor() {
        out.push_str(&format!("\nnext:     --after {cursor}"));
    }
    out
}

fn rows(products: &[ProductSummary]) -> String {
    if products.is_empty() {
        return "No products found".to_string();
    }
    products
        .iter()
        .map(|p| {
            let created = p.created_at.get(..10).unwrap_or(&p.created_at);
            format!("{:<36} {created}  {}", p.id, p.title)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Product detail: header, variants with per-location stock, metafields.
#[must_use]
pub fn product(snapshot: &ProductSnapshot) -> String {
    let product = &snapshot.product;
    let range = &product.price_range;
    let mut out = format!(
        "{} ({})\nstatus: {:?}  price: {} - {}  inventory: {}\n",
        product.title,
        product.id,
        product.status,
        format_usd(&range.min_variant_price.amount),
        format_usd(&range.max_variant_price.amount),
        product.total_inventory,
    );

    let colors = product.color_options();
    if !colors.is_empty() {
        out.push_str(&format!("colors: {}\n", colors.join(", ")));
    }
    let gallery = product.gallery();
    if !gallery.is_empty() {
        out.push_str(&format!("images: {}\n", gallery.len()));
    }

    out.push_str("\nvariants:\n");
    for variant in &product.variants {
        out.push_str(&format!(
            "  {} {}  {}  sku: {}\n",
            variant.id,
            variant.title,
            format_usd(&variant.price),
            variant.sku.as_deref().unwrap_or("-"),
        ));
        for level in &variant.inventory_item.inventory_levels {
            let available = level
                .available()
                .map_or_else(|| "-".to_string(), |q| q.to_string());
            out.push_str(&format!(
                "    {} {}: {available} available\n",
                level.location.id, level.location.name
            ));
        }
    }

    if !snapshot.metafields.is_empty() {
        out.push_str("\nmetafields:\n");
        for (key, value) in &snapshot.metafields {
            out.push_str(&format!("  {key} = {value}\n"));
        }
    }
    out.trim_end().to_string()
}

/// Browse screen: status line, then the current page.
#[must_use]
pub fn browse(controller: &SyncController) -> String {
    let paginator = controller.paginator();
    let sort = paginator.sort();
    let direction = if sort.direction.is_reverse() { "DESC" } else { "ASC" };
    let mut out = format!(
        "search: {:?}  sort: {}-{direction}",
        paginator.search_query(),
        sort.key,
    );
    match paginator.state() {
        PaginatorState::Loading => out.push_str("  [loading]"),
        PaginatorState::Error => {
            out.push_str(&format!(
                "\nerror: {}",
                paginator.error().unwrap_or("request failed")
            ));
        }
        PaginatorState::Idle => {}
    }
    out.push('\n');
    out.push_str(&rows(paginator.products()));

    let mut nav = Vec::new();
    if paginator.can_load_previous() {
        nav.push("[p]revious");
    }
    if paginator.can_load_more() {
        nav.push("[n]ext");
    }
    if !nav.is_empty() {
        out.push_str(&format!("\n{}", nav.join("  ")));
    }
    out
}
