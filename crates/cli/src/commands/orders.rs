//! Order console commands.
//!
//! Every command loads a fresh order list first; failures to reach the
//! orders API are returned so the process exits non-zero.

use std::fmt::Write as _;
use std::path::Path;

use chrono::Local;
use ops_console_admin::ConsoleError;
use ops_console_admin::orders::{
    CSV_EXTENSION, DOWNLOAD_EXTENSION, ExpansionView, OrderBoard, OrderFilter, PageView,
    export_file_name,
};
use ops_console_admin::orders_api::OrderSource;
use ops_console_core::{Order, OrderId};

/// Print one page of the filtered order list.
///
/// # Errors
///
/// Returns an error if the order list cannot be fetched.
pub async fn list<S: OrderSource + 'static>(
    board: &OrderBoard<S>,
    filter: OrderFilter,
    page: usize,
    json: bool,
) -> Result<(), ConsoleError> {
    board.try_reload().await?;
    board.set_filter(filter).await;
    board.set_page(page).await;

    let view = board.page().await;
    let output = if json {
        serde_json::to_string_pretty(&view)?
    } else {
        render_page(&view)
    };
    emit(&output);
    Ok(())
}

/// Print one order's details, selecting order item `item` (1-based).
///
/// # Errors
///
/// Returns an error if `item` is 0, the list cannot be fetched, or the order
/// is not in it.
pub async fn show<S: OrderSource + 'static>(
    board: &OrderBoard<S>,
    order_id: &OrderId,
    item: usize,
    json: bool,
) -> Result<(), ConsoleError> {
    if item == 0 {
        return Err(ConsoleError::BadRequest(
            "item numbers start at 1".to_string(),
        ));
    }

    board.try_reload().await?;
    if board.reveal(order_id).await.is_none() {
        return Err(ConsoleError::NotFound(format!("order {order_id}")));
    }

    board.toggle(order_id).await;
    for _ in 1..item {
        board.next_item().await;
    }

    let view = board.expansion().await;
    let output = if json {
        serde_json::to_string_pretty(&view.details.as_deref())?
    } else {
        render_details(order_id, &view)
    };
    emit(&output);
    Ok(())
}

/// Write the filtered list as `orders-YYYYMMDD.csv` under `output_dir`.
///
/// # Errors
///
/// Returns an error if the list cannot be fetched or the file written.
pub async fn export<S: OrderSource + 'static>(
    board: &OrderBoard<S>,
    filter: OrderFilter,
    output_dir: &Path,
) -> Result<(), ConsoleError> {
    board.try_reload().await?;
    board.set_filter(filter).await;

    let rows = board.filtered().await.len();
    let csv = board.export_csv().await;
    let path = output_dir.join(export_file_name(&Local::now(), CSV_EXTENSION));

    tokio::fs::create_dir_all(output_dir).await?;
    tokio::fs::write(&path, csv).await?;

    tracing::info!(path = %path.display(), rows, "Wrote orders CSV");
    emit(&path.display().to_string());
    Ok(())
}

/// Save the server-generated export as `orders-YYYYMMDD.xml` under `output_dir`.
///
/// # Errors
///
/// Returns an error if the download fails or the file cannot be written.
pub async fn download<S: OrderSource + 'static>(
    board: &OrderBoard<S>,
    output_dir: &Path,
) -> Result<(), ConsoleError> {
    let blob = board.download_export().await?;
    let path = output_dir.join(export_file_name(&Local::now(), DOWNLOAD_EXTENSION));

    tokio::fs::create_dir_all(output_dir).await?;
    tokio::fs::write(&path, &blob.bytes).await?;

    tracing::info!(
        path = %path.display(),
        size = blob.bytes.len(),
        content_type = blob.content_type.as_deref().unwrap_or("unknown"),
        "Wrote orders download"
    );
    emit(&path.display().to_string());
    Ok(())
}

#[allow(clippy::print_stdout)]
fn emit(output: &str) {
    println!("{output}");
}

/// Print an operator-facing error line.
#[allow(clippy::print_stderr)]
pub fn print_error(error: &ConsoleError) {
    eprintln!("error: {}", error.user_message());
}

fn render_page(view: &PageView) -> String {
    let mut out = String::new();

    if view.rows.is_empty() {
        out.push_str("No orders match the current filters.\n");
    } else {
        let _ = writeln!(
            out,
            "{:<14} {:<14} {:<8} {:<24} {:>4} {:<15} {:<20} {:>10}",
            "ORDER ID", "NUMBER", "PLATFORM", "PRODUCT", "QTY", "STATUS", "DATE", "TOTAL"
        );
        for order in &view.rows {
            let _ = writeln!(out, "{}", render_row(order));
        }
    }

    let _ = write!(
        out,
        "Page {} of {} ({} orders)",
        view.page, view.total_pages, view.filtered_count
    );
    out
}

fn render_row(order: &Order) -> String {
    format!(
        "{:<14} {:<14} {:<8} {:<24} {:>4} {:<15} {:<20} {:>10}",
        order.order_id.as_str(),
        order.order_number,
        order.platform,
        order.product_label(),
        order.quantity,
        order.status,
        order.effective_date().unwrap_or("-"),
        order.total_amount.to_string(),
    )
}

fn render_details(order_id: &OrderId, view: &ExpansionView) -> String {
    let Some(details) = view.details.as_deref() else {
        return format!("No details available for order {order_id}.");
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Order {} ({}) - {}",
        details.order_id, details.order_number, details.status
    );
    let _ = writeln!(
        out,
        "Customer: {} <{}>  Phone: {}",
        details.customer_name.as_deref().unwrap_or("-"),
        details.customer_email.as_deref().unwrap_or("-"),
        details.phone_number.as_deref().unwrap_or("-"),
    );
    let _ = writeln!(
        out,
        "Platform: {}  Date: {}  Total: {}",
        details.platform,
        details.order_date.as_deref().unwrap_or("-"),
        details.total_amount,
    );

    match (&view.selected_item, view.state.item_index()) {
        (Some(item), Some(index)) => {
            let product = item
                .product
                .as_ref()
                .map_or("(no product)", |p| p.product_name.as_str());
            let _ = write!(
                out,
                "Item {} of {}: {}  {} x {} = {}",
                index + 1,
                details.item_count(),
                product,
                item.quantity,
                item.unit_price,
                item.total_price,
            );
        }
        _ => out.push_str("No order items."),
    }
    out
}
