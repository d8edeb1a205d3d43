//! CSV export of the filtered order list.
//!
//! Output starts with a UTF-8 byte-order mark so spreadsheet tools detect the
//! encoding. The header row is bare; every data field is double-quoted with
//! embedded quotes doubled, and missing values export as `""`.

use std::fmt::{Display, Write as _};

use chrono::{DateTime, TimeZone};
use ops_console_core::Order;

/// Byte-order mark written before the header.
pub const BOM: char = '\u{feff}';

/// Header row, in column order.
pub const EXPORT_HEADERS: &str = "OrderId,OrderNumber,Platform,ProductName,ProductType,Quantity,Status,OrderDate,TotalAmount,CustomerEmail";

/// Extension of client-side CSV exports.
pub const CSV_EXTENSION: &str = "csv";

/// Extension of the server-generated bulk export.
pub const DOWNLOAD_EXTENSION: &str = "xml";

/// Serialize `orders` to CSV text.
///
/// Pass the filtered list, not a page: the export ignores pagination.
#[must_use]
pub fn serialize_orders<'a>(orders: impl IntoIterator<Item = &'a Order>) -> String {
    let mut csv = String::new();
    csv.push(BOM);
    csv.push_str(EXPORT_HEADERS);
    csv.push('\n');

    for order in orders {
        let quantity = order.quantity.to_string();
        let total_amount = order.total_amount.to_string();
        let fields: [&str; 10] = [
            order.order_id.as_str(),
            &order.order_number,
            &order.platform,
            &order.product_name,
            &order.product_type,
            &quantity,
            &order.status,
            order.effective_date().unwrap_or_default(),
            &total_amount,
            order.customer_email.as_deref().unwrap_or_default(),
        ];

        let row = fields.map(quote).join(",");
        let _ = writeln!(csv, "{row}");
    }

    csv
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// File name for an export generated at `moment`: `orders-YYYYMMDD.<ext>`.
#[must_use]
pub fn export_file_name<Tz>(moment: &DateTime<Tz>, extension: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("orders-{}.{extension}", moment.format("%Y%m%d"))
}
