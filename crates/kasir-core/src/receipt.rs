//! # Receipt
//!
//! The receipt view model returned after checkout, and its plain-text
//! rendering for thermal printers.
//!
//! ## Layout (32 columns, 58 mm paper)
//! ```text
//! ┌────────────────────────────────┐
//! │           Toko Maju            │  store name, address, phone, email
//! │     Jl. Merdeka No. 1          │  receipt header
//! │--------------------------------│
//! │Invoice       INV-20240115-0001 │
//! │Date             15/01/2024 09:30│
//! │Cashier                   Kasir │
//! │--------------------------------│
//! │Smartphone                      │
//! │  2 x 50,000.00       100,000.00│
//! │--------------------------------│
//! │Subtotal              100,000.00│
//! │Tax                    11,000.00│
//! │TOTAL             IDR 111,000.00│
//! │--------------------------------│
//! │Payment                    Cash │
//! │Paid                  150,000.00│
//! │Change                 39,000.00│
//! │         Terima kasih!          │  receipt footer
//! └────────────────────────────────┘
//! ```

use serde::Serialize;

use crate::money::Money;
use crate::types::{SaleDetail, StoreSetting};

/// Columns used when the printer settings say nothing usable.
pub const DEFAULT_RECEIPT_COLUMNS: usize = 32;

/// Maps `printer_settings.paper_width` (millimetres) to printable columns.
///
/// 58 mm paper fits 32 characters, 80 mm fits 48. Anything else falls back
/// to 32.
///
/// ## Example
/// ```rust
/// use kasir_core::receipt::paper_columns;
///
/// let settings = serde_json::json!({"paper_width": 80, "font_size": 12});
/// assert_eq!(paper_columns(Some(&settings)), 48);
/// assert_eq!(paper_columns(None), 32);
/// ```
pub fn paper_columns(printer_settings: Option<&serde_json::Value>) -> usize {
    let width = printer_settings
        .and_then(|settings| settings.get("paper_width"))
        .and_then(|width| {
            width
                .as_u64()
                .or_else(|| width.as_str().and_then(|s| s.trim().parse().ok()))
        });

    match width {
        Some(80) => 48,
        Some(58) => 32,
        _ => DEFAULT_RECEIPT_COLUMNS,
    }
}

/// Formats an amount with thousands separators (`111,000.00`).
pub fn format_amount(amount: Money) -> String {
    let digits = (amount.cents() / 100).unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount.is_negative() { "-" } else { "" };
    format!("{sign}{grouped}.{:02}", amount.cents_part())
}

/// Everything a receipt shows: the sale, its lines, the cashier and the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    #[serde(flatten)]
    pub detail: SaleDetail,
    pub store_settings: Option<StoreSetting>,
}

impl Receipt {
    pub fn new(detail: SaleDetail, store_settings: Option<StoreSetting>) -> Self {
        Receipt {
            detail,
            store_settings,
        }
    }

    /// Printable columns for this store's printer.
    pub fn columns(&self) -> usize {
        paper_columns(
            self.store_settings
                .as_ref()
                .and_then(|s| s.printer_settings.as_ref()),
        )
    }

    /// Renders the receipt as monospaced text, `width` columns wide.
    pub fn render_text(&self, width: usize) -> String {
        let width = width.max(16);
        let store = self.store_settings.as_ref();
        let sale = &self.detail.sale;
        let currency = StoreSetting::effective_currency(store);
        let mut out = TextReceipt::new(width);

        if let Some(store) = store {
            out.center(&store.store_name);
            for line in [&store.store_address, &store.store_phone, &store.store_email]
                .into_iter()
                .flatten()
            {
                out.center(line);
            }
            if let Some(header) = &store.receipt_header {
                out.center(header);
            }
        }
        out.rule();

        out.pair("Invoice", &sale.invoice_number);
        out.pair("Date", &sale.created_at.format("%d/%m/%Y %H:%M").to_string());
        out.pair("Cashier", &self.detail.cashier.name);
        out.rule();

        for item in &self.detail.items {
            out.left(&item.product_name);
            let gross = item.unit_price.multiply_quantity(item.quantity);
            out.pair(
                &format!("  {} x {}", item.quantity, format_amount(item.unit_price)),
                &format_amount(gross),
            );
            if !item.discount_amount.is_zero() {
                out.pair("  Discount", &format!("-{}", format_amount(item.discount_amount)));
            }
        }
        out.rule();

        out.pair("Subtotal", &format_amount(sale.subtotal));
        if !sale.discount_amount.is_zero() {
            out.pair("Total Discount", &format!("-{}", format_amount(sale.discount_amount)));
        }
        if !sale.tax_amount.is_zero() {
            out.pair("Tax", &format_amount(sale.tax_amount));
        }
        out.pair(
            "TOTAL",
            &format!("{} {}", currency, format_amount(sale.total_amount)),
        );
        out.rule();

        out.pair("Payment", sale.payment_method.label());
        out.pair("Paid", &format_amount(sale.amount_paid));
        if !sale.change_amount.is_zero() {
            out.pair("Change", &format_amount(sale.change_amount));
        }

        if let Some(notes) = &sale.notes {
            out.rule();
            out.left(&format!("Notes: {notes}"));
        }

        if let Some(footer) = store.and_then(|s| s.receipt_footer.as_ref()) {
            out.rule();
            out.center(footer);
        }

        out.finish()
    }
}

/// Line builder for fixed-width text.
struct TextReceipt {
    width: usize,
    buf: String,
}

impl TextReceipt {
    fn new(width: usize) -> Self {
        TextReceipt {
            width,
            buf: String::new(),
        }
    }

    fn push_line(&mut self, line: &str) {
        self.buf.push_str(line.trim_end());
        self.buf.push('\n');
    }

    fn rule(&mut self) {
        let rule = "-".repeat(self.width);
        self.push_line(&rule);
    }

    /// Left-aligned text, wrapped at the paper width.
    fn left(&mut self, text: &str) {
        let chars: Vec<char> = text.chars().collect();
        for chunk in chars.chunks(self.width) {
            let line: String = chunk.iter().collect();
            self.push_line(&line);
        }
    }

    fn center(&mut self, text: &str) {
        let len = text.chars().count();
        if len >= self.width {
            self.left(text);
            return;
        }
        let pad = (self.width - len) / 2;
        let line = format!("{}{}", " ".repeat(pad), text);
        self.push_line(&line);
    }

    /// Label on the left, value flush right; the value moves to its own
    /// line when both do not fit.
    fn pair(&mut self, label: &str, value: &str) {
        let label_len = label.chars().count();
        let value_len = value.chars().count();

        if label_len + 1 + value_len <= self.width {
            let gap = self.width - label_len - value_len;
            let line = format!("{}{}{}", label, " ".repeat(gap), value);
            self.push_line(&line);
        } else {
            self.left(label);
            let pad = self.width.saturating_sub(value_len);
            let line = format!("{}{}", " ".repeat(pad), value);
            self.push_line(&line);
        }
    }

    fn finish(self) -> String {
        self.buf
    }
}
