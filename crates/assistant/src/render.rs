//! Plain-text rendering of carts, orders, and clarification prompts.

use rust_decimal::Decimal;

use chatcart_core::domain::cart::Cart;
use chatcart_core::domain::order::{Order, OrderSummary};
use chatcart_core::domain::product::Product;
use chatcart_core::pricing::round2;

pub fn money(value: Decimal, currency: &str) -> String {
    format!("{:.2} {}", round2(value), currency)
}

pub fn cart_summary(cart: &Cart, currency: &str) -> String {
    if cart.is_empty() {
        return "Your cart is empty.".to_string();
    }
    let mut text = String::from("Your cart:\n");
    for line in &cart.lines {
        text.push_str(&format!(
            "  {} ({}) x{} @ {} = {}",
            line.name,
            line.code.as_str(),
            line.requested_quantity,
            money(line.final_unit_price, currency),
            money(line.line_total, currency),
        ));
        if line.free_quantity > 0 {
            text.push_str(&format!(" ({} paid, {} free)", line.paid_quantity, line.free_quantity));
        }
        if !line.scheme_label.is_empty() {
            text.push_str(&format!(" [{}]", line.scheme_label));
        }
        text.push('\n');
    }
    text.push_str(&format!("Total: {}", money(cart.final_total, currency)));
    if cart.discount_applied > Decimal::ZERO {
        text.push_str(&format!(" (you saved {})", money(cart.discount_applied, currency)));
    }
    text
}

pub fn product_listing(products: &[Product], currency: &str) -> String {
    if products.is_empty() {
        return "No products are available in your warehouse right now.".to_string();
    }
    let mut text = String::from("Available products:\n");
    for product in products {
        text.push_str(&format!(
            "  {} - {}",
            product.display(),
            money(product.base_price, currency)
        ));
        if !product.scheme_label.is_empty() {
            text.push_str(&format!(" [{}]", product.scheme_label));
        }
        text.push('\n');
    }
    text.push_str("Say e.g. 'add 2 <product name>' to put something in your cart.");
    text
}

pub fn no_match_prompt(products: &[Product], currency: &str) -> String {
    format!(
        "I couldn't match that to a product. Try 'add 2 <product name>' or \
         'add <product name>'.\n\n{}",
        product_listing(products, currency)
    )
}

pub fn order_confirmation(order: &Order, currency: &str) -> String {
    let mut text = format!(
        "Order {} placed!\n\nItems:\n",
        order.id.as_str()
    );
    for line in &order.lines {
        text.push_str(&format!(
            "  {} x{} @ {} = {}\n",
            line.name,
            line.quantity,
            money(line.unit_price, currency),
            money(line.line_total, currency),
        ));
    }
    text.push_str(&format!(
        "Total: {}\nStatus: {}\nA confirmation is on its way to {}.",
        money(order.total_amount, currency),
        order.status.label(),
        order.owner_email,
    ));
    text
}

pub fn order_listing(orders: &[OrderSummary], currency: &str) -> String {
    if orders.is_empty() {
        return "You have no orders yet.".to_string();
    }
    let mut text = String::from("Your orders:\n");
    for (index, order) in orders.iter().enumerate() {
        text.push_str(&format!(
            "  {}. {} - {} - {} - {}\n",
            index + 1,
            order.id.as_str(),
            order.status.label(),
            money(order.total_amount, currency),
            order.created_at.format("%Y-%m-%d"),
        ));
    }
    text.push_str("Reply with a number or an order id to see the details.");
    text
}

pub fn order_details(order: &Order, currency: &str) -> String {
    let mut text = format!(
        "Order {} ({})\nPlaced: {}\n\nItems:\n",
        order.id.as_str(),
        order.status.label(),
        order.created_at.format("%Y-%m-%d %H:%M"),
    );
    for line in &order.lines {
        text.push_str(&format!(
            "  {} ({}) x{} @ {} = {}\n",
            line.name,
            line.code.as_str(),
            line.quantity,
            money(line.unit_price, currency),
            money(line.line_total, currency),
        ));
    }
    text.push_str(&format!("Total: {}", money(order.total_amount, currency)));
    text
}

pub fn help_text() -> String {
    "I can help you order products. Try:\n  \
     'show products' to browse the catalog\n  \
     'add 2 <product name>' to fill your cart\n  \
     'calculate cost' for a price breakdown\n  \
     'place order' to finalize\n  \
     'track my orders' to check past orders"
        .to_string()
}
