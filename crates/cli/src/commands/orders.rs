//! Order and comment commands.

use fastbite_client::{Runtime, Severity};
use fastbite_core::models::{Comment, CreateCommentRequest, Order};
use fastbite_core::{OrderId, OrderStatus};

use super::{CommandError, ensure_session};

/// Submit the cart.
#[allow(clippy::print_stdout)]
pub async fn place(runtime: &Runtime, address: &str, notes: Option<&str>) -> Result<(), CommandError> {
    let order = runtime.place_order(address, notes).await?;
    match ensure_session(runtime, order)? {
        Some(order) => {
            runtime.notifier().show_alert(
                &format!("Order {} placed, total {}", order.id, order.effective_total()),
                Severity::Success,
            );
            print_order(&order);
        }
        None => runtime
            .notifier()
            .show_alert("Order submitted", Severity::Success),
    }
    Ok(())
}

/// Print one order with its lines.
pub async fn show(runtime: &Runtime, id: &OrderId) -> Result<(), CommandError> {
    let order = ensure_session(runtime, runtime.gateway().order(id).await?)?
        .ok_or_else(|| CommandError::Invalid(format!("Order {id} not found")))?;
    print_order(&order);
    Ok(())
}

/// Move an order along, if the signed-in role may make that transition.
pub async fn advance(runtime: &Runtime, id: &OrderId, next: OrderStatus) -> Result<(), CommandError> {
    let role = runtime
        .session()
        .profile()
        .map(|p| p.role)
        .ok_or(CommandError::SessionExpired)?;

    let current = ensure_session(runtime, runtime.gateway().order(id).await?)?
        .ok_or_else(|| CommandError::Invalid(format!("Order {id} not found")))?;
    if !current.status.can_advance_to(next, &role) {
        return Err(CommandError::Invalid(format!(
            "{role} cannot move order {id} from {} to {next}",
            current.status
        )));
    }

    let updated = ensure_session(runtime, runtime.gateway().update_order_status(id, next).await?)?;
    let status = updated.map_or(next, |order| order.status);
    runtime
        .notifier()
        .show_alert(&format!("Order {id} is now {status}"), Severity::Success);
    Ok(())
}

/// Print the signed-in customer's orders.
pub async fn mine(runtime: &Runtime) -> Result<(), CommandError> {
    let orders = ensure_session(runtime, runtime.gateway().my_orders().await?)?;
    print_orders(&orders.unwrap_or_default());
    Ok(())
}

/// Print the kitchen queue.
pub async fn kitchen(runtime: &Runtime) -> Result<(), CommandError> {
    let orders = ensure_session(runtime, runtime.gateway().kitchen_orders().await?)?;
    print_orders(&orders.unwrap_or_default());
    Ok(())
}

/// Print the delivery queue.
pub async fn delivery(runtime: &Runtime) -> Result<(), CommandError> {
    let orders = ensure_session(runtime, runtime.gateway().delivery_orders().await?)?;
    print_orders(&orders.unwrap_or_default());
    Ok(())
}

/// Print an order's comments.
pub async fn comments(runtime: &Runtime, id: &OrderId) -> Result<(), CommandError> {
    let comments = ensure_session(runtime, runtime.gateway().comments(id).await?)?;
    for comment in comments.unwrap_or_default() {
        print_comment(&comment);
    }
    Ok(())
}

/// Post a comment.
pub async fn comment(runtime: &Runtime, id: &OrderId, message: &str) -> Result<(), CommandError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(CommandError::Invalid("Comment cannot be empty".to_string()));
    }
    if message.chars().count() > CreateCommentRequest::MAX_LENGTH {
        return Err(CommandError::Invalid(format!(
            "Comment cannot exceed {} characters",
            CreateCommentRequest::MAX_LENGTH
        )));
    }

    ensure_session(runtime, runtime.gateway().add_comment(id, message).await?)?;
    runtime
        .notifier()
        .show_alert("Comment posted", Severity::Success);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_orders(orders: &[Order]) {
    if orders.is_empty() {
        println!("No orders");
        return;
    }
    for order in orders {
        println!(
            "{:>6}  {:<10} {:>9}  {}",
            order.id.as_str(),
            order.status.as_wire(),
            order.effective_total().to_string(),
            order.customer_name.as_deref().unwrap_or("-")
        );
    }
}

#[allow(clippy::print_stdout)]
pub(crate) fn print_order(order: &Order) {
    println!("Order {} [{}]", order.id, order.status);
    if let Some(address) = &order.delivery_address {
        println!("  deliver to: {address}");
    }
    if let Some(notes) = &order.notes {
        println!("  notes: {notes}");
    }
    for item in &order.items {
        println!(
            "  {:>3} x {:<28} {:>9}",
            item.quantity,
            item.product_name,
            item.subtotal().to_string()
        );
    }
    println!("  total {}", order.effective_total());
}

#[allow(clippy::print_stdout)]
pub(crate) fn print_comment(comment: &Comment) {
    let author = comment.user_name.as_deref().unwrap_or("?");
    let role = comment
        .user_role
        .as_ref()
        .map(|r| format!(" ({r})"))
        .unwrap_or_default();
    let at = comment
        .created_at
        .map(|t| t.format("%H:%M ").to_string())
        .unwrap_or_default();
    println!("{at}{author}{role}: {}", comment.message);
}
