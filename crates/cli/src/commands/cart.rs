//! Local cart commands.

use fastbite_client::{Runtime, Severity};
use fastbite_core::ProductId;

use super::CommandError;

/// Print cart lines, count, and total.
#[allow(clippy::print_stdout)]
pub fn show(runtime: &Runtime) {
    let cart = runtime.cart();
    let items = cart.items();
    if items.is_empty() {
        println!("Your cart is empty");
        return;
    }

    for line in &items {
        println!(
            "{:>6}  {:<28} {:>3} x {:>8} = {:>9}",
            line.product_id.as_str(),
            line.product_name,
            line.quantity,
            line.unit_price.to_string(),
            line.subtotal().to_string()
        );
    }
    println!("{} item(s), total {}", cart.count(), cart.total());
}

/// Look a product up and add one unit of it.
pub async fn add(runtime: &Runtime, product_id: &ProductId) -> Result<(), CommandError> {
    let Some(product) = runtime.gateway().product(product_id).await? else {
        return Err(CommandError::Invalid(format!("Product {product_id} not found")));
    };
    if !product.available {
        return Err(CommandError::Invalid(format!("{} is not available", product.name)));
    }

    runtime.cart().add_item(&product)?;
    runtime.notifier().show_alert(
        &format!("{} added to cart ({} item(s))", product.name, runtime.cart().count()),
        Severity::Success,
    );
    Ok(())
}

/// Remove a product's line.
pub fn remove(runtime: &Runtime, product_id: &ProductId) -> Result<(), CommandError> {
    runtime.cart().remove_item(product_id)?;
    show(runtime);
    Ok(())
}

/// Set a product's quantity.
pub fn set(runtime: &Runtime, product_id: &ProductId, quantity: i64) -> Result<(), CommandError> {
    runtime.cart().update_quantity(product_id, quantity)?;
    show(runtime);
    Ok(())
}

/// Empty the cart.
pub fn clear(runtime: &Runtime) -> Result<(), CommandError> {
    runtime.cart().clear()?;
    runtime.notifier().show_alert("Cart cleared", Severity::Info);
    Ok(())
}
