//! Menu listing.

use fastbite_client::Runtime;

use super::CommandError;

/// Print every product on the menu.
#[allow(clippy::print_stdout)]
pub async fn list(runtime: &Runtime) -> Result<(), CommandError> {
    let products = runtime.gateway().products().await?.unwrap_or_default();
    if products.is_empty() {
        println!("The menu is empty");
        return Ok(());
    }

    for product in products {
        let availability = if product.available { "" } else { "  (unavailable)" };
        println!(
            "{:>6}  {:<28} {:>9}{availability}",
            product.id.as_str(),
            product.name,
            product.price.to_string()
        );
    }
    Ok(())
}
