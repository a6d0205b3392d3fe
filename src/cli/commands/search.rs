use crate::config::Config;
use crate::state::SearchComponents;

pub async fn cmd_search_drug(config: &Config, query: &str) -> anyhow::Result<()> {
    println!("Searching RxNav for: {query}");

    let components = SearchComponents::new(config)?;
    let response = components.drug_search.search(query, "cli").await?;

    if response.results.is_empty() {
        println!("No branded drugs found matching '{query}'");
        return Ok(());
    }

    println!();
    println!("Search Results:");
    println!("{:-<60}", "");

    for drug in &response.results {
        println!("• {} (RXCUI {})", drug.name, drug.rxcui);
        if !drug.ingredient_base_names.is_empty() {
            println!("  Ingredients: {}", drug.ingredient_base_names.join(", "));
        }
        if !drug.dosage_forms.is_empty() {
            println!("  Dosage forms: {}", drug.dosage_forms.join(", "));
        }
        println!();
    }

    Ok(())
}
